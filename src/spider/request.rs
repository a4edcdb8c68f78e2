// src/spider/request.rs
// =============================================================================
// A Request is one unit of work: what to fetch and who handles the response.
//
// Requests are immutable once built. The queue owns a request until exactly
// one worker dequeues it; that worker then owns it for one fetch-and-handle
// cycle.
// =============================================================================

use std::fmt;

use reqwest::header::HeaderMap;
use reqwest::Method;

use super::handler::HandlerRef;

#[derive(Clone)]
pub struct Request {
    method: Method,
    url: String,
    handler: HandlerRef,
    // Merged over the client's default headers at fetch time
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>, handler: HandlerRef) -> Self {
        Self {
            method,
            url: url.into(),
            handler,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>, handler: HandlerRef) -> Self {
        Self::new(Method::GET, url, handler)
    }

    /// Extra headers for this request only
    pub fn header(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}
