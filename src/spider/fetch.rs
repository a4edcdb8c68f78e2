// src/spider/fetch.rs
// =============================================================================
// The fetcher: performs one HTTP request per work item.
//
// One reqwest::Client is built per Spider and shared read-only by every worker
// (Client is internally reference counted and does its own connection pooling).
// The default headers from the config are installed on the client once, so no
// request can mutate them; per-request headers are layered on top.
//
// The fetcher never retries. A transport failure is returned to the worker,
// which logs it (using FailureKind) and moves on.
// =============================================================================

use std::fmt;
use std::path::Path;

use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::request::Request;
use crate::config::SpiderConfig;
use crate::error::{Result, SpiderError};

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Builds the shared HTTP client. Fails on an invalid config.
    pub fn new(config: &SpiderConfig) -> Result<Self> {
        let headers = config.validate()?;

        let mut builder = Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Sends one request and returns the response as soon as headers arrive.
    ///
    /// Non-success statuses are NOT errors here: the handler gets to see them.
    pub async fn fetch(&self, request: &Request) -> Result<Response, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .headers(request.headers().clone());
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.to_vec());
        }
        builder.send().await
    }

    /// Streams `src` into the file at `dst`, bypassing the work queue.
    ///
    /// Returns the number of bytes written.
    pub async fn download(&self, src: &str, dst: &Path) -> Result<u64> {
        info!("DOWNLOADING {} -> {}", src, dst.display());

        let mut response = self.client.get(src).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SpiderError::Status {
                url: src.to_string(),
                status,
            });
        }

        let mut file = File::create(dst).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Rough category of a transport failure, for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    TooManyRedirects,
    Connect,
    DnsError,
    /// The request could not even be built (bad URL, bad method, ...)
    InvalidRequest,
    Other,
}

impl FailureKind {
    pub fn classify(error: &reqwest::Error) -> Self {
        let message = error.to_string().to_lowercase();

        if error.is_timeout() {
            FailureKind::Timeout
        } else if error.is_redirect() {
            FailureKind::TooManyRedirects
        } else if error.is_builder() {
            FailureKind::InvalidRequest
        } else if error.is_connect() {
            // Connection errors often mean DNS issues or host unreachable
            if message.contains("dns") {
                FailureKind::DnsError
            } else {
                FailureKind::Connect
            }
        } else {
            FailureKind::Other
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::TooManyRedirects => "too many redirects",
            FailureKind::Connect => "connection failed",
            FailureKind::DnsError => "dns error",
            FailureKind::InvalidRequest => "invalid request",
            FailureKind::Other => "transport error",
        };
        f.write_str(label)
    }
}
