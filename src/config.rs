// src/config.rs
// =============================================================================
// Spider configuration.
//
// A SpiderConfig is fixed for the lifetime of one Spider:
// - concurrency: how many workers pull from the queue at once
// - delay_ms: how long each worker sleeps after a request (per worker, not global)
// - allow_duplicates: re-visit URLs that were already queued
// - timeout_ms: transport timeout per request (None = no timeout)
// - headers: default request headers, sent with every request
//
// Configs can be built in code (Default + with_* helpers) or loaded from a JSON
// file where every field is optional.
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpiderError};

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/56.0.2924.87 Safari/537.36";
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Number of concurrent workers (must be > 0)
    pub concurrency: usize,
    /// Delay each worker waits after finishing a request, in milliseconds
    pub delay_ms: u64,
    /// Re-visit URLs that were already admitted
    pub allow_duplicates: bool,
    /// Transport timeout for a single request, in milliseconds
    pub timeout_ms: Option<u64>,
    /// Default headers; per-request headers override these
    pub headers: BTreeMap<String, String>,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            delay_ms: 0,
            allow_duplicates: false,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            headers: default_headers(),
        }
    }
}

// Saturates instead of wrapping for absurdly long durations
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("user-agent".to_string(), DEFAULT_USER_AGENT.to_string()),
        ("accept".to_string(), DEFAULT_ACCEPT.to_string()),
    ])
}

impl SpiderConfig {
    /// Loads a config from a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| SpiderError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = millis(delay);
        self
    }

    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_ms = timeout.map(millis);
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Checks the config and parses the default headers.
    ///
    /// Called once when a Spider is built, so a bad config fails before any
    /// request goes out.
    pub fn validate(&self) -> Result<HeaderMap> {
        if self.concurrency == 0 {
            return Err(SpiderError::InvalidConfig(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(SpiderError::InvalidConfig(
                "timeout must be greater than 0 (omit it for no timeout)".to_string(),
            ));
        }

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SpiderError::InvalidConfig(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                SpiderError::InvalidConfig(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}
