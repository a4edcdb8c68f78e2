// src/error.rs
// =============================================================================
// Error types for the spider library.
//
// The crawler itself almost never fails: duplicate URLs are skipped, transport
// failures and handler failures are logged and counted by the workers. What
// remains are the errors a caller can actually act on:
// - a bad configuration (caught before any network activity)
// - misuse of the scheduler (running it twice, seeding without handlers)
// - failures of the one-shot download helper
//
// Handlers return anyhow::Result<()> instead, so crawl logic can use `?` on
// whatever error types it likes.
// =============================================================================

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::spider::SpiderState;

/// Errors returned by the spider library.
#[derive(Debug, Error)]
pub enum SpiderError {
    /// The configuration can't be used (zero workers, bad header, ...)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `run()` was called on a spider that already left the Created state
    #[error("spider already started (current state: {state:?})")]
    AlreadyStarted { state: SpiderState },

    /// URLs were offered without a single handler to pair them with
    #[error("cannot seed {urls} url(s) without at least one handler")]
    NoHandlers { urls: usize },

    /// Building the HTTP client or performing a one-shot request failed
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A download answered with a non-success status
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: StatusCode },

    /// Local I/O (download destination, runtime creation)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON config file could not be parsed
    #[error("invalid config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = SpiderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_started_message_names_state() {
        let err = SpiderError::AlreadyStarted {
            state: SpiderState::Stopped,
        };
        assert_eq!(
            err.to_string(),
            "spider already started (current state: Stopped)"
        );
    }

    #[test]
    fn test_no_handlers_message() {
        let err = SpiderError::NoHandlers { urls: 3 };
        assert!(err.to_string().contains("3 url(s)"));
    }
}
