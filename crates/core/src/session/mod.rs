//! Authenticated tracker sessions.
//!
//! A session is a cookie jar persisted to one artifact per tracker. The
//! manager logs in, validates the stored session against a marker page, and
//! re-authenticates at most once, after asking.

mod cookies;
mod manager;

pub use cookies::{parse_cookie_lines, CookieFile};
pub use manager::{LoginFlow, SessionManager, SessionTarget};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} has no login flow; supply a session cookie file")]
    NoLoginFlow(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session artifact {path}: {source}")]
    CookieFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Transport(crate::http::describe(&e))
        }
    }
}

/// Lifecycle of one tracker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NoSession,
    LoggingIn,
    Valid,
    Invalid,
}

impl SessionState {
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}
