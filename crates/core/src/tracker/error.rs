use std::path::PathBuf;

use thiserror::Error;

use crate::description::DescriptionError;
use crate::session::SessionError;
use crate::torrent::TorrentError;

use super::SubmissionForm;

/// Why an upload did not happen or did not succeed.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{tracker}: no valid {slot} mapping for this release")]
    MappingUnsupported { tracker: String, slot: &'static str },

    #[error("Content not allowed: {0}")]
    ContentRejected(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The site answered, but not with its success page. The body and the
    /// submitted form are kept so the upload can be retried by hand.
    #[error("Unexpected response from {url} ({status})")]
    UnexpectedResponse {
        url: String,
        status: u16,
        body: String,
        form: Box<SubmissionForm>,
    },

    #[error("Torrent regeneration failed: {0}")]
    ComplianceRegenerationFailure(String),

    #[error(transparent)]
    Torrent(TorrentError),

    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid tracker configuration: {0}")]
    Config(String),

    #[error("Upload aborted: {0}")]
    Aborted(String),
}

impl UploadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<TorrentError> for UploadError {
    fn from(e: TorrentError) -> Self {
        if e.is_regeneration_failure() {
            Self::ComplianceRegenerationFailure(e.to_string())
        } else {
            Self::Torrent(e)
        }
    }
}

impl From<SessionError> for UploadError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Timeout(_) | SessionError::Transport(_) => Self::Transport(e.to_string()),
            other => Self::AuthenticationFailure(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(crate::http::describe(&e))
    }
}
