//! Tracker description assembly.

mod assembler;
mod bbcode;

pub use assembler::{disc_quote_blocks, DescriptionAssembler, DiscPlacement, Gallery};
pub use bbcode::{BbcodeNormalizer, MarkupNormalizer, SpoilerMode};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image host error: {0}")]
    ImageHost(String),
}

/// Remote image service that rehosts local screenshots.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `images` as one gallery and return the BBCode to embed.
    async fn rehost(&self, images: &[PathBuf], gallery_name: &str)
        -> Result<String, DescriptionError>;
}

/// Read a text artifact, mapping a missing file to `None`.
pub async fn read_optional(path: &Path) -> Result<Option<String>, DescriptionError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DescriptionError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
