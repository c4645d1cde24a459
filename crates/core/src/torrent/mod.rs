//! Torrent artifacts: inspection, construction and per-tracker compliance.

mod builder;
mod compliance;
mod inspect;
mod metainfo;

pub use builder::{scan, BuildOptions, FilePolicy, HashingTorrentBuilder, SourceFile, TorrentBuilder};
pub use compliance::{
    ComplianceManager, ComplianceOutcome, ComplianceState, TorrentPolicy,
};
pub use inspect::{TorrentArtifact, TorrentFile};
pub use metainfo::{relabel_bytes, FileEntry, Info, Metainfo, Relabel};

use std::path::PathBuf;

use thiserror::Error;

use crate::context::SubmissionContext;
use crate::naming::ascii_fold;

/// 16 MiB, the largest piece size some trackers accept.
pub const MAX_PIECE_16_MIB: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TorrentError {
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

    #[error("Failed to parse torrent: {0}")]
    Parse(String),

    #[error("Failed to encode torrent: {0}")]
    Encode(String),

    #[error("Empty torrent (no files)")]
    Empty,

    #[error("Failed to build torrent: {0}")]
    Build(String),

    #[error("Torrent regeneration failed: {0}")]
    Regeneration(String),

    #[error("Regenerated torrent still has piece size {piece_size} > {max}")]
    StillNonCompliant { piece_size: u64, max: u64 },
}

impl TorrentError {
    /// `true` when a rebuild was attempted and did not yield a usable torrent.
    pub fn is_regeneration_failure(&self) -> bool {
        matches!(self, Self::Regeneration(_) | Self::StillNonCompliant { .. })
    }
}

/// File name (without `.torrent`) presented to the tracker.
///
/// The video's name for single-file releases, the release folder's otherwise,
/// with spaces as dots and ASCII only.
pub fn torrent_file_name(ctx: &SubmissionContext) -> String {
    let source = if ctx.filelist.len() == 1 {
        &ctx.video
    } else {
        &ctx.path
    };
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ctx.uuid.clone());
    ascii_fold(&base.replace(' ', "."))
}
