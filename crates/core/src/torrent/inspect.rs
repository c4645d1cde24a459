//! Read-only view of a torrent artifact on disk.
//!
//! Uses librqbit-core to parse the bencoded file, so the info hash is computed
//! over the exact bytes of the `info` dictionary.

use std::path::{Path, PathBuf};

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};

use super::TorrentError;

/// A file listed in a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFile {
    /// Path including the torrent's root name.
    pub path: String,
    pub size_bytes: u64,
}

/// Inspected torrent artifact.
#[derive(Debug, Clone)]
pub struct TorrentArtifact {
    pub path: PathBuf,
    pub name: String,
    pub piece_size: u64,
    pub total_size: u64,
    pub files: Vec<TorrentFile>,
    /// Lowercase hex v1 info hash.
    pub info_hash: String,
}

impl TorrentArtifact {
    pub async fn read(path: &Path) -> Result<Self, TorrentError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| TorrentError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(path, &bytes)
    }

    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, TorrentError> {
        let torrent: TorrentMetaV1Owned =
            torrent_from_bytes(bytes).map_err(|e| TorrentError::Parse(e.to_string()))?;

        let info = &torrent.info;

        // Folder name for multi-file, file name for single-file
        let name = info
            .name
            .as_ref()
            .map(|b| bytes_to_string(b.as_ref()))
            .unwrap_or_else(|| "unknown".to_string());

        let files = if let Some(ref files) = info.files {
            files
                .iter()
                .map(|file| {
                    let mut parts = vec![name.clone()];
                    parts.extend(file.path.iter().map(|p| bytes_to_string(p.as_ref())));
                    TorrentFile {
                        path: parts.join("/"),
                        size_bytes: file.length,
                    }
                })
                .collect::<Vec<_>>()
        } else if let Some(length) = info.length {
            vec![TorrentFile {
                path: name.clone(),
                size_bytes: length,
            }]
        } else {
            Vec::new()
        };

        if files.is_empty() {
            return Err(TorrentError::Empty);
        }

        Ok(Self {
            path: path.to_path_buf(),
            name,
            piece_size: u64::from(info.piece_length),
            total_size: files.iter().map(|f| f.size_bytes).sum(),
            files,
            info_hash: torrent.info_hash.as_string(),
        })
    }
}

/// UTF-8 if possible, lossy otherwise.
fn bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
