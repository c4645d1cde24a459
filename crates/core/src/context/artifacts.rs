//! On-disk artifacts of one submission.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Screenshot prefixes produced for menus and posters, never uploaded as screens.
const NON_SCREEN_PREFIXES: &[&str] = &["FILE", "PLAYLIST", "POSTER"];

/// Every path derived from `<base_dir>/tmp/<uuid>/`.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(base_dir: impl AsRef<Path>, uuid: &str) -> Self {
        Self {
            dir: base_dir.as_ref().join("tmp").join(uuid),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Shared free-text description written by the description collaborator.
    pub fn base_description(&self) -> PathBuf {
        self.dir.join("DESCRIPTION.txt")
    }

    pub fn tracker_description(&self, tracker: &str) -> PathBuf {
        self.dir.join(format!("[{tracker}]DESCRIPTION.txt"))
    }

    pub fn mediainfo_clean(&self) -> PathBuf {
        self.dir.join("MEDIAINFO_CLEANPATH.txt")
    }

    pub fn bd_summary(&self) -> PathBuf {
        self.dir.join("BD_SUMMARY_00.txt")
    }

    pub fn bd_summary_ext(&self) -> PathBuf {
        self.dir.join("BD_SUMMARY_EXT.txt")
    }

    pub fn base_torrent(&self) -> PathBuf {
        self.dir.join("BASE.torrent")
    }

    pub fn tracker_torrent(&self, tracker: &str) -> PathBuf {
        self.dir.join(format!("[{tracker}].torrent"))
    }

    /// Screenshots named `<filename>-*.png`, sorted, menus and posters excluded.
    pub fn screenshots(&self, filename: &str) -> Vec<PathBuf> {
        let pattern = format!(
            "{}/{}-*.png",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            glob::Pattern::escape(filename)
        );
        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(pattern = %pattern, error = %e, "Invalid screenshot pattern");
                return Vec::new();
            }
        };

        let mut screens: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| !NON_SCREEN_PREFIXES.iter().any(|p| n.starts_with(p)))
                    .unwrap_or(false)
            })
            .collect();
        screens.sort();
        screens
    }
}

/// Session artifact of one tracker: `<base_dir>/data/cookies/<TRACKER>.txt`.
pub fn cookie_path(base_dir: impl AsRef<Path>, tracker: &str) -> PathBuf {
    base_dir
        .as_ref()
        .join("data")
        .join("cookies")
        .join(format!("{tracker}.txt"))
}

/// Replace `path` with `contents` through a sibling temp file and a rename.
///
/// Readers see either the old file or the new one, never a partial write.
pub async fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let partial = partial_path(path);
    if let Err(e) = tokio::fs::write(&partial, contents.as_ref()).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
