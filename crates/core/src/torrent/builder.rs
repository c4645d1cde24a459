//! Torrent construction from release content.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use jwalk::WalkDir;
use serde_bytes::ByteBuf;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::context::SubmissionContext;

use super::{FileEntry, Info, Metainfo, TorrentError};

/// Which files of a release folder end up in the torrent.
///
/// A file is kept when it matches any `include` pattern (or `include` is
/// empty) and no `exclude` pattern. Patterns match the file name,
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePolicy {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl FilePolicy {
    pub fn everything() -> Self {
        Self::default()
    }

    /// Video containers only, samples dropped.
    pub fn video_only() -> Self {
        Self {
            include: vec!["*.mkv".into(), "*.mp4".into(), "*.ts".into()],
            exclude: vec!["*sample.mkv".into(), "sample*.*".into()],
        }
    }

    /// Discs keep their whole structure; file releases keep video only.
    pub fn for_context(ctx: &SubmissionContext) -> Self {
        if ctx.disc.is_some() {
            Self::everything()
        } else {
            Self::video_only()
        }
    }

    fn compile(&self) -> Result<CompiledPolicy, TorrentError> {
        let compile = |patterns: &[String]| -> Result<Vec<Pattern>, TorrentError> {
            patterns
                .iter()
                .map(|p| {
                    Pattern::new(p)
                        .map_err(|e| TorrentError::Build(format!("invalid glob '{p}': {e}")))
                })
                .collect()
        };
        Ok(CompiledPolicy {
            include: compile(&self.include)?,
            exclude: compile(&self.exclude)?,
        })
    }
}

struct CompiledPolicy {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl CompiledPolicy {
    fn allows(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        let included =
            self.include.is_empty() || self.include.iter().any(|p| p.matches_with(file_name, options));
        included && !self.exclude.iter().any(|p| p.matches_with(file_name, options))
    }
}

/// Parameters for a fresh torrent.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root name; defaults to the source's file or folder name.
    pub name: Option<String>,
    pub piece_length: u64,
    pub announce: String,
    pub source: Option<String>,
    pub comment: Option<String>,
    pub created_by: String,
    pub private: bool,
    pub policy: FilePolicy,
}

/// Raw torrent construction.
#[async_trait]
pub trait TorrentBuilder: Send + Sync {
    /// Hash `source` and return the encoded metainfo.
    async fn build(&self, source: &Path, options: &BuildOptions) -> Result<Vec<u8>, TorrentError>;
}

/// v1 builder hashing on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashingTorrentBuilder;

#[async_trait]
impl TorrentBuilder for HashingTorrentBuilder {
    async fn build(&self, source: &Path, options: &BuildOptions) -> Result<Vec<u8>, TorrentError> {
        let source = source.to_path_buf();
        let options = options.clone();
        tokio::task::spawn_blocking(move || build_blocking(&source, &options))
            .await
            .map_err(|e| TorrentError::Build(format!("hashing task failed: {e}")))?
    }
}

/// A content file with its path inside the torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub components: Vec<String>,
    pub length: u64,
}

/// Collect the files of `source` allowed by `policy`, in path order.
///
/// A single-file source is always kept.
pub fn scan(source: &Path, policy: &FilePolicy) -> Result<Vec<SourceFile>, TorrentError> {
    let metadata = std::fs::metadata(source).map_err(|e| TorrentError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    if metadata.is_file() {
        let name = file_name(source)?;
        return Ok(vec![SourceFile {
            path: source.to_path_buf(),
            components: vec![name],
            length: metadata.len(),
        }]);
    }

    let policy = policy.compile()?;
    let mut files = Vec::new();
    for entry in WalkDir::new(source).sort(true).skip_hidden(false) {
        let entry = entry.map_err(|e| TorrentError::Build(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !policy.allows(&name) {
            debug!(file = %name, "Excluded from torrent");
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(source)
            .map_err(|e| TorrentError::Build(e.to_string()))?;
        let components = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let length = entry
            .metadata()
            .map_err(|e| TorrentError::Build(e.to_string()))?
            .len();

        files.push(SourceFile {
            path,
            components,
            length,
        });
    }

    files.sort_by(|a, b| a.components.cmp(&b.components));
    Ok(files)
}

fn build_blocking(source: &Path, options: &BuildOptions) -> Result<Vec<u8>, TorrentError> {
    if !options.piece_length.is_power_of_two() || options.piece_length < 16 * 1024 {
        return Err(TorrentError::Build(format!(
            "piece length {} is not a power of two of at least 16 KiB",
            options.piece_length
        )));
    }

    let files = scan(source, &options.policy)?;
    if files.is_empty() {
        return Err(TorrentError::Empty);
    }

    let pieces = hash_pieces(&files, options.piece_length)?;
    let name = match &options.name {
        Some(name) => name.clone(),
        None => file_name(source)?,
    };

    let single = source.is_file();
    let info = Info {
        files: (!single).then(|| {
            files
                .iter()
                .map(|f| FileEntry {
                    length: f.length,
                    path: f.components.clone(),
                })
                .collect()
        }),
        length: single.then(|| files[0].length),
        name,
        piece_length: options.piece_length,
        pieces: ByteBuf::from(pieces),
        private: options.private.then_some(1),
        source: options.source.clone(),
    };

    debug!(
        source = %source.display(),
        files = files.len(),
        piece_length = options.piece_length,
        "Built torrent"
    );

    Metainfo {
        announce: Some(options.announce.clone()),
        announce_list: None,
        comment: options.comment.clone(),
        created_by: Some(options.created_by.clone()),
        creation_date: Some(chrono::Utc::now().timestamp()),
        info,
    }
    .to_bytes()
}

/// SHA-1 of every piece, streaming across file boundaries.
fn hash_pieces(files: &[SourceFile], piece_length: u64) -> Result<Vec<u8>, TorrentError> {
    let piece_length = usize::try_from(piece_length)
        .map_err(|_| TorrentError::Build("piece length too large".to_string()))?;
    let mut buffer = vec![0u8; piece_length];
    let mut filled = 0usize;
    let mut pieces = Vec::new();

    for file in files {
        let mut handle = File::open(&file.path).map_err(|e| TorrentError::Read {
            path: file.path.clone(),
            source: e,
        })?;
        loop {
            let read = handle
                .read(&mut buffer[filled..])
                .map_err(|e| TorrentError::Read {
                    path: file.path.clone(),
                    source: e,
                })?;
            if read == 0 {
                break;
            }
            filled += read;
            if filled == piece_length {
                pieces.extend_from_slice(&Sha1::digest(&buffer));
                filled = 0;
            }
        }
    }
    if filled > 0 {
        pieces.extend_from_slice(&Sha1::digest(&buffer[..filled]));
    }
    Ok(pieces)
}

fn file_name(path: &Path) -> Result<String, TorrentError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| TorrentError::Build(format!("{} has no file name", path.display())))
}
