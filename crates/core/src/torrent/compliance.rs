//! Per-tracker torrent compliance.
//!
//! `Unknown -> Checked -> {Compliant, NonCompliant}`; a non-compliant base
//! torrent is rebuilt with the tracker's maximum piece size, a compliant one
//! is copied and relabeled without re-hashing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::TorrentDefaults;
use crate::context::{write_atomic, ArtifactPaths, SubmissionContext};

use super::{
    relabel_bytes, BuildOptions, FilePolicy, Relabel, TorrentArtifact, TorrentBuilder,
    TorrentError,
};

/// Torrent constraints and labels declared by one tracker.
#[derive(Debug, Clone)]
pub struct TorrentPolicy {
    /// Artifact label, e.g. `HDB` for `[HDB].torrent`.
    pub tracker: &'static str,
    pub max_piece_size: Option<u64>,
    pub relabel: Relabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceState {
    Unknown,
    Checked { piece_size: u64 },
    Compliant,
    NonCompliant { piece_size: u64 },
}

/// What [`ComplianceManager::ensure`] did to produce the tracker torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceOutcome {
    Relabeled {
        path: PathBuf,
        piece_size: u64,
    },
    Regenerated {
        path: PathBuf,
        old_piece_size: u64,
        new_piece_size: u64,
    },
}

impl ComplianceOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Relabeled { path, .. } | Self::Regenerated { path, .. } => path,
        }
    }
}

struct ComplianceRun<'a> {
    tracker: &'a str,
    state: ComplianceState,
}

impl ComplianceRun<'_> {
    fn advance(&mut self, next: ComplianceState) {
        debug!(tracker = %self.tracker, from = ?self.state, to = ?next, "Torrent compliance");
        self.state = next;
    }
}

/// Produces `[TRACKER].torrent` from `BASE.torrent`.
pub struct ComplianceManager {
    builder: Arc<dyn TorrentBuilder>,
    created_by: String,
}

impl ComplianceManager {
    pub fn new(builder: Arc<dyn TorrentBuilder>, defaults: &TorrentDefaults) -> Self {
        Self {
            builder,
            created_by: defaults.created_by.clone(),
        }
    }

    pub async fn ensure(
        &self,
        ctx: &SubmissionContext,
        paths: &ArtifactPaths,
        policy: &TorrentPolicy,
    ) -> Result<ComplianceOutcome, TorrentError> {
        let mut run = ComplianceRun {
            tracker: policy.tracker,
            state: ComplianceState::Unknown,
        };

        let base_path = paths.base_torrent();
        let base = TorrentArtifact::read(&base_path).await?;
        run.advance(ComplianceState::Checked {
            piece_size: base.piece_size,
        });

        let target = paths.tracker_torrent(policy.tracker);
        let outcome = match policy.max_piece_size {
            Some(max) if base.piece_size > max => {
                run.advance(ComplianceState::NonCompliant {
                    piece_size: base.piece_size,
                });
                info!(
                    tracker = %policy.tracker,
                    piece_size = base.piece_size,
                    max_piece_size = max,
                    "Piece size over tracker limit, regenerating torrent"
                );
                let new_piece_size = self.regenerate(ctx, policy, max, &target).await?;
                ComplianceOutcome::Regenerated {
                    path: target,
                    old_piece_size: base.piece_size,
                    new_piece_size,
                }
            }
            _ => {
                self.relabel(&base_path, &target, &policy.relabel).await?;
                ComplianceOutcome::Relabeled {
                    path: target,
                    piece_size: base.piece_size,
                }
            }
        };

        run.advance(ComplianceState::Compliant);
        Ok(outcome)
    }

    async fn regenerate(
        &self,
        ctx: &SubmissionContext,
        policy: &TorrentPolicy,
        max: u64,
        target: &Path,
    ) -> Result<u64, TorrentError> {
        let options = BuildOptions {
            name: None,
            piece_length: max,
            announce: policy.relabel.announce.clone(),
            source: Some(policy.relabel.source.clone()),
            comment: policy.relabel.comment.clone(),
            created_by: self.created_by.clone(),
            private: policy.relabel.private,
            policy: FilePolicy::for_context(ctx),
        };

        let bytes = self
            .builder
            .build(&ctx.path, &options)
            .await
            .map_err(|e| TorrentError::Regeneration(e.to_string()))?;

        let rebuilt = TorrentArtifact::from_bytes(target, &bytes)?;
        if rebuilt.piece_size > max {
            return Err(TorrentError::StillNonCompliant {
                piece_size: rebuilt.piece_size,
                max,
            });
        }

        write_atomic(target, &bytes)
            .await
            .map_err(|e| TorrentError::Write {
                path: target.to_path_buf(),
                source: e,
            })?;
        Ok(rebuilt.piece_size)
    }

    async fn relabel(&self, base: &Path, target: &Path, label: &Relabel) -> Result<(), TorrentError> {
        let bytes = tokio::fs::read(base).await.map_err(|e| TorrentError::Read {
            path: base.to_path_buf(),
            source: e,
        })?;
        write_atomic(target, relabel_bytes(&bytes, label)?)
            .await
            .map_err(|e| TorrentError::Write {
                path: target.to_path_buf(),
                source: e,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent::{HashingTorrentBuilder, Metainfo};
    use async_trait::async_trait;
    use tempfile::TempDir;

    const KIB: u64 = 1024;

    fn policy(max: Option<u64>) -> TorrentPolicy {
        TorrentPolicy {
            tracker: "TST",
            max_piece_size: max,
            relabel: Relabel {
                announce: "https://tst/announce".into(),
                source: "TST".into(),
                comment: None,
                private: true,
            },
        }
    }

    async fn setup(piece_length: u64) -> (TempDir, SubmissionContext, ArtifactPaths) {
        let temp = TempDir::new().unwrap();
        let video = temp.path().join("Movie.2020.mkv");
        std::fs::write(&video, vec![3u8; 200 * 1024]).unwrap();

        let ctx = SubmissionContext {
            uuid: "Movie.2020.mkv".into(),
            path: video.clone(),
            video: video.clone(),
            ..Default::default()
        };
        let paths = ArtifactPaths::new(temp.path(), &ctx.uuid);

        let base = HashingTorrentBuilder
            .build(
                &video,
                &BuildOptions {
                    name: None,
                    piece_length,
                    announce: "https://base/announce".into(),
                    source: None,
                    comment: None,
                    created_by: "test".into(),
                    private: false,
                    policy: FilePolicy::everything(),
                },
            )
            .await
            .unwrap();
        write_atomic(&paths.base_torrent(), &base).await.unwrap();
        (temp, ctx, paths)
    }

    fn manager() -> ComplianceManager {
        ComplianceManager::new(Arc::new(HashingTorrentBuilder), &TorrentDefaults::default())
    }

    #[tokio::test]
    async fn test_compliant_torrent_is_relabeled_only() {
        let (_temp, ctx, paths) = setup(16 * KIB).await;
        let before = TorrentArtifact::read(&paths.base_torrent()).await.unwrap();

        let outcome = manager()
            .ensure(&ctx, &paths, &policy(Some(32 * KIB)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ComplianceOutcome::Relabeled {
                path: paths.tracker_torrent("TST"),
                piece_size: 16 * KIB,
            }
        );

        let after = TorrentArtifact::read(outcome.path()).await.unwrap();
        assert_eq!(after.piece_size, before.piece_size);
        assert_eq!(after.files, before.files);

        let bytes = std::fs::read(outcome.path()).unwrap();
        let meta = Metainfo::from_bytes(&bytes).unwrap();
        let base_meta = Metainfo::from_bytes(&std::fs::read(paths.base_torrent()).unwrap()).unwrap();
        assert_eq!(meta.announce.as_deref(), Some("https://tst/announce"));
        assert_eq!(meta.info.source.as_deref(), Some("TST"));
        assert_eq!(meta.info.pieces, base_meta.info.pieces);
    }

    #[tokio::test]
    async fn test_oversized_pieces_are_regenerated() {
        let (_temp, ctx, paths) = setup(64 * KIB).await;

        let outcome = manager()
            .ensure(&ctx, &paths, &policy(Some(32 * KIB)))
            .await
            .unwrap();
        match &outcome {
            ComplianceOutcome::Regenerated {
                old_piece_size,
                new_piece_size,
                ..
            } => {
                assert_eq!(*old_piece_size, 64 * KIB);
                assert!(*new_piece_size <= 32 * KIB);
            }
            other => panic!("expected regeneration, got {other:?}"),
        }

        let after = TorrentArtifact::read(outcome.path()).await.unwrap();
        assert!(after.piece_size <= 32 * KIB);
        assert_eq!(after.total_size, 200 * 1024);
    }

    #[tokio::test]
    async fn test_no_limit_never_regenerates() {
        let (_temp, ctx, paths) = setup(64 * KIB).await;
        let outcome = manager().ensure(&ctx, &paths, &policy(None)).await.unwrap();
        assert!(matches!(outcome, ComplianceOutcome::Relabeled { .. }));
    }

    struct OversizedBuilder;

    #[async_trait]
    impl TorrentBuilder for OversizedBuilder {
        async fn build(
            &self,
            source: &Path,
            options: &BuildOptions,
        ) -> Result<Vec<u8>, TorrentError> {
            let mut options = options.clone();
            options.piece_length *= 4;
            HashingTorrentBuilder.build(source, &options).await
        }
    }

    #[tokio::test]
    async fn test_still_oversized_after_rebuild_fails() {
        let (_temp, ctx, paths) = setup(64 * KIB).await;
        let manager = ComplianceManager::new(Arc::new(OversizedBuilder), &TorrentDefaults::default());

        let err = manager
            .ensure(&ctx, &paths, &policy(Some(32 * KIB)))
            .await
            .unwrap_err();
        assert!(matches!(err, TorrentError::StillNonCompliant { .. }));
        assert!(!paths.tracker_torrent("TST").exists());
    }

    #[tokio::test]
    async fn test_missing_base_torrent() {
        let temp = TempDir::new().unwrap();
        let ctx = SubmissionContext::default();
        let paths = ArtifactPaths::new(temp.path(), "missing");
        let err = manager().ensure(&ctx, &paths, &policy(None)).await.unwrap_err();
        assert!(matches!(err, TorrentError::Read { .. }));
    }
}
