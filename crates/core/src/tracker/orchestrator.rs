//! Generic upload sequence shared by every tracker.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::context::{ArtifactPaths, SubmissionContext};
use crate::prompt::Prompt;
use crate::torrent::{ComplianceManager, ComplianceOutcome};

use super::search::advisory;
use super::{SubmissionDraft, TrackerAdapter, UploadError, UploadOptions, UploadResult};

/// Drives one submission per call against any [`TrackerAdapter`].
pub struct Uploader {
    compliance: ComplianceManager,
    base_dir: PathBuf,
    options: UploadOptions,
    prompt: Arc<dyn Prompt>,
}

impl Uploader {
    pub fn new(compliance: ComplianceManager, config: &Config, prompt: Arc<dyn Prompt>) -> Self {
        Self {
            compliance,
            base_dir: config.base_dir.clone(),
            options: UploadOptions::from(config),
            prompt,
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> UploadOptions {
        self.options
    }

    /// Existing releases on the tracker. Never fails.
    pub async fn search_duplicates(
        &self,
        adapter: &dyn TrackerAdapter,
        ctx: &SubmissionContext,
    ) -> Vec<String> {
        advisory(adapter.id(), adapter.search_existing(ctx)).await
    }

    /// Run the whole sequence for `ctx` on `adapter`.
    ///
    /// Name and ids are resolved before any network request, so an
    /// unsupported release aborts without touching the site. Submission is
    /// never retried.
    pub async fn upload(
        &self,
        adapter: &dyn TrackerAdapter,
        ctx: &SubmissionContext,
    ) -> Result<UploadResult, UploadError> {
        let tracker = adapter.id();
        let paths = ArtifactPaths::new(&self.base_dir, &ctx.uuid);

        let name = self.resolve_name(adapter, ctx)?;
        let ids = adapter.map_ids(ctx)?;
        adapter.check_content_rules(ctx)?;
        debug!(tracker, %ids, "Mapped release");

        adapter.validate_credentials(self.prompt.as_ref()).await?;

        if self.options.check_duplicates {
            let dupes = self.search_duplicates(adapter, ctx).await;
            if !dupes.is_empty() {
                warn!(tracker, count = dupes.len(), "Possible duplicates: {:?}", dupes);
                if !self.prompt.confirm("Possible duplicates found. Upload anyway?", false) {
                    return Ok(UploadResult::Duplicate(dupes));
                }
            }
        }

        let description = adapter.build_description(ctx, &paths).await?;

        let torrent = match self
            .compliance
            .ensure(ctx, &paths, &adapter.torrent_policy())
            .await?
        {
            ComplianceOutcome::Regenerated {
                path,
                old_piece_size,
                new_piece_size,
            } => {
                info!(tracker, old_piece_size, new_piece_size, "Regenerated torrent");
                path
            }
            ComplianceOutcome::Relabeled { path, .. } => path,
        };

        let draft = SubmissionDraft {
            name,
            ids,
            description,
            torrent,
        };
        let form = adapter.build_form(ctx, &paths, &draft).await?;

        if self.options.debug {
            info!(tracker, url = %form.url, fields = ?form.fields, "Debug mode, not uploading");
            return Ok(UploadResult::DryRun(Box::new(form)));
        }

        info!(tracker, name = %draft.name, "Uploading");
        let response = match adapter.submit(&form).await {
            Ok(response) => response,
            Err(UploadError::Transport(detail)) => {
                error!(tracker, error = %detail, "Upload request failed");
                return Ok(UploadResult::TransportError {
                    detail,
                    form: Box::new(form),
                });
            }
            Err(e) => return Err(e),
        };

        match adapter.success_pattern().match_id(&response.url) {
            Some(remote_id) => {
                info!(tracker, remote_id, url = %response.url, "Upload succeeded");
                let target = paths.tracker_torrent(tracker);
                if let Err(e) = adapter.download_torrent(remote_id, &target).await {
                    warn!(tracker, remote_id, error = %e, "Failed to download the site's torrent");
                }
                Ok(UploadResult::Success {
                    remote_id,
                    details_url: response.url,
                })
            }
            None => {
                error!(
                    tracker,
                    url = %response.url,
                    status = response.status,
                    "Upload failed: result URL was not expected"
                );
                Ok(UploadResult::Rejected(UploadError::UnexpectedResponse {
                    url: response.url,
                    status: response.status,
                    body: response.body,
                    form: Box::new(form),
                }))
            }
        }
    }

    fn resolve_name(
        &self,
        adapter: &dyn TrackerAdapter,
        ctx: &SubmissionContext,
    ) -> Result<String, UploadError> {
        let name = adapter.format_name(ctx);
        info!(tracker = adapter.id(), name = %name, "Formatted name");

        if !adapter.confirm_name() || self.options.unattended {
            return Ok(name);
        }
        if self.prompt.confirm(&format!("{} name: {name}. Correct?", adapter.id()), false) {
            return Ok(name);
        }

        let manual = self.prompt.ask("Please enter a proper name", "");
        let manual = manual.trim();
        if manual.is_empty() {
            return Err(UploadError::Aborted("no proper name given".into()));
        }
        Ok(manual.to_string())
    }
}
