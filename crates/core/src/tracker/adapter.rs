use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::context::{ArtifactPaths, SubmissionContext};
use crate::mapping::MappedIds;
use crate::prompt::Prompt;
use crate::torrent::TorrentPolicy;

use super::{SubmissionDraft, SubmissionForm, SubmitResponse, SuccessPattern, UploadError};

/// One tracker's taxonomy, naming, description format and protocol.
///
/// The orchestrator calls these in a fixed order; see
/// [`Uploader::upload`](super::Uploader::upload).
#[async_trait]
pub trait TrackerAdapter: Send + Sync {
    /// Short label used in artifact names and logs (`HDB`, `FL`).
    fn id(&self) -> &'static str;

    /// Whether the formatted name is shown to the user for confirmation.
    fn confirm_name(&self) -> bool {
        false
    }

    fn format_name(&self, ctx: &SubmissionContext) -> String;

    /// Every id the submission needs. Fails with
    /// [`UploadError::MappingUnsupported`] on a sentinel.
    fn map_ids(&self, ctx: &SubmissionContext) -> Result<MappedIds, UploadError>;

    /// Site rules beyond the mapping tables.
    fn check_content_rules(&self, _ctx: &SubmissionContext) -> Result<(), UploadError> {
        Ok(())
    }

    fn torrent_policy(&self) -> TorrentPolicy;

    fn success_pattern(&self) -> &SuccessPattern;

    /// Write `[ID]DESCRIPTION.txt` and return its path.
    async fn build_description(
        &self,
        ctx: &SubmissionContext,
        paths: &ArtifactPaths,
    ) -> Result<PathBuf, UploadError>;

    async fn validate_credentials(&self, prompt: &dyn Prompt) -> Result<(), UploadError>;

    /// Names of existing releases that look like this one. Errors are
    /// reported by the caller as warnings.
    async fn search_existing(&self, ctx: &SubmissionContext) -> Result<Vec<String>, UploadError>;

    async fn build_form(
        &self,
        ctx: &SubmissionContext,
        paths: &ArtifactPaths,
        draft: &SubmissionDraft,
    ) -> Result<SubmissionForm, UploadError>;

    async fn submit(&self, form: &SubmissionForm) -> Result<SubmitResponse, UploadError>;

    /// Replace `target` with the site's copy of torrent `remote_id`.
    async fn download_torrent(&self, remote_id: u64, target: &Path) -> Result<(), UploadError>;
}
