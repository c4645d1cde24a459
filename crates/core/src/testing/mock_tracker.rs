//! Mock tracker for testing.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::context::{write_atomic, ArtifactPaths, SubmissionContext};
use crate::description::read_optional;
use crate::mapping::MappedIds;
use crate::prompt::Prompt;
use crate::torrent::{Relabel, TorrentPolicy};
use crate::tracker::{
    SubmissionDraft, SubmissionForm, SubmitResponse, SuccessPattern, TorrentPart, TrackerAdapter,
    UploadError,
};

const SITE: &str = "https://mock.tracker";

#[derive(Default)]
struct MockState {
    response_url: Option<String>,
    unsupported: Option<&'static str>,
    existing: Vec<String>,
    submit_failure: Option<String>,
    submissions: Vec<SubmissionForm>,
    downloads: Vec<u64>,
    network_calls: usize,
}

/// In-memory [`TrackerAdapter`] at `https://mock.tracker`.
///
/// Every method that would reach the site counts as a network call, so
/// tests can assert that an upload stopped before touching it.
///
/// ```rust,ignore
/// let tracker = MockTracker::new("MCK");
/// tracker.respond_with_url("https://mock.tracker/details.php?id=1&uploaded=1").await;
/// uploader.upload(&tracker, &ctx).await?;
/// assert_eq!(tracker.downloads().await, vec![1]);
/// ```
pub struct MockTracker {
    id: &'static str,
    confirm_name: bool,
    success: SuccessPattern,
    state: Mutex<MockState>,
}

impl MockTracker {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            confirm_name: false,
            success: SuccessPattern::details_page(SITE).expect("valid mock site url"),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Ask for name confirmation like trackers with strict naming do.
    pub fn confirming_name(mut self) -> Self {
        self.confirm_name = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// URL the site "redirects" to after a submission.
    pub async fn respond_with_url(&self, url: &str) {
        self.state().response_url = Some(url.to_string());
    }

    /// Make `slot` unmappable.
    pub async fn set_unsupported(&self, slot: &'static str) {
        self.state().unsupported = Some(slot);
    }

    /// Releases returned by the duplicate search.
    pub async fn set_existing(&self, names: Vec<String>) {
        self.state().existing = names;
    }

    /// Fail the next submissions with a transport error.
    pub async fn fail_submit(&self, detail: &str) {
        self.state().submit_failure = Some(detail.to_string());
    }

    pub async fn submissions(&self) -> Vec<SubmissionForm> {
        self.state().submissions.clone()
    }

    pub async fn downloads(&self) -> Vec<u64> {
        self.state().downloads.clone()
    }

    pub async fn network_calls(&self) -> usize {
        self.state().network_calls
    }

    pub fn formatted_name(&self, ctx: &SubmissionContext) -> String {
        ctx.name.replace(' ', ".")
    }

    fn record_call(&self) {
        self.state().network_calls += 1;
    }
}

#[async_trait]
impl TrackerAdapter for MockTracker {
    fn id(&self) -> &'static str {
        self.id
    }

    fn confirm_name(&self) -> bool {
        self.confirm_name
    }

    fn format_name(&self, ctx: &SubmissionContext) -> String {
        self.formatted_name(ctx)
    }

    fn map_ids(&self, _ctx: &SubmissionContext) -> Result<MappedIds, UploadError> {
        if let Some(slot) = self.state().unsupported {
            return Err(UploadError::MappingUnsupported {
                tracker: self.id.to_string(),
                slot,
            });
        }
        Ok(MappedIds {
            category: 1,
            ..Default::default()
        })
    }

    fn torrent_policy(&self) -> TorrentPolicy {
        TorrentPolicy {
            tracker: self.id,
            max_piece_size: None,
            relabel: Relabel {
                announce: format!("{SITE}/announce"),
                source: self.id.to_string(),
                comment: None,
                private: true,
            },
        }
    }

    fn success_pattern(&self) -> &SuccessPattern {
        &self.success
    }

    async fn build_description(
        &self,
        _ctx: &SubmissionContext,
        paths: &ArtifactPaths,
    ) -> Result<PathBuf, UploadError> {
        let body = read_optional(&paths.base_description())
            .await?
            .unwrap_or_default();
        let target = paths.tracker_description(self.id);
        write_atomic(&target, body)
            .await
            .map_err(|e| UploadError::io(&target, e))?;
        Ok(target)
    }

    async fn validate_credentials(&self, _prompt: &dyn Prompt) -> Result<(), UploadError> {
        self.record_call();
        Ok(())
    }

    async fn search_existing(&self, _ctx: &SubmissionContext) -> Result<Vec<String>, UploadError> {
        self.record_call();
        Ok(self.state().existing.clone())
    }

    async fn build_form(
        &self,
        _ctx: &SubmissionContext,
        _paths: &ArtifactPaths,
        draft: &SubmissionDraft,
    ) -> Result<SubmissionForm, UploadError> {
        let torrent = TorrentPart {
            file_name: format!("{}.torrent", draft.name),
            path: draft.torrent.clone(),
        };
        Ok(SubmissionForm::new(format!("{SITE}/upload.php"), torrent)
            .text("name", &draft.name)
            .text("category", draft.ids.category))
    }

    async fn submit(&self, form: &SubmissionForm) -> Result<SubmitResponse, UploadError> {
        let mut state = self.state();
        state.network_calls += 1;
        state.submissions.push(form.clone());
        if let Some(detail) = &state.submit_failure {
            return Err(UploadError::Transport(detail.clone()));
        }
        Ok(SubmitResponse {
            url: state
                .response_url
                .clone()
                .unwrap_or_else(|| format!("{SITE}/upload.php")),
            status: 200,
            body: String::new(),
        })
    }

    async fn download_torrent(&self, remote_id: u64, _target: &Path) -> Result<(), UploadError> {
        let mut state = self.state();
        state.network_calls += 1;
        state.downloads.push(remote_id);
        Ok(())
    }
}
