use std::path::PathBuf;
use std::time::Duration;

use regex_lite::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::mapping::MappedIds;

use super::UploadError;

pub const TORRENT_MIME: &str = "application/x-bittorrent";

/// Torrent file attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TorrentPart {
    /// Name presented to the site, including `.torrent`.
    pub file_name: String,
    pub path: PathBuf,
}

/// A fully built multipart submission, kept for diagnostics when the site
/// rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionForm {
    pub url: String,
    pub fields: Vec<(String, String)>,
    pub torrent: TorrentPart,
}

impl SubmissionForm {
    pub fn new(url: impl Into<String>, torrent: TorrentPart) -> Self {
        Self {
            url: url.into(),
            fields: Vec::new(),
            torrent,
        }
    }

    pub fn text(mut self, key: &str, value: impl ToString) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    /// Add the field only when `value` is present.
    pub fn text_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.text(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Multipart body with the torrent under `file`.
    pub async fn to_multipart(&self) -> Result<Form, UploadError> {
        let bytes = tokio::fs::read(&self.torrent.path)
            .await
            .map_err(|e| UploadError::io(&self.torrent.path, e))?;
        let part = Part::bytes(bytes)
            .file_name(self.torrent.file_name.clone())
            .mime_str(TORRENT_MIME)?;

        let form = self
            .fields
            .iter()
            .fold(Form::new(), |form, (k, v)| form.text(k.clone(), v.clone()));
        Ok(form.part("file", part))
    }
}

/// What the site answered to a submission, after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// POST `form` with `client`. Redirects are followed so `url` is the final
/// location. No retry.
pub async fn post_form(
    client: &Client,
    form: &SubmissionForm,
    timeout: Option<Duration>,
) -> Result<SubmitResponse, UploadError> {
    let body = form.to_multipart().await?;
    let mut request = client.post(&form.url).multipart(body);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let url = response.url().to_string();
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| {
        warn!(url = %url, status, error = %e, "Failed to read submission response");
        UploadError::from(e)
    })?;
    debug!(url = %url, status, "Submission response");
    Ok(SubmitResponse { url, status, body })
}

/// Outcome of one upload that got as far as deciding whether to submit.
///
/// Failures before that point are `Err(UploadError)`.
#[derive(Debug)]
pub enum UploadResult {
    Success { remote_id: u64, details_url: String },
    /// Existing releases found and the user chose not to upload.
    Duplicate(Vec<String>),
    /// Submitted, but the site did not confirm.
    Rejected(UploadError),
    /// The submission request itself failed.
    TransportError {
        detail: String,
        form: Box<SubmissionForm>,
    },
    /// Debug mode: everything but the submission.
    DryRun(Box<SubmissionForm>),
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Shape of a "details page with id" URL a site redirects to after a
/// successful upload.
#[derive(Debug, Clone)]
pub struct SuccessPattern {
    pattern: Regex,
}

impl SuccessPattern {
    /// `<site>/details.php?id=<id>&uploaded=<n>`.
    pub fn details_page(site_url: &str) -> Result<Self, UploadError> {
        let base = site_url.trim_end_matches('/');
        let pattern = format!(
            r"^{}/details\.php\?id=(\d+)&uploaded=(\d+)",
            regex_lite::escape(base)
        );
        let pattern = Regex::new(&pattern).map_err(|e| UploadError::Config(e.to_string()))?;
        Ok(Self { pattern })
    }

    /// Remote id when `url` has the success shape.
    pub fn match_id(&self, url: &str) -> Option<u64> {
        self.pattern
            .captures(url)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Process-level switches for an upload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub debug: bool,
    pub unattended: bool,
    pub check_duplicates: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            debug: false,
            unattended: false,
            check_duplicates: true,
        }
    }
}

impl From<&Config> for UploadOptions {
    fn from(config: &Config) -> Self {
        Self {
            debug: config.debug,
            unattended: config.unattended,
            check_duplicates: config.check_duplicates,
        }
    }
}

/// Everything an adapter needs to build its form, computed by the
/// orchestrator beforehand.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub name: String,
    pub ids: MappedIds,
    pub description: PathBuf,
    pub torrent: PathBuf,
}
