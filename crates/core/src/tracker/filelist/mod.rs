//! FileList (`FL`).
//!
//! Form login with an anti-automation `validator` token, HTML search, and a
//! remote service that renders MediaInfo and hosts screenshots.

pub mod rules;
mod service;

pub use service::DescriptionService;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::{Config, FileListConfig, HttpConfig};
use crate::context::{cookie_path, regional_tracks, write_atomic, ArtifactPaths, SubmissionContext};
use crate::description::{
    disc_quote_blocks, read_optional, BbcodeNormalizer, DescriptionAssembler, DiscPlacement,
    Gallery, MarkupNormalizer, SpoilerMode,
};
use crate::http::{pause, secs, LOGIN_PAUSE};
use crate::mapping::MappedIds;
use crate::prompt::Prompt;
use crate::session::{CookieFile, LoginFlow, SessionError, SessionManager, SessionTarget};
use crate::torrent::{Relabel, TorrentPolicy};

use super::search::scrape_detail_titles;
use super::{
    post_form, SubmissionDraft, SubmissionForm, SubmitResponse, SuccessPattern, TorrentPart,
    TrackerAdapter, UploadError,
};

const ID: &str = "FL";
const MARKER: &str = "Logout";

struct FileListLogin {
    base: String,
    username: String,
    password: String,
}

/// `value` of the login form's `validator` input.
fn scrape_validator(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"input[name="validator"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

#[async_trait]
impl LoginFlow for FileListLogin {
    async fn login(&self, client: &Client, timeout: Duration) -> Result<String, SessionError> {
        let page = client
            .get(format!("{}/login.php", self.base))
            .timeout(timeout)
            .send()
            .await?
            .text()
            .await?;
        pause(LOGIN_PAUSE).await;

        let validator = scrape_validator(&page).ok_or_else(|| {
            SessionError::AuthenticationFailed("login page has no validator token".into())
        })?;
        let params = [
            ("validator", validator.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("unlock", "1"),
        ];
        client
            .post(format!("{}/takelogin.php", self.base))
            .form(&params)
            .timeout(timeout)
            .send()
            .await?;
        pause(LOGIN_PAUSE).await;

        let index = client
            .get(format!("{}/index.php", self.base))
            .timeout(timeout)
            .send()
            .await?
            .text()
            .await?;
        Ok(index)
    }
}

pub struct FileListAdapter {
    config: FileListConfig,
    http: HttpConfig,
    base: String,
    session: SessionManager,
    success: SuccessPattern,
    service: Option<DescriptionService>,
    comment: Option<String>,
}

impl FileListAdapter {
    pub fn new(config: &FileListConfig, shared: &Config) -> Result<Self, UploadError> {
        let base = config.url.trim_end_matches('/').to_string();
        let site_url = Url::parse(&format!("{base}/")).map_err(|e| UploadError::Config(e.to_string()))?;

        let target = SessionTarget {
            tracker: ID,
            site_url,
            marker_url: format!("{base}/index.php"),
            marker: MARKER.to_string(),
        };
        let login = FileListLogin {
            base: base.clone(),
            username: config.username.trim().to_string(),
            password: config.password.trim().to_string(),
        };
        let session = SessionManager::new(
            target,
            CookieFile::new(cookie_path(&shared.base_dir, ID)),
            Some(Box::new(login)),
            &shared.http,
        )?;

        let service = config
            .description_service
            .as_ref()
            .map(|s| DescriptionService::new(s, &shared.http))
            .transpose()?;

        Ok(Self {
            config: config.clone(),
            http: shared.http.clone(),
            success: SuccessPattern::details_page(&base)?,
            base,
            session,
            service,
            comment: shared.torrent.comment.clone(),
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn normalizer() -> BbcodeNormalizer {
        BbcodeNormalizer {
            spoilers: SpoilerMode::Remove,
            code_to_quote: true,
            comparison_width: Some(900),
            canonical_img: true,
        }
    }

    async fn render_gallery(
        &self,
        ctx: &SubmissionContext,
        mediainfo: Option<&str>,
        screens: &[PathBuf],
    ) -> Option<String> {
        let service = self.service.as_ref()?;
        match service.render(mediainfo, ctx.imdb_tt(), screens).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(tracker = ID, error = %e, "Description service failed, linking screenshots");
                None
            }
        }
    }

    fn screenshot_links(ctx: &SubmissionContext) -> Gallery {
        Gallery::Links {
            images: ctx.image_list.clone(),
            limit: ctx.screens,
        }
    }

    fn imdb_padded(ctx: &SubmissionContext) -> Option<String> {
        ctx.imdb().map(|id| format!("{id:07}"))
    }
}

#[async_trait]
impl TrackerAdapter for FileListAdapter {
    fn id(&self) -> &'static str {
        ID
    }

    fn confirm_name(&self) -> bool {
        true
    }

    fn format_name(&self, ctx: &SubmissionContext) -> String {
        rules::format_name(ctx)
    }

    fn map_ids(&self, ctx: &SubmissionContext) -> Result<MappedIds, UploadError> {
        Ok(MappedIds {
            category: rules::category_id(ctx),
            ..Default::default()
        })
    }

    fn torrent_policy(&self) -> TorrentPolicy {
        TorrentPolicy {
            tracker: ID,
            max_piece_size: None,
            relabel: Relabel {
                announce: self.config.announce_url.clone(),
                source: ID.to_string(),
                comment: self.comment.clone(),
                private: true,
            },
        }
    }

    fn success_pattern(&self) -> &SuccessPattern {
        &self.success
    }

    async fn build_description(
        &self,
        ctx: &SubmissionContext,
        paths: &ArtifactPaths,
    ) -> Result<PathBuf, UploadError> {
        let base = read_optional(&paths.base_description())
            .await?
            .unwrap_or_default();
        let normalizer = Self::normalizer();
        let screens = paths.screenshots(&ctx.filename);
        let signature = self.config.signature.clone();

        let assembler = if ctx.is_bdmv() {
            let summary = read_optional(&paths.bd_summary_ext())
                .await?
                .filter(|s| !s.trim().is_empty());
            let gallery = match self.render_gallery(ctx, None, &screens).await {
                Some(hosted) => Gallery::Rehosted(hosted),
                None => Self::screenshot_links(ctx),
            };
            let assembler = DescriptionAssembler::new(&normalizer, DiscPlacement::AfterBody);
            let assembler = match summary {
                Some(summary) => assembler
                    .discs(vec![rules::wrap_bd_summary(&summary, &normalizer.normalize(&base))]),
                None => assembler.body(base).discs(disc_quote_blocks(&ctx.discs)),
            };
            assembler.gallery(gallery)
        } else {
            let mediainfo = read_optional(&paths.mediainfo_clean()).await?;
            let assembler = DescriptionAssembler::new(&normalizer, DiscPlacement::AfterBody).body(base);
            match self.render_gallery(ctx, mediainfo.as_deref(), &screens).await {
                Some(rendered) => assembler.gallery(Gallery::Rehosted(rendered)),
                None => assembler
                    .mediainfo(mediainfo)
                    .gallery(Self::screenshot_links(ctx)),
            }
        };

        let path = assembler
            .signature(signature)
            .write_to(&paths.tracker_description(ID))
            .await?;
        Ok(path)
    }

    async fn validate_credentials(&self, prompt: &dyn Prompt) -> Result<(), UploadError> {
        self.session.validate_credentials(prompt).await?;
        Ok(())
    }

    async fn search_existing(&self, ctx: &SubmissionContext) -> Result<Vec<String>, UploadError> {
        self.session.restore().await?;

        let category = rules::category_id(ctx).to_string();
        let (search, searchin) = match Self::imdb_padded(ctx) {
            Some(imdb) => (imdb, "3"),
            None => (ctx.title.clone(), "0"),
        };
        let params = [
            ("search", search.as_str()),
            ("cat", category.as_str()),
            ("searchin", searchin),
        ];

        let response = self
            .session
            .client()
            .await
            .get(format!("{}/browse.php", self.base))
            .query(&params)
            .timeout(secs(self.http.search_timeout_secs))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Transport(format!("search returned {status}")));
        }
        let html = response.text().await?;
        Ok(scrape_detail_titles(&html))
    }

    async fn build_form(
        &self,
        ctx: &SubmissionContext,
        paths: &ArtifactPaths,
        draft: &SubmissionDraft,
    ) -> Result<SubmissionForm, UploadError> {
        let descr = tokio::fs::read_to_string(&draft.description)
            .await
            .map_err(|e| UploadError::io(&draft.description, e))?;
        let nfo_path = if ctx.bdinfo.is_some() {
            paths.bd_summary()
        } else {
            paths.mediainfo_clean()
        };
        let nfo = read_optional(&nfo_path).await?.unwrap_or_default();

        let torrent = TorrentPart {
            file_name: format!("{}.torrent", rules::torrent_stem(ctx, &draft.name)),
            path: draft.torrent.clone(),
        };
        let imdb = Self::imdb_padded(ctx);
        let genres = imdb
            .as_ref()
            .and(ctx.imdb_info.as_ref())
            .map(|info| info.genres.clone());
        let uploader = self
            .config
            .uploader_name
            .as_deref()
            .filter(|name| !name.is_empty() && !self.config.anon);
        let ro = regional_tracks(ctx, "ro", "Romanian");

        let mut form = SubmissionForm::new(format!("{}/takeupload.php", self.base), torrent)
            .text("name", &draft.name)
            .text("type", draft.ids.category)
            .text("descr", descr.trim())
            .text("nfo", nfo)
            .text_opt("imdbid", imdb)
            .text_opt("description", genres)
            .text_opt("epenis", uploader);
        if ro.audio {
            form = form.text("materialro", "on");
        }
        if rules::is_freeleech(ctx) {
            form = form.text("freeleech", "on");
        }
        Ok(form)
    }

    async fn submit(&self, form: &SubmissionForm) -> Result<SubmitResponse, UploadError> {
        let client = self.session.client().await;
        post_form(&client, form, self.http.upload_timeout_secs.map(secs)).await
    }

    async fn download_torrent(&self, remote_id: u64, target: &Path) -> Result<(), UploadError> {
        let response = self
            .session
            .client()
            .await
            .get(format!("{}/download.php", self.base))
            .query(&[("id", remote_id)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Transport(format!(
                "torrent download returned {status}"
            )));
        }
        let bytes = response.bytes().await?;
        write_atomic(target, &bytes)
            .await
            .map_err(|e| UploadError::io(target, e))?;
        debug!(tracker = ID, remote_id, path = %target.display(), "Saved site torrent");
        Ok(())
    }
}
