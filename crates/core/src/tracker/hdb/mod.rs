//! HDBits (`HDB`).
//!
//! Sessions come from a user-supplied cookie file; there is no scripted
//! login. Search and torrent lookup go through the JSON API, which also
//! proves the passkey is valid.

pub mod api;
pub mod rules;

pub use api::{HdbImageHost, HdbTorrentInfo};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::config::{Config, HdbConfig, HttpConfig};
use crate::context::{
    cookie_path, write_atomic, ArtifactPaths, Category, ReleaseType, SubmissionContext,
};
use crate::description::{
    disc_quote_blocks, read_optional, BbcodeNormalizer, DescriptionAssembler, DiscPlacement,
    Gallery, ImageHost, SpoilerMode,
};
use crate::http::{build_client, secs};
use crate::mapping::MappedIds;
use crate::prompt::Prompt;
use crate::session::{CookieFile, SessionManager, SessionTarget};
use crate::torrent::{torrent_file_name, Relabel, TorrentPolicy, MAX_PIECE_16_MIB};

use self::api::{ApiStatus, Credentials, ExternalRef, TorrentList, TorrentQuery};
use super::{
    post_form, SubmissionDraft, SubmissionForm, SubmitResponse, SuccessPattern, TorrentPart,
    TrackerAdapter, UploadError,
};

const ID: &str = "HDB";
const SOURCE_FLAG: &str = "HDBits";
const MARKER: &str = r#"<a href="/logout.php">Logout</a>"#;

pub struct HdbAdapter {
    config: HdbConfig,
    http: HttpConfig,
    base: String,
    session: SessionManager,
    success: SuccessPattern,
    image_host: HdbImageHost,
    comment: Option<String>,
}

impl HdbAdapter {
    pub fn new(config: &HdbConfig, shared: &Config) -> Result<Self, UploadError> {
        let base = config.url.trim_end_matches('/').to_string();
        let site_url =
            Url::parse(&format!("{base}/")).map_err(|e| UploadError::Config(e.to_string()))?;

        let target = SessionTarget {
            tracker: ID,
            site_url,
            marker_url: format!("{base}/"),
            marker: MARKER.to_string(),
        };
        let session = SessionManager::new(
            target,
            CookieFile::new(cookie_path(&shared.base_dir, ID)),
            None,
            &shared.http,
        )?;

        let image_client = build_client(Default::default(), &shared.http)?;
        let image_host = HdbImageHost {
            upload_url: format!("{}/upload_api.php", config.image_url.trim_end_matches('/')),
            credentials: Self::credentials_of(config),
            client: image_client,
        };

        Ok(Self {
            config: config.clone(),
            http: shared.http.clone(),
            success: SuccessPattern::details_page(&base)?,
            base,
            session,
            image_host,
            comment: shared.torrent.comment.clone(),
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn credentials_of(config: &HdbConfig) -> Credentials {
        Credentials {
            username: config.username.trim().to_string(),
            passkey: config.passkey.trim().to_string(),
        }
    }

    fn query(&self) -> TorrentQuery {
        let credentials = Self::credentials_of(&self.config);
        TorrentQuery {
            username: credentials.username,
            passkey: credentials.passkey,
            ..Default::default()
        }
    }

    async fn torrents(&self, query: &TorrentQuery) -> Result<TorrentList, UploadError> {
        let response = self
            .session
            .client()
            .await
            .post(format!("{}/api/torrents", self.base))
            .json(query)
            .timeout(secs(self.http.search_timeout_secs))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Transport(format!("torrents API returned {status}")));
        }
        Ok(response.json().await?)
    }

    /// Whether username and passkey are accepted by the API.
    pub async fn validate_api(&self) -> Result<bool, UploadError> {
        let response = self
            .session
            .client()
            .await
            .post(format!("{}/api/test", self.base))
            .json(&Self::credentials_of(&self.config))
            .timeout(secs(self.http.validate_timeout_secs))
            .send()
            .await?;
        let status: ApiStatus = match response.json().await {
            Ok(status) => status,
            Err(e) => {
                debug!(tracker = ID, error = %e, "Unreadable API test response");
                return Ok(false);
            }
        };
        Ok(status.status == 0)
    }

    /// Name, hash and external ids of torrent `id`.
    pub async fn lookup_torrent(&self, id: u64) -> Result<Option<HdbTorrentInfo>, UploadError> {
        let query = TorrentQuery {
            id: Some(id),
            ..self.query()
        };
        let list = self.torrents(&query).await?;
        Ok(list.data.into_iter().next().map(HdbTorrentInfo::from))
    }

    fn normalizer() -> BbcodeNormalizer {
        BbcodeNormalizer {
            spoilers: SpoilerMode::Hide,
            code_to_quote: true,
            comparison_width: Some(1000),
            canonical_img: true,
        }
    }

    fn web_header(ctx: &SubmissionContext) -> Option<String> {
        (ctx.release_type == ReleaseType::WebDl
            && !ctx.service_longname.is_empty()
            && ctx.description.is_none())
        .then(|| {
            format!(
                "[center][quote]This release is sourced from {}[/quote][/center]",
                ctx.service_longname
            )
        })
    }

    async fn gallery(&self, ctx: &SubmissionContext, paths: &ArtifactPaths) -> Gallery {
        let links = Gallery::Links {
            images: ctx.image_list.clone(),
            limit: ctx.screens,
        };
        if !self.config.img_rehost {
            return links;
        }

        let limit = if ctx.is_tv_single() { 3 } else { 6 };
        let screens: Vec<PathBuf> = paths
            .screenshots(&ctx.filename)
            .into_iter()
            .take(limit)
            .collect();
        if screens.is_empty() {
            return links;
        }

        info!(tracker = ID, count = screens.len(), "Rehosting images");
        match self.image_host.rehost(&screens, &ctx.name).await {
            Ok(bbcode) => Gallery::Rehosted(bbcode),
            Err(e) => {
                warn!(tracker = ID, error = %e, "Image rehost failed, linking screenshots");
                links
            }
        }
    }

    fn is_internal(&self, ctx: &SubmissionContext) -> bool {
        let group = ctx.tag.strip_prefix('-').unwrap_or(&ctx.tag);
        !group.is_empty() && self.config.internal_groups.iter().any(|g| g == group)
    }
}

#[async_trait]
impl TrackerAdapter for HdbAdapter {
    fn id(&self) -> &'static str {
        ID
    }

    fn format_name(&self, ctx: &SubmissionContext) -> String {
        rules::format_name(ctx)
    }

    fn map_ids(&self, ctx: &SubmissionContext) -> Result<MappedIds, UploadError> {
        Ok(MappedIds {
            category: rules::category_id(ctx).require(ID, "category")?,
            codec: Some(rules::codec_id(ctx).require(ID, "codec")?),
            medium: Some(rules::medium_id(ctx).require(ID, "medium")?),
            resolution: Some(rules::resolution_id(&ctx.resolution)),
            tags: rules::tag_ids(ctx),
        })
    }

    fn check_content_rules(&self, ctx: &SubmissionContext) -> Result<(), UploadError> {
        if rules::dual_audio_allowed(ctx) {
            Ok(())
        } else {
            Err(UploadError::ContentRejected(
                "Dual-Audio encodes are not allowed for non-anime and non-disc content".into(),
            ))
        }
    }

    fn torrent_policy(&self) -> TorrentPolicy {
        TorrentPolicy {
            tracker: ID,
            max_piece_size: Some(MAX_PIECE_16_MIB),
            relabel: Relabel {
                announce: self.config.announce_url.clone(),
                source: SOURCE_FLAG.to_string(),
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
        let gallery = self.gallery(ctx, paths).await;
        let normalizer = Self::normalizer();

        let path = DescriptionAssembler::new(&normalizer, DiscPlacement::BeforeBody)
            .header(Self::web_header(ctx))
            .discs(disc_quote_blocks(&ctx.discs))
            .body(base)
            .gallery(gallery)
            .signature(self.config.signature.clone())
            .write_to(&paths.tracker_description(ID))
            .await?;
        Ok(path)
    }

    async fn validate_credentials(&self, _prompt: &dyn Prompt) -> Result<(), UploadError> {
        if !self.validate_api().await? {
            return Err(UploadError::AuthenticationFailure(
                "HDB API rejected the username/passkey".into(),
            ));
        }
        if !self.session.validate().await?.is_valid() {
            return Err(UploadError::AuthenticationFailure(format!(
                "HDB session cookies are missing or expired ({})",
                self.session.cookie_file().path().display()
            )));
        }
        Ok(())
    }

    async fn search_existing(&self, ctx: &SubmissionContext) -> Result<Vec<String>, UploadError> {
        info!(tracker = ID, "Searching for existing torrents");
        let query = TorrentQuery {
            category: rules::category_id(ctx).id(),
            codec: rules::codec_id(ctx).id(),
            medium: rules::medium_id(ctx).id(),
            search: Some(ctx.resolution.clone()),
            imdb: ctx.imdb().map(|id| ExternalRef { id }),
            tvdb: ctx.tvdb().map(|id| ExternalRef { id }),
            ..self.query()
        };
        let list = self.torrents(&query).await?;
        Ok(list.data.into_iter().map(|t| t.name).collect())
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
        let techinfo = if ctx.is_bdmv() {
            String::new()
        } else {
            read_optional(&paths.mediainfo_clean())
                .await?
                .unwrap_or_default()
        };

        let torrent = TorrentPart {
            file_name: format!("{}.torrent", torrent_file_name(ctx)),
            path: draft.torrent.clone(),
        };
        let ids = &draft.ids;
        let mut form = SubmissionForm::new(format!("{}/upload/upload", self.base), torrent)
            .text("name", &draft.name)
            .text("category", ids.category)
            .text_opt("codec", ids.codec)
            .text_opt("medium", ids.medium)
            .text("origin", u8::from(self.is_internal(ctx)))
            .text("descr", descr.trim_end())
            .text("techinfo", techinfo);
        for tag in &ids.tags {
            form = form.text("tags[]", tag);
        }
        form = form
            .text_opt("tvdb", ctx.tvdb())
            .text_opt(
                "imdb",
                ctx.imdb_tt()
                    .map(|tt| format!("https://www.imdb.com/title/{tt}/")),
            );
        if ctx.category == Category::Tv {
            form = form
                .text("tvdb_season", ctx.season.max(1))
                .text("tvdb_episode", ctx.episode.max(1));
        }
        Ok(form)
    }

    async fn submit(&self, form: &SubmissionForm) -> Result<SubmitResponse, UploadError> {
        let client = self.session.client().await;
        post_form(&client, form, self.http.upload_timeout_secs.map(secs)).await
    }

    async fn download_torrent(&self, remote_id: u64, target: &Path) -> Result<(), UploadError> {
        let entry = self
            .lookup_torrent(remote_id)
            .await?
            .ok_or_else(|| UploadError::Transport(format!("torrent {remote_id} not in API")))?;

        let credentials = Self::credentials_of(&self.config);
        let id = remote_id.to_string();
        let response = self
            .session
            .client()
            .await
            .get(format!(
                "{}/download.php/{}",
                self.base,
                urlencoding::encode(&entry.filename)
            ))
            .query(&[("passkey", credentials.passkey.as_str()), ("id", id.as_str())])
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
