use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Working directory holding `tmp/<uuid>/` artifacts and `data/cookies/`.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Build every request but never submit it.
    #[serde(default)]
    pub debug: bool,
    /// Never block on interactive prompts; take the default answer.
    #[serde(default)]
    pub unattended: bool,
    /// Run a duplicate search before each upload.
    #[serde(default = "default_true")]
    pub check_duplicates: bool,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub torrent: TorrentDefaults,
    #[serde(default)]
    pub trackers: TrackersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            debug: false,
            unattended: false,
            check_duplicates: true,
            http: HttpConfig::default(),
            torrent: TorrentDefaults::default(),
            trackers: TrackersConfig::default(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// HTTP transport settings shared by every tracker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Timeout for duplicate-search requests.
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u32,
    /// Timeout for session validation and login requests.
    #[serde(default = "default_validate_timeout")]
    pub validate_timeout_secs: u32,
    /// Timeout for the upload POST itself. Unbounded when absent.
    #[serde(default)]
    pub upload_timeout_secs: Option<u32>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_timeout(),
            validate_timeout_secs: default_validate_timeout(),
            upload_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_search_timeout() -> u32 {
    10
}

fn default_validate_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("uploadarr/{}", env!("CARGO_PKG_VERSION"))
}

/// Defaults applied when a torrent has to be rebuilt or relabeled.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentDefaults {
    #[serde(default = "default_created_by")]
    pub created_by: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Default for TorrentDefaults {
    fn default() -> Self {
        Self {
            created_by: default_created_by(),
            comment: None,
        }
    }
}

fn default_created_by() -> String {
    "uploadarr".to_string()
}

/// Per-tracker sections. A tracker without a section is not uploaded to.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackersConfig {
    #[serde(default)]
    pub hdb: Option<HdbConfig>,
    #[serde(default)]
    pub filelist: Option<FileListConfig>,
}

/// HDBits configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HdbConfig {
    pub username: String,
    pub passkey: String,
    /// Personal announce URL written into the relabeled torrent.
    #[serde(default = "default_hdb_announce")]
    pub announce_url: String,
    #[serde(default = "default_hdb_url")]
    pub url: String,
    #[serde(default = "default_hdb_image_url")]
    pub image_url: String,
    /// Rehost screenshots on the tracker's image service.
    #[serde(default = "default_true")]
    pub img_rehost: bool,
    /// Release groups uploaded as internal (`origin = 1`).
    #[serde(default)]
    pub internal_groups: Vec<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

fn default_hdb_announce() -> String {
    "https://fake.tracker".to_string()
}

fn default_hdb_url() -> String {
    "https://hdbits.org".to_string()
}

fn default_hdb_image_url() -> String {
    "https://img.hdbits.org".to_string()
}

/// FileList configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileListConfig {
    pub username: String,
    pub password: String,
    #[serde(default = "default_fl_announce")]
    pub announce_url: String,
    #[serde(default = "default_fl_url")]
    pub url: String,
    /// Name shown as uploader; omitted when anonymous.
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub anon: bool,
    /// Remote description service for mediainfo and screenshots.
    #[serde(default)]
    pub description_service: Option<DescriptionServiceConfig>,
    #[serde(default)]
    pub signature: Option<String>,
}

fn default_fl_announce() -> String {
    "https://filelist.io/announce.php".to_string()
}

fn default_fl_url() -> String {
    "https://filelist.io".to_string()
}

/// Credentials for the FileList description service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescriptionServiceConfig {
    #[serde(default = "default_description_service_url")]
    pub url: String,
    pub username: String,
    pub password: String,
}

fn default_description_service_url() -> String {
    "https://up.img4k.net/api/description".to_string()
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub base_dir: PathBuf,
    pub debug: bool,
    pub unattended: bool,
    pub check_duplicates: bool,
    pub http: HttpConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdb: Option<SanitizedTrackerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filelist: Option<SanitizedTrackerConfig>,
}

/// Tracker config with credentials hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrackerConfig {
    pub url: String,
    pub username: String,
    pub credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            debug: config.debug,
            unattended: config.unattended,
            check_duplicates: config.check_duplicates,
            http: config.http.clone(),
            hdb: config.trackers.hdb.as_ref().map(|h| SanitizedTrackerConfig {
                url: h.url.clone(),
                username: h.username.clone(),
                credentials_configured: !h.passkey.is_empty(),
            }),
            filelist: config
                .trackers
                .filelist
                .as_ref()
                .map(|f| SanitizedTrackerConfig {
                    url: f.url.clone(),
                    username: f.username.clone(),
                    credentials_configured: !f.password.is_empty(),
                }),
        }
    }
}
