pub mod config;
pub mod context;
pub mod description;
pub mod http;
pub mod mapping;
pub mod naming;
pub mod normalize;
pub mod prompt;
pub mod session;
pub mod testing;
pub mod torrent;
pub mod tracker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FileListConfig,
    HdbConfig, SanitizedConfig,
};
pub use context::{ArtifactPaths, Category, ReleaseType, SubmissionContext};
pub use prompt::{DefaultAnswers, Prompt};
pub use session::{SessionManager, SessionState};
pub use torrent::{ComplianceManager, HashingTorrentBuilder};
pub use tracker::{
    FileListAdapter, HdbAdapter, TrackerAdapter, UploadError, UploadOptions, UploadResult,
    Uploader,
};
