//! Tracker adapters and the upload sequence that drives them.

mod adapter;
mod error;
pub mod filelist;
pub mod hdb;
mod orchestrator;
pub mod search;
mod types;

pub use adapter::TrackerAdapter;
pub use error::UploadError;
pub use filelist::FileListAdapter;
pub use hdb::HdbAdapter;
pub use orchestrator::Uploader;
pub use types::{
    post_form, SubmissionDraft, SubmissionForm, SubmitResponse, SuccessPattern, TorrentPart,
    UploadOptions, UploadResult, TORRENT_MIME,
};
