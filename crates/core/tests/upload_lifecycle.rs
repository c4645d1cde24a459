//! Upload lifecycle against an in-process fake tracker.
//!
//! Session login and validation, duplicate search, submission and the
//! post-upload torrent download, for both site adapters.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use common::{FakeTracker, REMOTE_ID};
use uploadarr_core::context::ArtifactPaths;
use uploadarr_core::session::SessionState;
use uploadarr_core::testing::fixtures;
use uploadarr_core::torrent::{ComplianceManager, HashingTorrentBuilder};
use uploadarr_core::tracker::{
    FileListAdapter, HdbAdapter, TrackerAdapter, UploadError, UploadOptions, UploadResult, Uploader,
};
use uploadarr_core::DefaultAnswers;

fn uploader(config: &uploadarr_core::Config) -> Uploader {
    let compliance = ComplianceManager::new(Arc::new(HashingTorrentBuilder), &config.torrent);
    Uploader::new(compliance, config, Arc::new(DefaultAnswers))
}

#[tokio::test]
async fn test_filelist_login_persists_session() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let fl = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();

    fl.validate_credentials(&DefaultAnswers).await.unwrap();

    assert_eq!(fake.logins().await, 1);
    assert!(fl.session().cookie_file().exists().await);
    assert_eq!(fl.session().state().await, SessionState::Valid);

    // A new adapter reuses the stored session without logging in again.
    let again = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();
    assert_eq!(again.session().validate().await.unwrap(), SessionState::Valid);
    again.validate_credentials(&DefaultAnswers).await.unwrap();
    assert_eq!(fake.logins().await, 1);
}

#[tokio::test]
async fn test_deleted_session_is_invalid_without_request() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let fl = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();
    fl.session().login().await.unwrap();

    tokio::fs::remove_file(fl.session().cookie_file().path())
        .await
        .unwrap();
    let before = fake.requests().await;

    assert_eq!(fl.session().validate().await.unwrap(), SessionState::Invalid);
    assert_eq!(fake.requests().await, before);
}

#[tokio::test]
async fn test_wrong_password_leaves_no_session() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let mut fl_config = fake.filelist_config();
    fl_config.password = "wrong".into();
    let fl = FileListAdapter::new(&fl_config, &config).unwrap();

    let err = fl.validate_credentials(&DefaultAnswers).await.unwrap_err();

    assert!(matches!(err, UploadError::AuthenticationFailure(_)));
    assert!(!fl.session().cookie_file().exists().await);
}

#[tokio::test]
async fn test_filelist_upload_downloads_site_torrent() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let ctx = fixtures::write_release(temp.path(), fixtures::movie_context()).await;
    let fl = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();

    let result = uploader(&config).upload(&fl, &ctx).await.unwrap();

    match result {
        UploadResult::Success {
            remote_id,
            details_url,
        } => {
            assert_eq!(remote_id, REMOTE_ID);
            assert!(details_url.ends_with("/details.php?id=77&uploaded=1"));
        }
        other => panic!("expected success, got {other:?}"),
    }

    let uploads = fake.uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field("name"), Some(fl.format_name(&ctx).as_str()));
    assert_eq!(uploads[0].field("imdbid"), Some("1234567"));
    assert!(uploads[0].torrent_len > 0);
    assert_eq!(fake.downloads().await, vec!["77".to_string()]);

    let paths = ArtifactPaths::new(temp.path(), &ctx.uuid);
    assert!(paths.tracker_description("FL").exists());
    assert!(paths.tracker_torrent("FL").exists());
}

#[tokio::test]
async fn test_unexpected_response_is_rejected_without_download() {
    let fake = FakeTracker::start().await;
    fake.reject_uploads().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let ctx = fixtures::write_release(temp.path(), fixtures::movie_context()).await;
    let fl = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();

    let result = uploader(&config).upload(&fl, &ctx).await.unwrap();

    match result {
        UploadResult::Rejected(UploadError::UnexpectedResponse {
            url, body, form, ..
        }) => {
            assert!(url.ends_with("/takeupload.php"));
            assert!(body.contains("already uploaded"));
            assert_eq!(form.get("name"), Some(fl.format_name(&ctx).as_str()));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(fake.uploads().await.len(), 1);
    assert!(fake.downloads().await.is_empty());
}

#[tokio::test]
async fn test_filelist_search_lists_existing_titles() {
    let fake = FakeTracker::start().await;
    fake.set_existing(&["Movie.2020.1080p.BluRay.x264-OTHER", "Movie.2020.720p.WEB-DL-GRP"])
        .await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let fl = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();

    let found = uploader(&config)
        .search_duplicates(&fl, &fixtures::movie_context())
        .await;

    assert_eq!(
        found,
        vec![
            "Movie.2020.1080p.BluRay.x264-OTHER".to_string(),
            "Movie.2020.720p.WEB-DL-GRP".to_string()
        ]
    );
}

#[tokio::test]
async fn test_search_timeout_yields_no_duplicates() {
    let fake = FakeTracker::start().await;
    fake.set_existing(&["Movie.2020.1080p.BluRay.x264-OTHER"]).await;
    fake.set_search_delay(Duration::from_secs(3)).await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let fl = FileListAdapter::new(&fake.filelist_config(), &config).unwrap();

    let found = uploader(&config)
        .search_duplicates(&fl, &fixtures::movie_context())
        .await;

    assert!(found.is_empty());
}

#[tokio::test]
async fn test_unmappable_release_makes_no_requests() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let hdb = HdbAdapter::new(&fake.hdb_config(), &config).unwrap();
    let ctx = uploadarr_core::SubmissionContext {
        video_codec: "AV1".into(),
        video_encode: String::new(),
        ..fixtures::movie_context()
    };

    let err = uploader(&config).upload(&hdb, &ctx).await.unwrap_err();

    assert!(matches!(
        err,
        UploadError::MappingUnsupported { slot: "codec", .. }
    ));
    assert_eq!(fake.requests().await, 0);
}

#[tokio::test]
async fn test_hdb_debug_mode_builds_form_only() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    common::write_hdb_cookies(temp.path()).await;
    let ctx = fixtures::write_release(temp.path(), fixtures::movie_context()).await;
    let hdb = HdbAdapter::new(&fake.hdb_config(), &config).unwrap();
    let options = UploadOptions {
        debug: true,
        ..UploadOptions::from(&config)
    };

    let result = uploader(&config)
        .with_options(options)
        .upload(&hdb, &ctx)
        .await
        .unwrap();

    let UploadResult::DryRun(form) = result else {
        panic!("expected a dry run, got {result:?}");
    };
    assert!(form.url.ends_with("/upload/upload"));
    assert_eq!(form.get("category"), Some("1"));
    assert_eq!(form.get("codec"), Some("1"));
    assert_eq!(form.get("medium"), Some("3"));
    assert_eq!(form.get("origin"), Some("0"));
    assert_eq!(
        form.get("imdb"),
        Some("https://www.imdb.com/title/tt1234567/")
    );
    assert!(fake.uploads().await.is_empty());
}

#[tokio::test]
async fn test_hdb_rejects_bad_passkey() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    common::write_hdb_cookies(temp.path()).await;
    let mut hdb_config = fake.hdb_config();
    hdb_config.passkey = "nope".into();
    let hdb = HdbAdapter::new(&hdb_config, &config).unwrap();

    let err = hdb.validate_credentials(&DefaultAnswers).await.unwrap_err();

    assert!(matches!(err, UploadError::AuthenticationFailure(_)));
}

#[tokio::test]
async fn test_hdb_upload_downloads_by_filename() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    common::write_hdb_cookies(temp.path()).await;
    let ctx = fixtures::write_release(temp.path(), fixtures::movie_context()).await;
    let hdb = HdbAdapter::new(&fake.hdb_config(), &config).unwrap();

    let result = uploader(&config).upload(&hdb, &ctx).await.unwrap();

    assert!(result.is_success(), "got {result:?}");
    let uploads = fake.uploads().await;
    assert_eq!(uploads[0].field("name"), Some(hdb.format_name(&ctx).as_str()));
    assert_eq!(fake.downloads().await, vec!["Movie 2020.torrent#77".to_string()]);
}

#[tokio::test]
async fn test_hdb_lookup_torrent_by_id() {
    let fake = FakeTracker::start().await;
    let temp = TempDir::new().unwrap();
    let config = common::config(temp.path());
    let hdb = HdbAdapter::new(&fake.hdb_config(), &config).unwrap();

    let info = hdb.lookup_torrent(REMOTE_ID).await.unwrap().unwrap();

    assert_eq!(info.id, REMOTE_ID);
    assert_eq!(info.filename, "Movie 2020.torrent");
    assert_eq!(info.hash, "AB");
    assert_eq!(info.imdb, 0);
}
