//! Testing utilities: a mock tracker, a scripted prompt and release fixtures.
//!
//! ```rust,ignore
//! use uploadarr_core::testing::{fixtures, MockTracker, ScriptedPrompt};
//!
//! let ctx = fixtures::write_release(temp.path(), fixtures::movie_context()).await;
//! let tracker = MockTracker::new("MCK");
//! let result = uploader.upload(&tracker, &ctx).await?;
//! ```

mod mock_tracker;
mod scripted_prompt;

pub use mock_tracker::MockTracker;
pub use scripted_prompt::ScriptedPrompt;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::context::{ArtifactPaths, Category, ImdbInfo, ReleaseType, SubmissionContext};
    use crate::torrent::{BuildOptions, FilePolicy, HashingTorrentBuilder, TorrentBuilder};

    /// Piece length of fixture base torrents.
    pub const FIXTURE_PIECE_LENGTH: u64 = 16 * 1024;

    /// A 1080p BluRay encode with an IMDb id and no files on disk.
    pub fn movie_context() -> SubmissionContext {
        SubmissionContext {
            uuid: "Movie.2020.1080p.BluRay.DD.5.1.x264-GRP.mkv".to_string(),
            name: "Movie 2020 1080p BluRay DD 5.1 x264-GRP".to_string(),
            title: "Movie".to_string(),
            year: "2020".to_string(),
            category: Category::Movie,
            release_type: ReleaseType::Encode,
            resolution: "1080p".to_string(),
            source: "BluRay".to_string(),
            audio: "DD 5.1".to_string(),
            video_codec: "AVC".to_string(),
            video_encode: "x264".to_string(),
            tag: "-GRP".to_string(),
            genres: "Drama".to_string(),
            imdb_id: 1234567,
            imdb_info: Some(ImdbInfo {
                aka: String::new(),
                year: "2020".to_string(),
                genres: "Drama".to_string(),
            }),
            ..Default::default()
        }
    }

    /// A single episode of a web series.
    pub fn episode_context() -> SubmissionContext {
        SubmissionContext {
            uuid: "Show.S01E02.1080p.AMZN.WEB-DL.DDP5.1.H.264-GRP.mkv".to_string(),
            name: "Show S01E02 1080p AMZN WEB-DL DDP 5.1 H.264-GRP".to_string(),
            title: "Show".to_string(),
            year: "2021".to_string(),
            category: Category::Tv,
            release_type: ReleaseType::WebDl,
            resolution: "1080p".to_string(),
            source: "Web".to_string(),
            service: "AMZN".to_string(),
            service_longname: "Amazon Prime Video".to_string(),
            audio: "DDP 5.1".to_string(),
            video_codec: "H.264".to_string(),
            tag: "-GRP".to_string(),
            season: 1,
            episode: 2,
            tvdb_id: 7654321,
            ..Default::default()
        }
    }

    /// Write the release's video file and the shared artifacts
    /// (`BASE.torrent`, `DESCRIPTION.txt`) under `base_dir`, returning the
    /// context pointing at them.
    pub async fn write_release(base_dir: &Path, ctx: SubmissionContext) -> SubmissionContext {
        let content = base_dir.join("content");
        tokio::fs::create_dir_all(&content)
            .await
            .expect("create content dir");
        let video = content.join(&ctx.uuid);
        tokio::fs::write(&video, vec![7u8; 40 * 1024])
            .await
            .expect("write video");

        let paths = ArtifactPaths::new(base_dir, &ctx.uuid);
        tokio::fs::create_dir_all(paths.dir())
            .await
            .expect("create artifact dir");

        let options = BuildOptions {
            name: None,
            piece_length: FIXTURE_PIECE_LENGTH,
            announce: "https://example.invalid/announce".to_string(),
            source: None,
            comment: None,
            created_by: "uploadarr".to_string(),
            private: true,
            policy: FilePolicy::everything(),
        };
        let torrent = HashingTorrentBuilder
            .build(&video, &options)
            .await
            .expect("build base torrent");
        tokio::fs::write(paths.base_torrent(), torrent)
            .await
            .expect("write base torrent");
        tokio::fs::write(paths.base_description(), "A [b]fine[/b] release.\n")
            .await
            .expect("write base description");

        let filename = ctx.uuid.trim_end_matches(".mkv").to_string();
        SubmissionContext {
            path: video.clone(),
            video: video.clone(),
            filelist: vec![video],
            filename,
            ..ctx
        }
    }
}
