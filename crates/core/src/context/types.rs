//! The per-release record every tracker adapter reads from.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level content category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[default]
    Movie,
    Tv,
}

/// How the release was sourced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseType {
    Disc,
    Remux,
    #[default]
    Encode,
    WebDl,
    WebRip,
    Hdtv,
}

impl ReleaseType {
    /// Releases whose audio token is written without a space (`DD+5.1`).
    pub fn is_compact_audio(self) -> bool {
        matches!(self, Self::WebDl | Self::WebRip | Self::Encode)
    }
}

/// Disc image layout, when the release is a full disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscKind {
    #[serde(rename = "BDMV")]
    Bdmv,
    #[serde(rename = "DVD")]
    Dvd,
    #[serde(rename = "HD DVD")]
    HdDvd,
}

/// Metadata fetched from IMDb by the collaborator that built the context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImdbInfo {
    pub aka: String,
    pub year: String,
    pub genres: String,
}

/// One disc of a disc release, in disc-index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscReport {
    #[serde(rename = "type")]
    pub kind: DiscKind,
    #[serde(default)]
    pub name: String,
    /// BDInfo summary text (BDMV).
    #[serde(default)]
    pub summary: String,
    /// MediaInfo dump of the main VOB (DVD).
    #[serde(default)]
    pub vob_mi: String,
    /// MediaInfo dump of the main IFO (DVD).
    #[serde(default)]
    pub ifo_mi: String,
}

/// Parsed BDInfo of the first disc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BdInfo {
    pub subtitles: Vec<String>,
    pub audio: Vec<BdAudioTrack>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BdAudioTrack {
    pub language: String,
    pub codec: String,
}

/// MediaInfo JSON (`media.track[]`), as produced by the media-info collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub media: MediaSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSection {
    #[serde(default, rename = "track")]
    pub tracks: Vec<MediaTrack>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(default, rename = "Language", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// An already hosted screenshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLink {
    pub img_url: String,
    pub web_url: String,
    pub raw_url: String,
}

/// Everything known about one release, fixed for the duration of an upload.
///
/// External identifiers use `0` for "absent"; read them through
/// [`SubmissionContext::imdb`] and [`SubmissionContext::tvdb`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionContext {
    /// Release identifier; names the `tmp/<uuid>/` artifact directory.
    pub uuid: String,
    /// Canonical release name before tracker-specific formatting.
    pub name: String,
    pub title: String,
    pub year: String,
    pub aka: String,
    pub category: Category,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    #[serde(rename = "is_disc")]
    pub disc: Option<DiscKind>,
    pub resolution: String,
    pub sd: bool,
    pub source: String,
    pub service: String,
    pub service_longname: String,
    pub distributor: String,
    pub edition: String,
    pub audio: String,
    pub video_codec: String,
    pub video_encode: String,
    pub hdr: String,
    pub tag: String,
    pub genres: String,
    pub keywords: String,
    pub anime: bool,
    pub tv_pack: bool,
    pub season: u32,
    pub episode: u32,
    pub imdb_id: u64,
    pub tvdb_id: u64,
    pub imdb_info: Option<ImdbInfo>,
    pub discs: Vec<DiscReport>,
    pub bdinfo: Option<BdInfo>,
    pub mediainfo: Option<MediaInfo>,
    pub image_list: Vec<ImageLink>,
    /// Number of screenshots taken.
    pub screens: usize,
    /// Release root (file or folder).
    pub path: PathBuf,
    /// Main video file.
    pub video: PathBuf,
    /// Every content file of the release.
    pub filelist: Vec<PathBuf>,
    /// Base name used for screenshot files.
    pub filename: String,
    pub is_dir: bool,
    pub personal_release: bool,
    pub freeleech: bool,
    pub has_encode_settings: bool,
    /// User-supplied description. Its text already lives in the base
    /// description file; adapters only check whether one was given, e.g. to
    /// skip HDB's web-source header.
    pub description: Option<String>,
}

impl SubmissionContext {
    /// IMDb id, `None` when absent.
    pub fn imdb(&self) -> Option<u64> {
        non_zero(self.imdb_id)
    }

    /// TVDB id, `None` when absent.
    pub fn tvdb(&self) -> Option<u64> {
        non_zero(self.tvdb_id)
    }

    /// IMDb id as `tt0000000`.
    pub fn imdb_tt(&self) -> Option<String> {
        self.imdb().map(|id| format!("tt{id:07}"))
    }

    pub fn is_bdmv(&self) -> bool {
        self.disc == Some(DiscKind::Bdmv)
    }

    pub fn is_dvd(&self) -> bool {
        self.disc == Some(DiscKind::Dvd)
    }

    /// `true` for a single TV episode (not a season pack).
    pub fn is_tv_single(&self) -> bool {
        self.category == Category::Tv && !self.tv_pack
    }
}

fn non_zero(id: u64) -> Option<u64> {
    (id != 0).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ids_are_absent() {
        let ctx = SubmissionContext::default();
        assert_eq!(ctx.imdb(), None);
        assert_eq!(ctx.tvdb(), None);
        assert_eq!(ctx.imdb_tt(), None);
    }

    #[test]
    fn test_imdb_tt_is_zero_padded() {
        let ctx = SubmissionContext {
            imdb_id: 133093,
            ..Default::default()
        };
        assert_eq!(ctx.imdb_tt().as_deref(), Some("tt0133093"));
    }

    #[test]
    fn test_deserialize_context_json() {
        let json = r#"{
            "uuid": "Movie.2020.1080p.BluRay.x264-GRP.mkv",
            "name": "Movie 2020 1080p BluRay DD+ 5.1 x264-GRP",
            "category": "MOVIE",
            "type": "WEBDL",
            "is_disc": "BDMV",
            "imdb_id": 0,
            "mediainfo": {"media": {"track": [
                {"@type": "General"},
                {"@type": "Text", "Language": "ro"}
            ]}},
            "discs": [{"type": "BDMV", "name": "DISC1", "summary": "Disc Title: X"}]
        }"#;
        let ctx: SubmissionContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.category, Category::Movie);
        assert_eq!(ctx.release_type, ReleaseType::WebDl);
        assert!(ctx.is_bdmv());
        assert_eq!(ctx.discs[0].kind, DiscKind::Bdmv);
        assert_eq!(ctx.imdb(), None);
        let tracks = &ctx.mediainfo.unwrap().media.tracks;
        assert_eq!(tracks[1].language.as_deref(), Some("ro"));
    }

    #[test]
    fn test_hd_dvd_disc_name() {
        let kind: DiscKind = serde_json::from_str("\"HD DVD\"").unwrap();
        assert_eq!(kind, DiscKind::HdDvd);
    }
}
