//! FileList taxonomy and naming.

use std::path::Path;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::context::{regional_tracks, Category, DiscKind, ReleaseType, SubmissionContext};
use crate::naming::{ascii_fold, NamePipeline, Rewrite};

pub const MOVIE_SD: u32 = 1;
pub const DVD: u32 = 2;
pub const DVD_RO: u32 = 3;
pub const MOVIE_HD: u32 = 4;
pub const MOVIE_4K: u32 = 6;
pub const MOVIE_RO: u32 = 19;
pub const BLURAY: u32 = 20;
pub const TV_HD: u32 = 21;
pub const TV_SD: u32 = 23;
pub const ANIME: u32 = 24;
pub const BLURAY_4K: u32 = 26;
pub const TV_4K: u32 = 27;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-ZÀ-ÿ. &+'\-\[\]]+").expect("valid regex"));

/// Category id. Later rules override earlier ones; every release gets one.
pub fn category_id(ctx: &SubmissionContext) -> u32 {
    let ro = regional_tracks(ctx, "ro", "Romanian");
    let uhd = ctx.resolution == "2160p";

    let mut id = match ctx.category {
        Category::Movie => {
            let mut id = MOVIE_HD;
            if ctx.is_bdmv() || ctx.release_type == ReleaseType::Remux {
                id = if uhd { BLURAY_4K } else { BLURAY };
            } else if uhd {
                id = MOVIE_4K;
            } else if ctx.sd {
                id = MOVIE_SD;
            }
            if ro.subtitles && !ctx.sd && !uhd {
                id = MOVIE_RO;
            }
            id
        }
        Category::Tv => {
            if uhd {
                TV_4K
            } else if ctx.sd {
                TV_SD
            } else {
                TV_HD
            }
        }
    };

    if ctx.disc == Some(DiscKind::Dvd) {
        id = if ro.subtitles { DVD_RO } else { DVD };
    }
    if ctx.anime {
        id = ANIME;
    }
    id
}

/// Dotted, charset-restricted title.
pub fn name_pipeline(ctx: &SubmissionContext) -> NamePipeline {
    let audio = ctx.audio.as_str();
    let mut pipeline = NamePipeline::new()
        .step_if(ctx.hdr.contains("DV"), Rewrite::replace(" DV ", " DoVi "))
        .step_if(
            ctx.release_type.is_compact_audio(),
            Rewrite::replace(audio, audio.replacen(' ', "", 1)),
        )
        .step(Rewrite::remove(ctx.aka.as_str()));

    if let Some(info) = &ctx.imdb_info {
        if !info.aka.is_empty() {
            pipeline = pipeline.step(Rewrite::replace_once(ctx.title.as_str(), info.aka.as_str()));
        }
        let year = ctx.year.trim();
        if !year.is_empty() && !info.year.is_empty() && info.year != year {
            pipeline = pipeline.step(Rewrite::replace(year, info.year.as_str()));
        }
    }

    pipeline
        .step_if(
            audio.contains("DD+") && ctx.uuid.contains("DDP"),
            Rewrite::replace("DD+", "DDP"),
        )
        .step_if(
            audio.contains("Atmos") && !ctx.uuid.contains("Atmos"),
            Rewrite::remove("Atmos"),
        )
        .step(Rewrite::replace("BluRay REMUX", "Remux"))
        .step(Rewrite::replace("BluRay Remux", "Remux"))
        .step(Rewrite::replace("Bluray Remux", "Remux"))
        .step(Rewrite::replace("PQ10", "HDR"))
        .step(Rewrite::replace("HDR10+", "HDR"))
        .step(Rewrite::replace("DoVi HDR HEVC", "HEVC DoVi HDR"))
        .step(Rewrite::replace("HDR HEVC", "HEVC HDR"))
        .step(Rewrite::replace("DoVi HEVC", "HEVC DoVi"))
        .step(Rewrite::replace("DTS7.1", "DTS"))
        .step(Rewrite::replace("DTS5.1", "DTS"))
        .step(Rewrite::replace("DTS2.0", "DTS"))
        .step(Rewrite::replace("DTS1.0", "DTS"))
        .step(Rewrite::remove("Dubbed"))
        .step(Rewrite::remove("Dual-Audio"))
        .step(Rewrite::CollapseWhitespace)
        .step(Rewrite::RestrictCharset(DISALLOWED.clone()))
        .step(Rewrite::replace(" ", "."))
        .step(Rewrite::replace("..", "."))
}

pub fn format_name(ctx: &SubmissionContext) -> String {
    name_pipeline(ctx).format(&ctx.name)
}

/// Free leech for discs, remuxes, season packs and explicit requests.
pub fn is_freeleech(ctx: &SubmissionContext) -> bool {
    ctx.is_bdmv() || ctx.release_type == ReleaseType::Remux || ctx.tv_pack || ctx.freeleech
}

/// Torrent file name (without `.torrent`).
///
/// The release identifier, minus its extension for single files. SubsPlease
/// anime use the formatted name because their file names do not describe
/// the release.
pub fn torrent_stem(ctx: &SubmissionContext, name: &str) -> String {
    let stem = if ctx.anime && ctx.tag == "-SubsPlease" {
        name.to_string()
    } else if ctx.is_dir {
        ctx.uuid.clone()
    } else {
        Path::new(&ctx.uuid)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| ctx.uuid.clone())
    };
    ascii_fold(&stem)
}

/// Colour the section titles of an extended BD summary and insert the
/// description body after its first block.
pub fn wrap_bd_summary(summary: &str, body: &str) -> String {
    let mut out = summary.replacen("[/pre][/quote]", &format!("[/pre][/quote]\n\n{body}\n"), 1);
    out = out.replace(
        "DISC INFO:",
        "[pre][quote=BD_Info][b][color=#FF0000]DISC INFO:[/color][/b]",
    );
    for section in ["PLAYLIST REPORT:", "VIDEO:", "AUDIO:", "SUBTITLES:"] {
        out = out.replace(section, &format!("[b][color=#FF0000]{section}[/color][/b]"));
    }
    out.push_str("[/pre][/quote]\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BdAudioTrack, BdInfo, ImdbInfo, MediaInfo, MediaSection, MediaTrack};

    fn movie(resolution: &str) -> SubmissionContext {
        SubmissionContext {
            category: Category::Movie,
            resolution: resolution.into(),
            ..Default::default()
        }
    }

    fn with_ro_subs(mut ctx: SubmissionContext) -> SubmissionContext {
        ctx.mediainfo = Some(MediaInfo {
            media: MediaSection {
                tracks: vec![MediaTrack {
                    kind: "Text".into(),
                    language: Some("ro".into()),
                }],
            },
        });
        ctx
    }

    #[test]
    fn test_movie_categories() {
        assert_eq!(category_id(&movie("1080p")), MOVIE_HD);
        assert_eq!(category_id(&movie("2160p")), MOVIE_4K);

        let sd = SubmissionContext { sd: true, ..movie("480p") };
        assert_eq!(category_id(&sd), MOVIE_SD);

        let remux = SubmissionContext {
            release_type: ReleaseType::Remux,
            ..movie("1080p")
        };
        assert_eq!(category_id(&remux), BLURAY);
    }

    #[test]
    fn test_bdmv_2160p_overrides_hd_movie() {
        let ctx = SubmissionContext {
            disc: Some(DiscKind::Bdmv),
            release_type: ReleaseType::Disc,
            ..movie("2160p")
        };
        assert_eq!(category_id(&ctx), BLURAY_4K);
    }

    #[test]
    fn test_romanian_subtitles() {
        assert_eq!(category_id(&with_ro_subs(movie("1080p"))), MOVIE_RO);
        assert_eq!(category_id(&with_ro_subs(movie("2160p"))), MOVIE_4K);

        let dvd = SubmissionContext {
            disc: Some(DiscKind::Dvd),
            ..movie("480p")
        };
        assert_eq!(category_id(&dvd), DVD);
        assert_eq!(category_id(&with_ro_subs(dvd)), DVD_RO);
    }

    #[test]
    fn test_bdmv_romanian_from_bdinfo() {
        let ctx = SubmissionContext {
            disc: Some(DiscKind::Bdmv),
            bdinfo: Some(BdInfo {
                subtitles: vec!["Romanian".into()],
                audio: vec![BdAudioTrack {
                    language: "English".into(),
                    codec: "DTS-HD MA".into(),
                }],
            }),
            ..movie("1080p")
        };
        assert_eq!(category_id(&ctx), MOVIE_RO);
    }

    #[test]
    fn test_tv_and_anime() {
        let tv = SubmissionContext {
            category: Category::Tv,
            resolution: "1080p".into(),
            ..Default::default()
        };
        assert_eq!(category_id(&tv), TV_HD);
        let uhd = SubmissionContext {
            resolution: "2160p".into(),
            ..tv.clone()
        };
        assert_eq!(category_id(&uhd), TV_4K);
        let anime = SubmissionContext { anime: true, ..tv };
        assert_eq!(category_id(&anime), ANIME);
    }

    fn web_release() -> SubmissionContext {
        SubmissionContext {
            name: "Amélie 2001 1080p AMZN WEB-DL DD+ 5.1 Atmos DV HDR H.265-GRP".into(),
            uuid: "Amelie.2001.1080p.AMZN.WEB-DL.DDP5.1.H.265-GRP.mkv".into(),
            title: "Amélie".into(),
            year: "2001".into(),
            audio: "DD+ 5.1 Atmos".into(),
            hdr: "DV HDR".into(),
            release_type: ReleaseType::WebDl,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_name() {
        assert_eq!(
            format_name(&web_release()),
            "Amélie.2001.1080p.AMZN.WEB-DL.DDP5.1.DoVi.HDR.H.265-GRP"
        );
    }

    #[test]
    fn test_format_name_is_idempotent() {
        let ctx = SubmissionContext {
            name: "Movie AKA Film 2019 2160p BluRay REMUX DoVi HDR HEVC Dual-Audio DTS5.1-GRP"
                .into(),
            title: "Movie".into(),
            aka: "AKA Film".into(),
            year: "2019".into(),
            imdb_info: Some(ImdbInfo {
                aka: "Movie Deluxe".into(),
                year: "2020".into(),
                genres: String::new(),
            }),
            release_type: ReleaseType::Remux,
            ..Default::default()
        };
        let once = format_name(&ctx);
        assert_eq!(once, "Movie.Deluxe.2020.2160p.Remux.HEVC.DoVi.HDR.DTS-GRP");
        let again = SubmissionContext {
            name: once.clone(),
            ..ctx
        };
        assert_eq!(format_name(&again), once);
    }

    #[test]
    fn test_aka_with_stripped_punctuation_is_idempotent() {
        let ctx = SubmissionContext {
            name: "Léon 1994 1080p BluRay x264-GRP".into(),
            title: "Léon".into(),
            year: "1994".into(),
            imdb_info: Some(ImdbInfo {
                aka: "Léon: The Professional".into(),
                year: "1994".into(),
                genres: String::new(),
            }),
            ..Default::default()
        };
        let once = format_name(&ctx);
        assert_eq!(once, "Léon.The.Professional.1994.1080p.BluRay.x264-GRP");
        let again = SubmissionContext {
            name: once.clone(),
            ..ctx
        };
        assert_eq!(format_name(&again), once);
    }

    #[test]
    fn test_torrent_stem() {
        let file = SubmissionContext {
            uuid: "Movie.2020.1080p.mkv".into(),
            ..Default::default()
        };
        assert_eq!(torrent_stem(&file, "ignored"), "Movie.2020.1080p");

        let dir = SubmissionContext {
            uuid: "Show.S01.1080p".into(),
            is_dir: true,
            ..Default::default()
        };
        assert_eq!(torrent_stem(&dir, "ignored"), "Show.S01.1080p");

        let subsplease = SubmissionContext {
            uuid: "[SubsPlease] Show - 01 (1080p) [ABCD].mkv".into(),
            anime: true,
            tag: "-SubsPlease".into(),
            ..Default::default()
        };
        assert_eq!(torrent_stem(&subsplease, "Show.S01E01.1080p"), "Show.S01E01.1080p");
    }

    #[test]
    fn test_freeleech() {
        assert!(!is_freeleech(&movie("1080p")));
        assert!(is_freeleech(&SubmissionContext {
            tv_pack: true,
            ..Default::default()
        }));
        assert!(is_freeleech(&SubmissionContext {
            release_type: ReleaseType::Remux,
            ..Default::default()
        }));
    }

    #[test]
    fn test_wrap_bd_summary() {
        let summary = "DISC INFO:\nTitle\n[/pre][/quote]VIDEO:\nAVC";
        let wrapped = wrap_bd_summary(summary, "Notes");
        assert!(wrapped.starts_with("[pre][quote=BD_Info][b][color=#FF0000]DISC INFO:[/color][/b]"));
        assert!(wrapped.contains("[/pre][/quote]\n\nNotes\n"));
        assert!(wrapped.contains("[b][color=#FF0000]VIDEO:[/color][/b]"));
        assert!(wrapped.ends_with("[/pre][/quote]\n"));
    }
}
