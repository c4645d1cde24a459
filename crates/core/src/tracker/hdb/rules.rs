//! HDBits taxonomy and naming.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::context::{Category, DiscKind, ReleaseType, SubmissionContext};
use crate::mapping::{Mapped, MappingTable};
use crate::naming::{NamePipeline, Rewrite};

pub static CODECS: MappingTable<u32> = MappingTable::new(&[
    ("AVC", 1),
    ("H.264", 1),
    ("MPEG-2", 2),
    ("VC-1", 3),
    ("XviD", 4),
    ("HEVC", 5),
    ("H.265", 5),
    ("VP9", 6),
]);

pub static RESOLUTIONS: MappingTable<u32> = MappingTable::new(&[
    ("8640p", 10),
    ("4320p", 1),
    ("2160p", 2),
    ("1440p", 3),
    ("1080p", 3),
    ("1080i", 4),
    ("720p", 5),
    ("576p", 6),
    ("576i", 7),
    ("480p", 8),
    ("480i", 9),
]);

/// Rank for resolutions the site does not list.
pub const RESOLUTION_OTHER: u32 = 10;

pub static SERVICES: MappingTable<u32> = MappingTable::new(&[
    ("AMZN", 28),
    ("NF", 29),
    ("HULU", 34),
    ("DSNP", 33),
    ("HMAX", 30),
    ("ATVP", 27),
    ("iT", 38),
    ("iP", 56),
    ("STAN", 32),
    ("PCOK", 31),
    ("CR", 72),
    ("PMTP", 69),
    ("MA", 77),
    ("SHO", 76),
    ("BCORE", 66),
    ("CORE", 66),
    ("CRKL", 73),
    ("FUNI", 74),
    ("HLMK", 71),
    ("HTSR", 79),
    ("CRAV", 80),
    ("MAX", 88),
]);

pub static DISTRIBUTORS: MappingTable<u32> = MappingTable::new(&[
    ("WARNER ARCHIVE", 68),
    ("WARNER ARCHIVE COLLECTION", 68),
    ("WAC", 68),
    ("CRITERION", 18),
    ("CRITERION COLLECTION", 18),
    ("CC", 18),
    ("MASTERS OF CINEMA", 19),
    ("MOC", 19),
    ("KINO LORBER", 55),
    ("KINO", 55),
    ("BFI VIDEO", 63),
    ("BFI", 63),
    ("BRITISH FILM INSTITUTE", 63),
    ("STUDIO CANAL", 65),
    ("ARROW", 64),
]);

pub const TAG_IMAX: u32 = 14;
pub const TAG_OPEN_MATTE: u32 = 58;
pub const TAG_DTSX: u32 = 7;
pub const TAG_ATMOS: u32 = 5;
pub const TAG_HDR10: u32 = 9;
pub const TAG_HDR10_PLUS: u32 = 25;
pub const TAG_DV: u32 = 6;
pub const TAG_HLG: u32 = 10;

static BARE_HDR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bHDR\b").expect("valid regex"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-ZÀ-ÿ. :&+'\-\[\]]+").expect("valid regex"));

/// Movie 1, TV 2, Documentary 3.
pub fn category_id(ctx: &SubmissionContext) -> Mapped<u32> {
    let documentary = ctx.genres.to_lowercase().contains("documentary")
        || ctx.keywords.to_lowercase().contains("documentary");

    Mapped::Unsupported
        .override_if(ctx.category == Category::Movie, 1)
        .override_if(ctx.category == Category::Tv, 2)
        .override_if(documentary, 3)
}

pub fn codec_id(ctx: &SubmissionContext) -> Mapped<u32> {
    let codec = if ctx.video_codec.is_empty() {
        &ctx.video_encode
    } else {
        &ctx.video_codec
    };
    CODECS.lookup(codec)
}

/// Blu-ray/HD DVD 1, Encode 3, Capture 4, Remux 5, WEB-DL 6.
pub fn medium_id(ctx: &SubmissionContext) -> Mapped<u32> {
    let kind = ctx.release_type;
    Mapped::Unsupported
        .override_if(
            matches!(ctx.disc, Some(DiscKind::Bdmv | DiscKind::HdDvd)),
            1,
        )
        .override_if(
            kind == ReleaseType::Hdtv,
            if ctx.has_encode_settings { 3 } else { 4 },
        )
        .override_if(matches!(kind, ReleaseType::Encode | ReleaseType::WebRip), 3)
        .override_if(kind == ReleaseType::Remux, 5)
        .override_if(kind == ReleaseType::WebDl, 6)
}

pub fn resolution_id(resolution: &str) -> u32 {
    RESOLUTIONS.lookup_or(resolution, RESOLUTION_OTHER)
}

/// Union of every independent tag check.
pub fn tag_ids(ctx: &SubmissionContext) -> BTreeSet<u32> {
    let mut tags = BTreeSet::new();

    tags.extend(SERVICES.get(&ctx.service));
    tags.extend(DISTRIBUTORS.get(&ctx.distributor));

    if ctx.edition.contains("IMAX") {
        tags.insert(TAG_IMAX);
    }
    if ctx.edition.to_uppercase().contains("OPEN MATTE") {
        tags.insert(TAG_OPEN_MATTE);
    }
    if ctx.audio.contains("DTS:X") {
        tags.insert(TAG_DTSX);
    }
    if ctx.audio.contains("Atmos") {
        tags.insert(TAG_ATMOS);
    }
    if ctx.hdr.contains("HDR") {
        tags.insert(if ctx.hdr.contains("HDR10+") {
            TAG_HDR10_PLUS
        } else {
            TAG_HDR10
        });
    }
    if ctx.hdr.contains("DV") {
        tags.insert(TAG_DV);
    }
    if ctx.hdr.contains("HLG") {
        tags.insert(TAG_HLG);
    }
    tags
}

/// Dual-Audio encodes are only accepted for anime and discs.
pub fn dual_audio_allowed(ctx: &SubmissionContext) -> bool {
    !ctx.audio.contains("Dual-Audio") || ctx.anime || ctx.disc.is_some()
}

pub fn name_pipeline(ctx: &SubmissionContext) -> NamePipeline {
    let audio = ctx.audio.as_str();
    let web_service = ctx.source.eq_ignore_ascii_case("WEB") && !ctx.service.trim().is_empty();
    let short_audio = if ctx.release_type.is_compact_audio() {
        audio.replacen(' ', "", 1).replace("Atmos", "")
    } else {
        audio.replace("Atmos", "")
    };

    let mut pipeline = NamePipeline::new()
        .step(Rewrite::replace("H.265", "HEVC"))
        .step_if(
            web_service,
            Rewrite::replace_first(format!("{} ", ctx.service), ""),
        )
        .step_if(ctx.hdr.contains("DV"), Rewrite::replace(" DV ", " DoVi "))
        .step_if(
            ctx.hdr.contains("HDR") && !ctx.hdr.contains("HDR10+"),
            Rewrite::regex(&BARE_HDR, "HDR10"),
        )
        .step(Rewrite::replace(audio, short_audio))
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
        .step(Rewrite::replace("PQ10", "HDR"))
        .step(Rewrite::remove("Dubbed"))
        .step(Rewrite::remove("Dual-Audio"))
        .step(Rewrite::replace("REMUX", "Remux"))
        .step(Rewrite::CollapseWhitespace)
        .step(Rewrite::RestrictCharset(DISALLOWED.clone()))
        .step(Rewrite::replace(" .", "."))
        .step(Rewrite::replace("..", "."))
}

pub fn format_name(ctx: &SubmissionContext) -> String {
    name_pipeline(ctx).format(&ctx.name)
}
