use super::SubmissionContext;

/// Which track types carry a given language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionalTracks {
    pub audio: bool,
    pub subtitles: bool,
}

/// Detect audio/subtitle tracks in a language.
///
/// File releases are checked through MediaInfo (`code`, e.g. `ro`); BDMV
/// releases through the BDInfo report (`name`, e.g. `Romanian`).
pub fn regional_tracks(ctx: &SubmissionContext, code: &str, name: &str) -> RegionalTracks {
    let mut found = RegionalTracks::default();

    if ctx.is_bdmv() {
        if let Some(bdinfo) = &ctx.bdinfo {
            found.subtitles = bdinfo.subtitles.iter().any(|s| s == name);
            found.audio = bdinfo.audio.iter().any(|a| a.language == name);
        }
        return found;
    }

    let Some(mediainfo) = &ctx.mediainfo else {
        return found;
    };
    for track in &mediainfo.media.tracks {
        let matches = track.language.as_deref() == Some(code);
        match track.kind.as_str() {
            "Text" if matches => found.subtitles = true,
            "Audio" if matches => found.audio = true,
            _ => {}
        }
    }
    found
}
