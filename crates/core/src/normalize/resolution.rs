//! Cascading resolution normalization.
//!
//! Raw tokens come from MediaInfo in several shapes (`1920x1080p`, `1080p`,
//! odd widths from cropped encodes). They are resolved to one label of
//! [`CANONICAL_RESOLUTIONS`] by:
//!
//! 1. exact lookup in the primary table;
//! 2. the anomalous-height override (540 lines is always `OTHER`);
//! 3. the external guess, if any;
//! 4. the width fallback table keyed by `{width}{scan}`;
//!
//! and re-entering step 1 with the fallback result. Re-entry is a bounded
//! loop: a candidate seen before, or running out of hops, resolves to `OTHER`.

use tracing::debug;

use crate::mapping::MappingTable;

/// Catch-all label.
pub const OTHER: &str = "OTHER";

/// Pixel height that is never mapped to a standard label.
pub const ANOMALOUS_HEIGHT: u32 = 540;

/// Upper bound on fallback re-entries.
pub const MAX_RESOLUTION_HOPS: usize = 4;

/// Every label [`normalize_resolution`] can return.
pub const CANONICAL_RESOLUTIONS: &[&str] = &[
    "8640p", "4320p", "2160p", "1440p", "1080p", "1080i", "720p", "576p", "576i", "480p",
    "480i", OTHER,
];

static PRIMARY: MappingTable<&'static str> = MappingTable::new(&[
    ("3840x2160p", "2160p"),
    ("2160p", "2160p"),
    ("2560x1440p", "1440p"),
    ("1440p", "1440p"),
    ("1920x1080p", "1080p"),
    ("1080p", "1080p"),
    ("1920x1080i", "1080i"),
    ("1080i", "1080i"),
    ("1280x720p", "720p"),
    ("720p", "720p"),
    ("1280x540p", "720p"),
    ("1280x576p", "720p"),
    ("1024x576p", "576p"),
    ("576p", "576p"),
    ("1024x576i", "576i"),
    ("576i", "576i"),
    ("854x480p", "480p"),
    ("480p", "480p"),
    ("854x480i", "480i"),
    ("480i", "480i"),
    ("720x576p", "576p"),
    ("720x576i", "576i"),
    ("720x480p", "480p"),
    ("720x480i", "480i"),
    ("15360x8640p", "8640p"),
    ("8640p", "8640p"),
    ("7680x4320p", "4320p"),
    ("4320p", "4320p"),
    (OTHER, OTHER),
]);

static WIDTH_FALLBACK: MappingTable<&'static str> = MappingTable::new(&[
    ("3840p", "2160p"),
    ("2560p", "1550p"),
    ("1920p", "1080p"),
    ("1920i", "1080i"),
    ("1280p", "720p"),
    ("1024p", "576p"),
    ("1024i", "576i"),
    ("854p", "480p"),
    ("854i", "480i"),
    ("720p", "576p"),
    ("720i", "576i"),
    ("15360p", "4320p"),
    ("OTHERp", OTHER),
]);

/// Raw resolution attributes of the main video track.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionInput<'a> {
    /// Token as reported by MediaInfo, e.g. `1920x1080p`.
    pub raw: &'a str,
    /// Screen-size guess parsed from the file name.
    pub guess: Option<&'a str>,
    pub width: u32,
    /// `p` or `i`.
    pub scan: &'a str,
    pub height: u32,
    /// Exact stored height, before any rounding.
    pub actual_height: u32,
}

/// Where the next candidate comes from when the current one is not canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Guess,
    WidthScan,
}

/// Fallback strategies in priority order.
pub const FALLBACKS: &[Fallback] = &[Fallback::Guess, Fallback::WidthScan];

impl Fallback {
    fn next(self, input: &ResolutionInput<'_>) -> Option<String> {
        match self {
            Self::Guess => input.guess.filter(|g| !g.is_empty()).map(str::to_string),
            Self::WidthScan => {
                let key = format!("{}{}", input.width, input.scan);
                Some(WIDTH_FALLBACK.get(&key).unwrap_or(OTHER).to_string())
            }
        }
    }
}

/// Resolve raw resolution attributes to a label of [`CANONICAL_RESOLUTIONS`].
pub fn normalize_resolution(input: &ResolutionInput<'_>) -> &'static str {
    if input.actual_height == ANOMALOUS_HEIGHT {
        return OTHER;
    }

    let mut candidate = input.raw.to_string();
    let mut seen: Vec<String> = Vec::with_capacity(MAX_RESOLUTION_HOPS);

    for _ in 0..=MAX_RESOLUTION_HOPS {
        if let Some(label) = PRIMARY.get(&candidate) {
            return label;
        }
        seen.push(candidate);

        let Some(next) = FALLBACKS.iter().find_map(|f| f.next(input)) else {
            break;
        };
        if seen.contains(&next) {
            debug!(candidate = %next, "Resolution fallback made no progress");
            break;
        }
        candidate = next;
    }

    OTHER
}
