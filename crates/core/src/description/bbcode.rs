//! BBCode normalization applied to the shared base description.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

/// Text-to-text markup transform.
pub trait MarkupNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

/// What to do with `[spoiler]` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoilerMode {
    Keep,
    /// Drop the tags, keep the content.
    Remove,
    /// Rename to `[hide]`.
    Hide,
}

static CODE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[code\]").expect("valid regex"));
static CODE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[/code\]").expect("valid regex"));
static SPOILER_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[spoiler(=[^\]]*)?\]").expect("valid regex"));
static SPOILER_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[/spoiler\]").expect("valid regex"));
static COMPARISON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\[comparison=([^\]]*)\](.*?)\[/comparison\]").expect("valid regex"));
static SIZED_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[img=\d+\]").expect("valid regex"));

/// Configurable BBCode cleanup.
#[derive(Debug, Clone)]
pub struct BbcodeNormalizer {
    pub spoilers: SpoilerMode,
    pub code_to_quote: bool,
    /// Width of images inside converted `[comparison]` blocks.
    pub comparison_width: Option<u32>,
    /// Rewrite `[img=N]` to plain `[img]`.
    pub canonical_img: bool,
}

impl Default for BbcodeNormalizer {
    fn default() -> Self {
        Self {
            spoilers: SpoilerMode::Keep,
            code_to_quote: true,
            comparison_width: None,
            canonical_img: true,
        }
    }
}

impl BbcodeNormalizer {
    fn convert_spoilers(&self, text: String) -> String {
        match self.spoilers {
            SpoilerMode::Keep => text,
            SpoilerMode::Remove => {
                let text = SPOILER_OPEN.replace_all(&text, "");
                SPOILER_CLOSE.replace_all(&text, "").into_owned()
            }
            SpoilerMode::Hide => {
                let text = SPOILER_OPEN.replace_all(&text, |caps: &Captures<'_>| {
                    format!("[hide{}]", caps.get(1).map_or("", |m| m.as_str()))
                });
                SPOILER_CLOSE.replace_all(&text, "[/hide]").into_owned()
            }
        }
    }

    fn convert_comparisons(&self, text: String, width: u32) -> String {
        COMPARISON
            .replace_all(&text, |caps: &Captures<'_>| {
                let labels: Vec<&str> = caps[1].split(',').map(str::trim).collect();
                let images: Vec<String> = caps[2]
                    .split_whitespace()
                    .map(|url| format!("[img={width}]{url}[/img]"))
                    .collect();
                format!("[center]{}\n{}[/center]", labels.join(" | "), images.join(" "))
            })
            .into_owned()
    }
}

impl MarkupNormalizer for BbcodeNormalizer {
    fn normalize(&self, text: &str) -> String {
        let mut out = text.to_string();
        if self.code_to_quote {
            out = CODE_OPEN.replace_all(&out, "[quote]").into_owned();
            out = CODE_CLOSE.replace_all(&out, "[/quote]").into_owned();
        }
        out = self.convert_spoilers(out);
        if let Some(width) = self.comparison_width {
            out = self.convert_comparisons(out, width);
        }
        if self.canonical_img {
            out = SIZED_IMG.replace_all(&out, "[img]").into_owned();
        }
        out
    }
}
