//! Text-rewrite pipeline turning a canonical release name into a tracker title.

use regex_lite::Regex;
use tracing::debug;

/// Upper bound on whole-pipeline passes when searching for a fixed point.
pub const MAX_PASSES: usize = 4;

/// One rewrite step.
#[derive(Debug, Clone)]
pub enum Rewrite {
    /// Replace every occurrence. An empty `from` is a no-op.
    Replace { from: String, to: String },
    /// Replace the first occurrence only.
    ReplaceFirst { from: String, to: String },
    /// Replace every occurrence unless the words of `to` already appear in
    /// order. Words compare after punctuation and separators are dropped, so
    /// a substitution the charset step later rewrites is still recognised.
    ReplaceOnce { from: String, to: String },
    /// Replace all regex matches.
    Regex { pattern: Regex, to: String },
    /// Collapse runs of whitespace into one space and trim.
    CollapseWhitespace,
    /// Delete every run of characters matched by `disallowed`.
    RestrictCharset(Regex),
}

impl Rewrite {
    pub fn replace(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Replace {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn remove(from: impl Into<String>) -> Self {
        Self::replace(from, "")
    }

    pub fn replace_first(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::ReplaceFirst {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn replace_once(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::ReplaceOnce {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Regex rewrite from a pattern known at compile time.
    pub fn regex(pattern: &Regex, to: impl Into<String>) -> Self {
        Self::Regex {
            pattern: pattern.clone(),
            to: to.into(),
        }
    }

    fn apply(&self, input: &str) -> String {
        match self {
            Self::Replace { from, .. } | Self::ReplaceFirst { from, .. } | Self::ReplaceOnce { from, .. }
                if from.is_empty() =>
            {
                input.to_string()
            }
            Self::Replace { from, to } => input.replace(from.as_str(), to),
            Self::ReplaceFirst { from, to } => input.replacen(from.as_str(), to, 1),
            Self::ReplaceOnce { from, to } => {
                if from != to && !to.is_empty() && contains_words(input, to) {
                    input.to_string()
                } else {
                    input.replace(from.as_str(), to)
                }
            }
            Self::Regex { pattern, to } => pattern.replace_all(input, to.as_str()).into_owned(),
            Self::CollapseWhitespace => input.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::RestrictCharset(disallowed) => disallowed.replace_all(input, "").into_owned(),
        }
    }
}

/// Runs of ASCII alphanumerics and Latin-1 letters; everything else splits.
fn words(input: &str) -> Vec<&str> {
    input
        .split(|c: char| !(c.is_ascii_alphanumeric() || ('À'..='ÿ').contains(&c)))
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_words(haystack: &str, needle: &str) -> bool {
    let needle = words(needle);
    if needle.is_empty() {
        return false;
    }
    words(haystack)
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}

/// Ordered list of rewrites.
///
/// [`NamePipeline::format`] re-runs the steps until the output stops
/// changing, so a rewrite that produces input for an earlier step (e.g.
/// `PQ10 -> HDR` before `HDR -> HDR10`) still settles, and formatting a
/// formatted name returns it unchanged.
#[derive(Debug, Clone, Default)]
pub struct NamePipeline {
    steps: Vec<Rewrite>,
}

impl NamePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, rewrite: Rewrite) -> Self {
        self.steps.push(rewrite);
        self
    }

    pub fn step_if(self, cond: bool, rewrite: Rewrite) -> Self {
        if cond {
            self.step(rewrite)
        } else {
            self
        }
    }

    pub fn steps(&self) -> &[Rewrite] {
        &self.steps
    }

    /// Run every step once, in order.
    pub fn apply_once(&self, input: &str) -> String {
        self.steps
            .iter()
            .fold(input.to_string(), |acc, step| step.apply(&acc))
    }

    /// Run the pipeline to a fixed point, at most [`MAX_PASSES`] times.
    pub fn format(&self, input: &str) -> String {
        let mut current = self.apply_once(input);
        for _ in 1..MAX_PASSES {
            let next = self.apply_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        debug!(name = %current, "Name pipeline did not settle");
        current
    }
}

/// Fold Latin-1 letters to their ASCII base letter and drop every other
/// non-ASCII character.
pub fn ascii_fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        let folded = match c {
            'À'..='Å' => "A",
            'Æ' => "AE",
            'Ç' => "C",
            'È'..='Ë' => "E",
            'Ì'..='Ï' => "I",
            'Ð' => "D",
            'Ñ' => "N",
            'Ò'..='Ö' | 'Ø' => "O",
            'Ù'..='Ü' => "U",
            'Ý' => "Y",
            'Þ' => "Th",
            'ß' => "ss",
            'à'..='å' => "a",
            'æ' => "ae",
            'ç' => "c",
            'è'..='ë' => "e",
            'ì'..='ï' => "i",
            'ð' => "d",
            'ñ' => "n",
            'ò'..='ö' | 'ø' => "o",
            'ù'..='ü' => "u",
            'ý' | 'ÿ' => "y",
            'þ' => "th",
            'Ă' | 'Â' => "A",
            'ă' | 'â' => "a",
            'Ș' | 'Ş' => "S",
            'ș' | 'ş' => "s",
            'Ț' | 'Ţ' => "T",
            'ț' | 'ţ' => "t",
            _ => "",
        };
        out.push_str(folded);
    }
    out
}
