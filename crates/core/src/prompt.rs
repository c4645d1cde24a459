//! User-interaction port.
//!
//! Name confirmation and re-login decisions go through a [`Prompt`] so the
//! core never touches a terminal.

/// Source of interactive decisions.
pub trait Prompt: Send + Sync {
    /// Yes/no question.
    fn confirm(&self, question: &str, default: bool) -> bool;

    /// Free-text question; an empty answer means "no answer".
    fn ask(&self, question: &str, default: &str) -> String;
}

/// Answers every question with its default. Used when running unattended.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnswers;

impl Prompt for DefaultAnswers {
    fn confirm(&self, _question: &str, default: bool) -> bool {
        default
    }

    fn ask(&self, _question: &str, default: &str) -> String {
        default.to_string()
    }
}
