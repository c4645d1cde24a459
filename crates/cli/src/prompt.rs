//! Terminal implementation of the core's prompt port.

use console::{style, Term};
use uploadarr_core::Prompt;

/// Asks on stderr and reads answers from the terminal.
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn read_answer(&self, question: &str) -> Option<String> {
        self.term
            .write_str(&format!("{} ", style(question).bold()))
            .ok()?;
        self.term.read_line().ok()
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        match self.read_answer(&format!("{question} {hint}")) {
            Some(answer) => parse_yes_no(&answer).unwrap_or(default),
            None => default,
        }
    }

    fn ask(&self, question: &str, default: &str) -> String {
        match self.read_answer(&format!("{question}:")) {
            Some(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            _ => default.to_string(),
        }
    }
}

/// `Some(true)` for y/yes, `Some(false)` for n/no, `None` otherwise.
fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
