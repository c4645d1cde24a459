//! Prompt with canned answers.

use std::sync::{Mutex, PoisonError};

use crate::prompt::Prompt;

/// Answers every confirmation and free-text question with a fixed value
/// and records the questions asked. Unscripted questions get their default.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    confirm: Option<bool>,
    answer: Option<String>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(mut self, answer: bool) -> Self {
        self.confirm = Some(answer);
        self
    }

    pub fn answer_with(mut self, answer: &str) -> Self {
        self.answer = Some(answer.to_string());
        self
    }

    /// Every question asked so far, in order.
    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, question: &str) {
        self.questions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(question.to_string());
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str, default: bool) -> bool {
        self.record(question);
        self.confirm.unwrap_or(default)
    }

    fn ask(&self, question: &str, default: &str) -> String {
        self.record(question);
        self.answer.clone().unwrap_or_else(|| default.to_string())
    }
}
