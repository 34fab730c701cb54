//! The quiz state snapshot.

use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::model::Step;
use crate::selection::Selection;

/// Prompt shown when a quiz starts.
pub const START_MESSAGE: &str = "Select the main verb (root) of the sentence.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Info,
    Correct,
    Incorrect,
}

/// The message currently shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Info,
            message: message.into(),
        }
    }

    pub fn correct(message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Correct,
            message: message.into(),
        }
    }

    pub fn incorrect(message: impl Into<String>) -> Self {
        Self {
            kind: FeedbackKind::Incorrect,
            message: message.into(),
        }
    }
}

/// One immutable version of the quiz. Every intent produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizState {
    pub sentence_index: usize,
    pub step: Step,
    pub selection: Selection,
    pub is_checked: bool,
    pub feedback: Feedback,
    pub is_review_mode: bool,
    pub results: Ledger,
    /// Bumped whenever `(sentence_index, step)` changes or the quiz resets.
    /// Deferred transitions capture it and are dropped when it has moved on.
    pub generation: u64,
}

impl QuizState {
    /// Fresh state for a passage of `sentence_count` sentences.
    pub fn new(sentence_count: usize) -> Self {
        Self {
            sentence_index: 0,
            step: Step::Root,
            selection: Selection::new(),
            is_checked: false,
            feedback: Feedback::info(START_MESSAGE),
            is_review_mode: false,
            results: Ledger::new(sentence_count),
            generation: 0,
        }
    }

    /// Checked and found correct: the selection is frozen.
    pub fn is_answered_correctly(&self) -> bool {
        self.is_checked && self.feedback.kind == FeedbackKind::Correct
    }

    pub fn is_last_sentence(&self) -> bool {
        self.sentence_index + 1 >= self.results.len()
    }

    /// Percentage of sentences before the current one.
    pub fn progress(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.sentence_index as f64 / self.results.len() as f64 * 100.0
    }

    /// First sentence whose record is not complete, clamped to the last one.
    ///
    /// Lets a restored session continue where the learner stopped.
    pub fn resume_index(&self) -> usize {
        self.results
            .iter()
            .position(|r| !r.is_complete())
            .unwrap_or_else(|| self.results.len().saturating_sub(1))
    }

    /// Move to a new `(sentence, step)` identity, dropping transient input.
    pub(crate) fn move_to(&mut self, sentence_index: usize, step: Step, feedback: Feedback) {
        self.sentence_index = sentence_index;
        self.step = step;
        self.selection.clear();
        self.is_checked = false;
        self.feedback = feedback;
        self.generation += 1;
    }
}
