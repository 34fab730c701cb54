//! Maps an answer key and the grading mode to the expected token sets.

use std::collections::BTreeSet;

use crate::model::{AnswerKey, GradingMode, Step, TokenId};

/// Expected token sets for both steps of one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedAnswers {
    pub roots: BTreeSet<TokenId>,
    /// Empty when the subject is grammatically omitted.
    pub subjects: BTreeSet<TokenId>,
}

impl ExpectedAnswers {
    /// The expected set for the given step.
    pub fn for_step(&self, step: Step) -> &BTreeSet<TokenId> {
        match step {
            Step::Root => &self.roots,
            Step::Subject => &self.subjects,
        }
    }

    /// True when only the omitted-subject action can answer the SUBJECT step.
    pub fn subject_omitted(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Resolve the expected ROOT and SUBJECT sets for the current attempt.
pub fn resolve(key: &AnswerKey, mode: GradingMode) -> ExpectedAnswers {
    ExpectedAnswers {
        roots: key.roots.iter().copied().collect(),
        subjects: expected_subjects(key, mode),
    }
}

/// The expected SUBJECT set alone.
///
/// CORE uses the head words in `subjects` (dropping `None`); FULL flattens
/// every span in `subject_spans`, falling back to the head words when the
/// key has no spans.
pub fn expected_subjects(key: &AnswerKey, mode: GradingMode) -> BTreeSet<TokenId> {
    let heads = || key.subjects.iter().flatten().copied().collect();
    match mode {
        GradingMode::Core => heads(),
        GradingMode::Full if key.subject_spans.is_empty() => heads(),
        GradingMode::Full => key.subject_spans.iter().flatten().copied().collect(),
    }
}
