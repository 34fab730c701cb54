//! Grading evaluator: set comparison, hint selection, and the
//! `CHECK_ANSWER` / omitted-subject protocols.

use std::collections::BTreeSet;

use crate::answer_key::{self, ExpectedAnswers};
use crate::engine::{Effect, Transition};
use crate::ledger::{Mark, WrongAnswer};
use crate::model::{GradingMode, Sentence, Step, TokenId};
use crate::selection::Selection;
use crate::state::{Feedback, QuizState};
use crate::traits::ProgressRecord;

/// Shown when the last outstanding missed sentence is fixed in review mode.
pub const ALL_REVIEWS_COMPLETE: &str =
    "Congratulations! You have finished reviewing every missed sentence.";

/// Shown when the learner claims an omitted subject that is actually written.
pub const EXPLICIT_SUBJECT: &str = "This sentence has an explicit subject.";

// ---------------------------------------------------------------------------
// Hint rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum TagField {
    Pos,
    Dep,
}

#[derive(Debug, Clone, Copy)]
struct HintRule {
    field: TagField,
    value: &'static str,
    hint: &'static str,
}

/// Checked in order against the first selected token of a wrong ROOT answer.
const ROOT_HINT_RULES: &[HintRule] = &[
    HintRule {
        field: TagField::Pos,
        value: "NOUN",
        hint: "A noun cannot be the main verb.",
    },
    HintRule {
        field: TagField::Pos,
        value: "ADJ",
        hint: "An adjective is not a verb.",
    },
    HintRule {
        field: TagField::Pos,
        value: "ADP",
        hint: "A preposition is not a verb.",
    },
    HintRule {
        field: TagField::Dep,
        value: "aux",
        hint: "Look for the main verb that carries the meaning, not the auxiliary.",
    },
];

fn root_verbs(n: usize) -> String {
    if n == 1 {
        "1 root verb".to_string()
    } else {
        format!("{n} root verbs")
    }
}

fn words(n: usize) -> String {
    if n == 1 {
        "1 word".to_string()
    } else {
        format!("{n} words")
    }
}

/// Hint for a wrong ROOT answer, by priority: cardinality, tag rules, generic.
pub fn root_hint(sentence: &Sentence, selection: &Selection, expected: &BTreeSet<TokenId>) -> String {
    let expected_count = expected.len();
    let selected = selection.len();

    if selected < expected_count {
        return format!(
            "This sentence has {}, you selected {selected}. Keep looking.",
            root_verbs(expected_count)
        );
    }
    if selected > expected_count {
        return format!(
            "This sentence has {}, you selected {selected}. Narrow your selection.",
            root_verbs(expected_count)
        );
    }

    let tag_hint = selection
        .first()
        .and_then(|id| sentence.token(id))
        .and_then(|token| {
            ROOT_HINT_RULES.iter().find(|rule| match rule.field {
                TagField::Pos => token.pos == rule.value,
                TagField::Dep => token.dep == rule.value,
            })
        })
        .map(|rule| rule.hint);

    tag_hint.unwrap_or("Try again.").to_string()
}

/// Hint for a wrong SUBJECT answer. FULL mode talks about the span, CORE
/// mode about head-word count.
pub fn subject_hint(selection: &Selection, expected: &BTreeSet<TokenId>, mode: GradingMode) -> String {
    let expected_count = expected.len();
    let selected = selection.len();

    if expected_count == 0 {
        return "Look again: is the subject actually written in this sentence?".to_string();
    }

    match mode {
        GradingMode::Full => {
            if selected < expected_count {
                "Only part of the subject phrase is selected. Select the whole phrase.".to_string()
            } else {
                "Check that you selected exactly the whole subject phrase.".to_string()
            }
        }
        GradingMode::Core => {
            if selected < expected_count {
                format!("The answer is {}. Select more.", words(expected_count))
            } else if selected > expected_count {
                format!("The answer is {}. Select fewer.", words(expected_count))
            } else {
                "Find who or what performs the action.".to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Success messages
// ---------------------------------------------------------------------------

pub fn root_success_message(expected_count: usize, review: bool) -> String {
    if review {
        "Exactly! You found the main verb. Now let's check the subject.".to_string()
    } else if expected_count > 1 {
        format!("Correct! You found all {expected_count} main verbs.")
    } else {
        "Correct! You found the main verb.".to_string()
    }
}

pub fn subject_success_message(
    expected_count: usize,
    mode: GradingMode,
    review: bool,
    final_review: bool,
) -> String {
    if final_review {
        ALL_REVIEWS_COMPLETE.to_string()
    } else if review {
        "Exactly! You found the subject. Well done!".to_string()
    } else if expected_count > 1 {
        match mode {
            GradingMode::Full => {
                format!("Correct! You selected all {expected_count} words of the subject phrase.")
            }
            GradingMode::Core => format!("Correct! You found all {expected_count} subjects."),
        }
    } else {
        "Correct!".to_string()
    }
}

pub fn omitted_success_message(review: bool, final_review: bool) -> String {
    if final_review {
        ALL_REVIEWS_COMPLETE.to_string()
    } else if review {
        "Exactly! The subject is omitted here. Well done!".to_string()
    } else {
        "Correct! (omitted subject)".to_string()
    }
}

// ---------------------------------------------------------------------------
// Check protocols
// ---------------------------------------------------------------------------

fn first_attempt_mark(correct: bool, selection: &Selection, expected: &BTreeSet<TokenId>) -> Mark {
    if correct {
        Mark::Correct
    } else {
        Mark::Incorrect {
            wrong: selection.first_offender(expected).map(WrongAnswer::Token),
        }
    }
}

fn lock(state: &mut QuizState, step: Step, mark: Mark) {
    let index = state.sentence_index;
    if let Some(record) = state.results.record_mut(index) {
        if record.lock_first_attempt(step, mark) {
            tracing::debug!(sentence = index, %step, ?mark, "first attempt locked");
        }
    }
}

/// `CHECK_ANSWER`. A no-op with an empty selection or an already-correct step.
pub(crate) fn check_answer(sentences: &[Sentence], state: &QuizState, mode: GradingMode) -> Transition {
    let Some(sentence) = sentences.get(state.sentence_index) else {
        return Transition::unchanged(state);
    };
    if state.selection.is_empty() || state.is_answered_correctly() {
        return Transition::unchanged(state);
    }

    let expected = answer_key::resolve(&sentence.key, mode);
    match state.step {
        Step::Root => check_root(sentence, state, &expected),
        Step::Subject => check_subject(sentence, state, &expected, mode),
    }
}

fn check_root(sentence: &Sentence, state: &QuizState, expected: &ExpectedAnswers) -> Transition {
    let mut next = state.clone();
    let correct = state.selection.matches(&expected.roots);
    lock(
        &mut next,
        Step::Root,
        first_attempt_mark(correct, &state.selection, &expected.roots),
    );
    next.is_checked = true;

    let mut effects = Vec::new();
    if correct {
        next.feedback = Feedback::correct(root_success_message(
            expected.roots.len(),
            state.is_review_mode,
        ));
        effects.push(Effect::ScheduleAdvance {
            generation: next.generation,
        });
    } else {
        next.feedback = Feedback::incorrect(format!(
            "Incorrect. {}",
            root_hint(sentence, &state.selection, &expected.roots)
        ));
    }

    Transition {
        state: next,
        effects,
    }
}

fn check_subject(
    sentence: &Sentence,
    state: &QuizState,
    expected: &ExpectedAnswers,
    mode: GradingMode,
) -> Transition {
    let mut next = state.clone();
    let correct = state.selection.matches(&expected.subjects);
    lock(
        &mut next,
        Step::Subject,
        first_attempt_mark(correct, &state.selection, &expected.subjects),
    );

    if correct {
        return complete_subject(
            sentence,
            next,
            SubjectAnswer::Tokens {
                expected_count: expected.subjects.len(),
                first: state.selection.first(),
            },
            mode,
        );
    }

    next.is_checked = true;
    next.feedback = Feedback::incorrect(format!(
        "Incorrect. {}",
        subject_hint(&state.selection, &expected.subjects, mode)
    ));
    Transition {
        state: next,
        effects: Vec::new(),
    }
}

/// Omitted-subject action. Correct iff the expected subject set is empty.
pub(crate) fn check_omitted_subject(
    sentences: &[Sentence],
    state: &QuizState,
    mode: GradingMode,
) -> Transition {
    let Some(sentence) = sentences.get(state.sentence_index) else {
        return Transition::unchanged(state);
    };
    if state.step != Step::Subject || state.is_answered_correctly() {
        return Transition::unchanged(state);
    }

    let mut next = state.clone();
    if answer_key::expected_subjects(&sentence.key, mode).is_empty() {
        lock(&mut next, Step::Subject, Mark::Correct);
        return complete_subject(sentence, next, SubjectAnswer::Omitted, mode);
    }

    lock(
        &mut next,
        Step::Subject,
        Mark::incorrect(WrongAnswer::ClaimedOmission),
    );
    next.is_checked = true;
    next.feedback = Feedback::incorrect(EXPLICIT_SUBJECT);
    Transition {
        state: next,
        effects: Vec::new(),
    }
}

enum SubjectAnswer {
    Tokens {
        expected_count: usize,
        first: Option<TokenId>,
    },
    Omitted,
}

/// Shared tail of a correct SUBJECT check: report progress, detect the end of
/// the review loop, and flag the record as reviewed.
fn complete_subject(
    sentence: &Sentence,
    mut next: QuizState,
    answer: SubjectAnswer,
    mode: GradingMode,
) -> Transition {
    let index = next.sentence_index;
    let review = next.is_review_mode;
    next.is_checked = true;

    let record = next.results.get(index).cloned().unwrap_or_default();
    let subject_answer = match answer {
        SubjectAnswer::Tokens { first, .. } => first,
        SubjectAnswer::Omitted => None,
    };
    let mut effects = vec![Effect::SaveProgress(ProgressRecord {
        sentence_index: index,
        root_answer: sentence.key.roots.first().copied(),
        root_correct: record.root().is_correct(),
        subject_answer,
        subject_correct: record.subject().is_correct(),
    })];

    let final_review = review && next.results.unreviewed_count() == 1;
    let message = match answer {
        SubjectAnswer::Tokens { expected_count, .. } => {
            subject_success_message(expected_count, mode, review, final_review)
        }
        SubjectAnswer::Omitted => omitted_success_message(review, final_review),
    };
    next.feedback = Feedback::correct(message);

    if review {
        if let Some(record) = next.results.record_mut(index) {
            record.mark_reviewed();
        }
        tracing::info!(sentence = index, final_review, "review sentence completed");
        effects.push(Effect::Finish(next.results.to_vec()));
    }

    Transition {
        state: next,
        effects,
    }
}
