//! Navigation controller: moves between `(sentence, step)` positions.

use crate::engine::{Effect, Transition};
use crate::model::Step;
use crate::state::{Feedback, QuizState};
use crate::traits::ProgressRecord;

pub const SUBJECT_PROMPT: &str = "Now find the subject of this verb.";
pub const NEXT_SENTENCE_PROMPT: &str = "Find the main verb of the next sentence.";
pub const PREV_SENTENCE_PROMPT: &str = "Back to the previous sentence.";
pub const REVIEW_PROMPT: &str = "Review mode: try this missed sentence again.";
pub const JUMP_PROMPT: &str = "Moved to the sentence. Find its main verb.";

fn step_done(state: &QuizState, step: Step) -> bool {
    state.step == step && state.is_answered_correctly()
}

/// `NEXT_STEP`: ROOT to SUBJECT once the root is answered.
pub(crate) fn next_step(state: &QuizState) -> Transition {
    if !step_done(state, Step::Root) {
        return Transition::unchanged(state);
    }
    let mut next = state.clone();
    next.move_to(state.sentence_index, Step::Subject, Feedback::info(SUBJECT_PROMPT));
    Transition::to(next)
}

/// The deferred ROOT to SUBJECT transition. Dropped when the state has moved
/// on since it was scheduled.
pub(crate) fn advance_timer_fired(state: &QuizState, generation: u64) -> Transition {
    if generation != state.generation {
        tracing::warn!(
            scheduled = generation,
            current = state.generation,
            "ignoring stale auto-advance"
        );
        return Transition::unchanged(state);
    }
    next_step(state)
}

/// `NEXT_SENTENCE`: advance after a correct subject, or finish on the last
/// sentence and in review mode.
pub(crate) fn next_sentence(state: &QuizState) -> Transition {
    if !step_done(state, Step::Subject) {
        return Transition::unchanged(state);
    }
    if state.is_review_mode || state.is_last_sentence() {
        return finish_quiz(state);
    }
    let mut next = state.clone();
    next.move_to(
        state.sentence_index + 1,
        Step::Root,
        Feedback::info(NEXT_SENTENCE_PROMPT),
    );
    Transition::to(next)
}

/// `PREV_SENTENCE`: step back, or ask for confirmation to finish at index 0.
pub(crate) fn prev_sentence(state: &QuizState) -> Transition {
    if state.sentence_index == 0 {
        return Transition {
            state: state.clone(),
            effects: vec![Effect::ConfirmFinish],
        };
    }
    let mut next = state.clone();
    next.move_to(
        state.sentence_index - 1,
        Step::Root,
        Feedback::info(PREV_SENTENCE_PROMPT),
    );
    Transition::to(next)
}

pub(crate) fn finish_quiz(state: &QuizState) -> Transition {
    tracing::info!(
        sentence = state.sentence_index,
        review = state.is_review_mode,
        "quiz finished"
    );
    Transition {
        state: state.clone(),
        effects: vec![Effect::Finish(state.results.to_vec())],
    }
}

/// `JUMP_TO_SENTENCE`. Out-of-range indices land on the last sentence.
pub(crate) fn jump_to(state: &QuizState, index: usize, review: bool) -> Transition {
    let last = state.results.len().saturating_sub(1);
    let index = index.min(last);
    let prompt = if review { REVIEW_PROMPT } else { JUMP_PROMPT };

    let mut next = state.clone();
    next.move_to(index, Step::Root, Feedback::info(prompt));
    next.is_review_mode = review;
    Transition::to(next)
}

/// `RESET_QUIZ`: the initial state with fresh records of the same length.
pub(crate) fn reset(state: &QuizState) -> Transition {
    let mut next = QuizState::new(state.results.len());
    next.generation = state.generation + 1;
    Transition::to(next)
}

/// Replay saved progress. The position is left alone.
pub(crate) fn restore(state: &QuizState, progress: &[ProgressRecord]) -> Transition {
    let mut next = state.clone();
    let applied = next.results.restore(progress);
    tracing::info!(applied, total = progress.len(), "restored saved progress");
    Transition::to(next)
}
