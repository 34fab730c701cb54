//! Quiz engine: the closed set of intents and the pure transition function.
//!
//! [`apply`] maps `(sentences, state, intent, mode)` to a new state snapshot
//! plus a list of [`Effect`]s for the caller to carry out. It never mutates
//! its input and never fails; intents whose preconditions do not hold leave
//! the state unchanged.

use serde::{Deserialize, Serialize};

use crate::answer_key::{self, ExpectedAnswers};
use crate::grading;
use crate::ledger::ResultRecord;
use crate::model::{GradingMode, Sentence, TokenId};
use crate::navigation;
use crate::selection;
use crate::state::QuizState;
use crate::traits::ProgressRecord;

/// Everything the learner (or a timer) can ask the quiz to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SelectToken { token: TokenId },
    CheckAnswer,
    OmittedSubject,
    NextStep,
    NextSentence,
    PrevSentence,
    JumpToSentence { index: usize, review: bool },
    /// Caller-confirmed finish, sent after [`Effect::ConfirmFinish`].
    FinishQuiz,
    ResetQuiz,
    RestoreProgress { progress: Vec<ProgressRecord> },
    AdvanceTimerFired { generation: u64 },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SelectToken { .. } => "select_token",
            Intent::CheckAnswer => "check_answer",
            Intent::OmittedSubject => "omitted_subject",
            Intent::NextStep => "next_step",
            Intent::NextSentence => "next_sentence",
            Intent::PrevSentence => "prev_sentence",
            Intent::JumpToSentence { .. } => "jump_to_sentence",
            Intent::FinishQuiz => "finish_quiz",
            Intent::ResetQuiz => "reset_quiz",
            Intent::RestoreProgress { .. } => "restore_progress",
            Intent::AdvanceTimerFired { .. } => "advance_timer_fired",
        }
    }
}

/// Work requested by a transition. The engine never performs it itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Send `AdvanceTimerFired { generation }` after the auto-advance delay.
    ScheduleAdvance { generation: u64 },
    /// Persist progress for a sentence whose subject was just answered.
    SaveProgress(ProgressRecord),
    /// The quiz is over; hand the ledger to the summary.
    Finish(Vec<ResultRecord>),
    /// Ask the learner whether to finish now.
    ConfirmFinish,
}

/// Result of applying one intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: QuizState,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub(crate) fn unchanged(state: &QuizState) -> Self {
        Self::to(state.clone())
    }

    pub(crate) fn to(state: QuizState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Apply one intent to a state snapshot.
pub fn apply(
    sentences: &[Sentence],
    state: &QuizState,
    intent: &Intent,
    mode: GradingMode,
) -> Transition {
    if sentences.is_empty() {
        return Transition::unchanged(state);
    }

    tracing::debug!(
        intent = intent.name(),
        sentence = state.sentence_index,
        step = %state.step,
        generation = state.generation,
        "applying intent"
    );

    match intent {
        Intent::SelectToken { token } => Transition::to(selection::select_token(state, *token)),
        Intent::CheckAnswer => grading::check_answer(sentences, state, mode),
        Intent::OmittedSubject => grading::check_omitted_subject(sentences, state, mode),
        Intent::NextStep => navigation::next_step(state),
        Intent::NextSentence => navigation::next_sentence(state),
        Intent::PrevSentence => navigation::prev_sentence(state),
        Intent::JumpToSentence { index, review } => navigation::jump_to(state, *index, *review),
        Intent::FinishQuiz => navigation::finish_quiz(state),
        Intent::ResetQuiz => navigation::reset(state),
        Intent::RestoreProgress { progress } => navigation::restore(state, progress),
        Intent::AdvanceTimerFired { generation } => {
            navigation::advance_timer_fired(state, *generation)
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Sentences plus the current state, for callers that want a mutable handle
/// instead of threading snapshots through [`apply`] themselves.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    sentences: Vec<Sentence>,
    state: QuizState,
}

impl QuizEngine {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        let state = QuizState::new(sentences.len());
        Self { sentences, state }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.sentences.get(self.state.sentence_index)
    }

    /// Expected answers for the current sentence under `mode`.
    pub fn expected(&self, mode: GradingMode) -> Option<ExpectedAnswers> {
        self.current_sentence()
            .map(|s| answer_key::resolve(&s.key, mode))
    }

    /// Apply `intent`, keep the new state, and return the effects.
    pub fn dispatch(&mut self, intent: &Intent, mode: GradingMode) -> Vec<Effect> {
        let Transition { state, effects } = apply(&self.sentences, &self.state, intent, mode);
        self.state = state;
        effects
    }
}
