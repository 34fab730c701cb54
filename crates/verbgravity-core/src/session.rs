//! Async session driver around the quiz engine.
//!
//! Owns the engine, reads the grading mode at every dispatch, runs the
//! auto-advance timer, and pushes progress to the sink without ever waiting
//! on it. Must be used from inside a tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::{Effect, Intent, QuizEngine};
use crate::error::BackendError;
use crate::ledger::ResultRecord;
use crate::model::Sentence;
use crate::state::QuizState;
use crate::traits::{GradingModeSource, ProgressRecord, ProgressSink};

/// Session driver configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between a correct root and the subject step.
    pub advance_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(1000),
        }
    }
}

/// What the caller needs to react to after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A sentence's subject was answered; progress was sent to the sink.
    SentenceCompleted(ProgressRecord),
    /// The quiz is over.
    Finished(Vec<ResultRecord>),
    /// The learner went back from the first sentence; ask before finishing.
    ConfirmFinish,
}

struct PendingAdvance {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct QuizSession {
    engine: QuizEngine,
    mode: Arc<dyn GradingModeSource>,
    sink: Option<Arc<dyn ProgressSink>>,
    session_id: Option<String>,
    config: SessionConfig,
    timer_tx: mpsc::UnboundedSender<Intent>,
    timer_rx: mpsc::UnboundedReceiver<Intent>,
    pending: Option<PendingAdvance>,
    saves: Vec<JoinHandle<()>>,
}

impl QuizSession {
    pub fn new(
        sentences: Vec<Sentence>,
        mode: Arc<dyn GradingModeSource>,
        config: SessionConfig,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            engine: QuizEngine::new(sentences),
            mode,
            sink: None,
            session_id: None,
            config,
            timer_tx,
            timer_rx,
            pending: None,
            saves: Vec::new(),
        }
    }

    /// Send progress for `session_id` to `sink` on every completed sentence.
    pub fn with_progress_sink(
        mut self,
        sink: Arc<dyn ProgressSink>,
        session_id: impl Into<String>,
    ) -> Self {
        self.sink = Some(sink);
        self.session_id = Some(session_id.into());
        self
    }

    pub fn state(&self) -> &QuizState {
        self.engine.state()
    }

    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    pub fn sentences(&self) -> &[Sentence] {
        self.engine.sentences()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn has_pending_advance(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply an intent and carry out its effects.
    pub fn dispatch(&mut self, intent: Intent) -> Vec<SessionEvent> {
        let mode = self.mode.grading_mode();
        let effects = self.engine.dispatch(&intent, mode);

        let mut events = Vec::new();
        for effect in effects {
            match effect {
                Effect::ScheduleAdvance { generation } => self.schedule_advance(generation),
                Effect::SaveProgress(record) => {
                    self.save(record.clone());
                    events.push(SessionEvent::SentenceCompleted(record));
                }
                Effect::Finish(results) => events.push(SessionEvent::Finished(results)),
                Effect::ConfirmFinish => events.push(SessionEvent::ConfirmFinish),
            }
        }

        self.cancel_stale_advance();
        self.saves.retain(|handle| !handle.is_finished());
        events
    }

    /// The next timer intent. Pending forever while no timer is live, so it
    /// can sit in a `tokio::select!` next to user input.
    pub async fn next_deferred(&mut self) -> Option<Intent> {
        self.timer_rx.recv().await
    }

    /// Replay saved progress and return the index to resume at.
    pub fn restore(&mut self, progress: Vec<ProgressRecord>) -> usize {
        self.dispatch(Intent::RestoreProgress { progress });
        self.state().resume_index()
    }

    /// Wait for in-flight progress saves.
    pub async fn flush(&mut self) {
        for handle in self.saves.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!("progress save task failed: {e}");
            }
        }
    }

    fn schedule_advance(&mut self, generation: u64) {
        if let Some(previous) = self.pending.take() {
            previous.handle.abort();
        }

        let tx = self.timer_tx.clone();
        let delay = self.config.advance_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Intent::AdvanceTimerFired { generation });
        });
        tracing::debug!(generation, delay_ms = delay.as_millis() as u64, "auto-advance scheduled");
        self.pending = Some(PendingAdvance { generation, handle });
    }

    fn cancel_stale_advance(&mut self) {
        let current = self.engine.state().generation;
        if !self.pending.as_ref().is_some_and(|p| p.generation != current) {
            return;
        }
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            tracing::debug!(
                scheduled = pending.generation,
                current,
                "auto-advance cancelled"
            );
        }
    }

    fn save(&mut self, record: ProgressRecord) {
        let (Some(sink), Some(session_id)) = (&self.sink, &self.session_id) else {
            return;
        };
        let sink = Arc::clone(sink);
        let session_id = session_id.clone();
        self.saves.push(tokio::spawn(async move {
            if let Err(e) = sink.save_progress(&session_id, &record).await {
                if is_transient_failure(&e) {
                    tracing::warn!(
                        session = %session_id,
                        sentence = record.sentence_index,
                        "progress not saved, backend unavailable: {e:#}"
                    );
                } else {
                    tracing::error!(
                        session = %session_id,
                        sentence = record.sentence_index,
                        "failed to save progress: {e:#}"
                    );
                }
            }
        }));
    }
}

/// A save failure the backend may recover from on its own.
fn is_transient_failure(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<BackendError>()
        .is_some_and(BackendError::is_transient)
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{AnswerKey, GradingMode, Step, Token, TokenId};
    use crate::state::FeedbackKind;
    use crate::traits::{FixedMode, SharedMode};

    fn sentence(words: &[&str], roots: Vec<TokenId>, head: TokenId, span: Vec<TokenId>) -> Sentence {
        Sentence {
            id: 0,
            text: words.join(" "),
            tokens: words
                .iter()
                .enumerate()
                .map(|(i, w)| Token {
                    id: i as TokenId,
                    text: w.to_string(),
                    pos: String::new(),
                    tag: String::new(),
                    dep: String::new(),
                })
                .collect(),
            key: AnswerKey {
                roots,
                subjects: vec![Some(head)],
                subject_spans: vec![span],
            },
        }
    }

    fn passage() -> Vec<Sentence> {
        vec![
            sentence(&["The", "dog", "barks"], vec![2], 1, vec![0, 1]),
            sentence(&["Birds", "sing"], vec![1], 0, vec![0]),
        ]
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<(String, ProgressRecord)>>,
        fail: bool,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn save_progress(&self, session_id: &str, record: &ProgressRecord) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("disk full");
            }
            self.saved
                .lock()
                .unwrap()
                .push((session_id.to_string(), record.clone()));
            Ok(())
        }
    }

    fn session(mode: GradingMode) -> QuizSession {
        QuizSession::new(passage(), Arc::new(FixedMode(mode)), SessionConfig::default())
    }

    fn check(session: &mut QuizSession, ids: &[TokenId]) -> Vec<SessionEvent> {
        for &token in ids {
            session.dispatch(Intent::SelectToken { token });
        }
        session.dispatch(Intent::CheckAnswer)
    }

    #[tokio::test(start_paused = true)]
    async fn correct_root_advances_after_delay() {
        let mut session = session(GradingMode::Full);
        check(&mut session, &[2]);
        assert!(session.has_pending_advance());
        assert_eq!(session.state().step, Step::Root);

        let start = tokio::time::Instant::now();
        let intent = session.next_deferred().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(intent, Intent::AdvanceTimerFired { generation: 0 });

        session.dispatch(intent);
        assert_eq!(session.state().step, Step::Subject);
        assert!(!session.has_pending_advance());
    }

    #[tokio::test(start_paused = true)]
    async fn navigating_away_cancels_the_timer() {
        let mut session = session(GradingMode::Full);
        check(&mut session, &[2]);
        session.dispatch(Intent::JumpToSentence {
            index: 1,
            review: false,
        });
        assert!(!session.has_pending_advance());

        let fired = tokio::time::timeout(Duration::from_secs(5), session.next_deferred()).await;
        assert!(fired.is_err(), "cancelled timer still fired");
        assert_eq!(session.state().sentence_index, 1);
        assert_eq!(session.state().step, Step::Root);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_next_step_cancels_the_timer() {
        let mut session = session(GradingMode::Full);
        check(&mut session, &[2]);
        session.dispatch(Intent::NextStep);
        assert_eq!(session.state().step, Step::Subject);
        assert!(!session.has_pending_advance());
    }

    #[tokio::test(start_paused = true)]
    async fn subject_success_saves_progress() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = session(GradingMode::Core).with_progress_sink(sink.clone(), "s-1");

        check(&mut session, &[2]);
        let intent = session.next_deferred().await.unwrap();
        session.dispatch(intent);
        let events = check(&mut session, &[1]);
        session.flush().await;

        let [SessionEvent::SentenceCompleted(record)] = events.as_slice() else {
            panic!("unexpected events: {events:?}");
        };
        assert!(record.root_correct && record.subject_correct);

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "s-1");
        assert_eq!(saved[0].1, *record);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_does_not_touch_state() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let mut session = session(GradingMode::Core).with_progress_sink(sink, "s-2");

        check(&mut session, &[2]);
        session.dispatch(Intent::NextStep);
        check(&mut session, &[1]);
        let before = session.state().clone();
        session.flush().await;

        assert_eq!(session.state(), &before);
        assert_eq!(session.state().feedback.kind, FeedbackKind::Correct);
        assert!(session.state().results.get(0).unwrap().is_complete());
    }

    #[tokio::test]
    async fn grading_mode_is_read_at_dispatch() {
        let mode = Arc::new(SharedMode::new(GradingMode::Full));
        let mut session = QuizSession::new(passage(), mode.clone(), SessionConfig::default());
        check(&mut session, &[2]);
        session.dispatch(Intent::NextStep);

        check(&mut session, &[1]);
        assert_eq!(session.state().feedback.kind, FeedbackKind::Incorrect);

        mode.set(GradingMode::Core);
        session.dispatch(Intent::CheckAnswer);
        assert_eq!(session.state().feedback.kind, FeedbackKind::Correct);
    }

    #[tokio::test]
    async fn finish_and_confirm_events_are_forwarded() {
        let mut session = session(GradingMode::Full);
        assert_eq!(
            session.dispatch(Intent::PrevSentence),
            vec![SessionEvent::ConfirmFinish]
        );
        let events = session.dispatch(Intent::FinishQuiz);
        assert!(matches!(events.as_slice(), [SessionEvent::Finished(r)] if r.len() == 2));
    }

    #[tokio::test]
    async fn restore_returns_resume_index() {
        let mut session = session(GradingMode::Full);
        let resume = session.restore(vec![ProgressRecord {
            sentence_index: 0,
            root_answer: Some(2),
            root_correct: true,
            subject_answer: Some(1),
            subject_correct: false,
        }]);
        assert_eq!(resume, 1);
        assert!(session.state().results.get(0).unwrap().is_missed());
    }

    #[test]
    fn save_failures_are_classified() {
        let failure = |e: BackendError| is_transient_failure(&anyhow::Error::from(e));
        assert!(failure(BackendError::Network("reset".into())));
        assert!(failure(BackendError::Api {
            status: 503,
            message: "down".into()
        }));
        assert!(!failure(BackendError::NotFound("abc".into())));
        assert!(!is_transient_failure(&anyhow::anyhow!("disk full")));
    }
}
