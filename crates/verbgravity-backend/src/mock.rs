//! In-memory backend for tests and offline play.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use verbgravity_core::error::BackendError;
use verbgravity_core::model::Passage;
use verbgravity_core::traits::{
    CreateSessionRequest, PassageAnalyzer, ProgressRecord, ProgressSink, SessionSnapshot,
    SessionStore,
};

/// Serves canned analyses and keeps sessions in a map.
///
/// Progress saves behave like the real API: one entry per sentence, the
/// latest save wins.
#[derive(Default)]
pub struct InMemoryBackend {
    /// Passage text → analysis.
    analyses: HashMap<String, Passage>,
    /// Returned for any text without a canned analysis.
    default_analysis: Option<Passage>,
    sessions: Mutex<HashMap<String, SessionSnapshot>>,
    save_calls: AtomicU32,
    fail_saves: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that analyses every passage as `passage`.
    pub fn with_fixed_analysis(passage: Passage) -> Self {
        Self {
            default_analysis: Some(passage),
            ..Self::default()
        }
    }

    pub fn with_analysis(mut self, text: impl Into<String>, passage: Passage) -> Self {
        self.analyses.insert(text.into(), passage);
        self
    }

    /// Make every subsequent `save_progress` fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }

    /// Number of `save_progress` calls, failed ones included.
    pub fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::Relaxed)
    }

    pub fn session(&self, session_id: &str) -> Option<SessionSnapshot> {
        lock(&self.sessions).get(session_id).cloned()
    }

    /// Seed a session directly, e.g. to test restoring.
    pub fn insert_session(&self, snapshot: SessionSnapshot) {
        lock(&self.sessions).insert(snapshot.id.clone(), snapshot);
    }
}

#[async_trait]
impl PassageAnalyzer for InMemoryBackend {
    async fn analyze(&self, passage: &str) -> anyhow::Result<Passage> {
        self.analyses
            .get(passage)
            .or(self.default_analysis.as_ref())
            .cloned()
            .ok_or_else(|| {
                BackendError::Api {
                    status: 500,
                    message: "no analysis configured for passage".into(),
                }
                .into()
            })
    }
}

#[async_trait]
impl SessionStore for InMemoryBackend {
    async fn create_session(&self, request: &CreateSessionRequest) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let snapshot = SessionSnapshot {
            id: id.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            passage_text: request.passage_text.clone(),
            total_sentences: request.total_sentences,
            mode: request.mode,
            progress: Vec::new(),
        };
        lock(&self.sessions).insert(id.clone(), snapshot);
        Ok(id)
    }

    async fn get_session(&self, session_id: &str) -> anyhow::Result<Option<SessionSnapshot>> {
        Ok(self.session(session_id))
    }
}

#[async_trait]
impl ProgressSink for InMemoryBackend {
    async fn save_progress(&self, session_id: &str, record: &ProgressRecord) -> anyhow::Result<()> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(BackendError::Network("connection reset".into()).into());
        }

        let mut sessions = lock(&self.sessions);
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| BackendError::NotFound(session_id.to_string()))?;
        session
            .progress
            .retain(|p| p.sentence_index != record.sentence_index);
        session.progress.push(record.clone());
        session.progress.sort_by_key(|p| p.sentence_index);
        Ok(())
    }
}
