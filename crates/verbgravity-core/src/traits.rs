//! Collaborator traits and the data that crosses them.
//!
//! The async traits are implemented by `verbgravity-backend`. The engine
//! never awaits them itself: the session driver calls them fire-and-forget.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{GradingMode, Passage, TokenId};

// ---------------------------------------------------------------------------
// Passage analysis
// ---------------------------------------------------------------------------

/// Turns raw text into sentences, tokens, and answer keys.
#[async_trait]
pub trait PassageAnalyzer: Send + Sync {
    async fn analyze(&self, passage: &str) -> anyhow::Result<Passage>;
}

// ---------------------------------------------------------------------------
// Sessions and progress
// ---------------------------------------------------------------------------

/// Per-sentence progress, both as saved on SUBJECT success and as replayed
/// when a session is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub sentence_index: usize,
    /// Primary expected root of the sentence.
    #[serde(default)]
    pub root_answer: Option<TokenId>,
    pub root_correct: bool,
    /// First token the learner selected; `None` for an omitted subject.
    #[serde(default)]
    pub subject_answer: Option<TokenId>,
    pub subject_correct: bool,
}

/// Request to open a new session for a passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub passage_text: String,
    pub total_sentences: usize,
    pub mode: GradingMode,
}

/// A stored session with its saved progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    pub passage_text: String,
    pub total_sentences: usize,
    #[serde(default)]
    pub mode: GradingMode,
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
}

/// Creates and restores sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session and return its id.
    async fn create_session(&self, request: &CreateSessionRequest) -> anyhow::Result<String>;

    /// Fetch a session. `Ok(None)` when it does not exist.
    async fn get_session(&self, session_id: &str) -> anyhow::Result<Option<SessionSnapshot>>;
}

/// Persists per-sentence progress.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn save_progress(&self, session_id: &str, record: &ProgressRecord) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Grading mode setting
// ---------------------------------------------------------------------------

/// The externally owned grading-mode setting, read at every check.
pub trait GradingModeSource: Send + Sync {
    fn grading_mode(&self) -> GradingMode;
}

/// A mode that never changes.
#[derive(Debug, Clone, Copy)]
pub struct FixedMode(pub GradingMode);

impl GradingModeSource for FixedMode {
    fn grading_mode(&self) -> GradingMode {
        self.0
    }
}

/// A mode that can be switched while a quiz is running.
#[derive(Debug)]
pub struct SharedMode {
    full: AtomicBool,
}

impl SharedMode {
    pub fn new(mode: GradingMode) -> Self {
        Self {
            full: AtomicBool::new(mode == GradingMode::Full),
        }
    }

    pub fn set(&self, mode: GradingMode) {
        self.full.store(mode == GradingMode::Full, Ordering::Relaxed);
    }
}

impl GradingModeSource for SharedMode {
    fn grading_mode(&self) -> GradingMode {
        if self.full.load(Ordering::Relaxed) {
            GradingMode::Full
        } else {
            GradingMode::Core
        }
    }
}
