//! Core data model types for verbgravity.
//!
//! Sentences, tokens, and answer keys are produced by the passage-analysis
//! collaborator and stay immutable for the lifetime of a quiz run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token identifier, unique within its sentence.
pub type TokenId = u32;

/// A single analysed token of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub text: String,
    /// Universal part-of-speech tag (e.g. "VERB", "NOUN").
    pub pos: String,
    /// Fine-grained tag (e.g. "VBZ").
    #[serde(default)]
    pub tag: String,
    /// Dependency role (e.g. "ROOT", "nsubj", "aux").
    pub dep: String,
}

/// Pre-computed answers for one sentence.
///
/// Older analyses carry a single clause as `root`/`subject`/`subjectSpan`;
/// those are read into one-element lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAnswerKey")]
pub struct AnswerKey {
    /// Root verb token ids. Never empty for a well-formed key.
    pub roots: Vec<TokenId>,
    /// Head-word subject per clause; `None` marks an omitted subject.
    pub subjects: Vec<Option<TokenId>>,
    /// Full subject span per clause, used in [`GradingMode::Full`]. When
    /// empty, FULL mode grades the head words in `subjects`.
    #[serde(rename = "subjectSpans")]
    pub subject_spans: Vec<Vec<TokenId>>,
}

/// Answer key as it appears on the wire, plural or singular.
#[derive(Deserialize)]
struct RawAnswerKey {
    #[serde(default)]
    roots: Option<Vec<TokenId>>,
    #[serde(default)]
    root: Option<TokenId>,
    #[serde(default)]
    subjects: Option<Vec<Option<TokenId>>>,
    #[serde(default)]
    subject: Option<TokenId>,
    #[serde(default, rename = "subjectSpans")]
    subject_spans: Option<Vec<Vec<TokenId>>>,
    #[serde(default, rename = "subjectSpan")]
    subject_span: Option<Vec<TokenId>>,
}

impl From<RawAnswerKey> for AnswerKey {
    fn from(raw: RawAnswerKey) -> Self {
        let roots = raw
            .roots
            .or_else(|| raw.root.map(|r| vec![r]))
            .unwrap_or_default();
        let subjects = raw.subjects.unwrap_or_else(|| vec![raw.subject]);
        let subject_spans = raw
            .subject_spans
            .or_else(|| raw.subject_span.filter(|span| !span.is_empty()).map(|span| vec![span]))
            .unwrap_or_default();
        Self {
            roots,
            subjects,
            subject_spans,
        }
    }
}

/// One sentence of a passage together with its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub id: u32,
    pub text: String,
    pub tokens: Vec<Token>,
    pub key: AnswerKey,
}

impl Sentence {
    /// Look up a token by id.
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// Text of a token, or `"???"` when the id is not part of this sentence.
    pub fn token_text(&self, id: TokenId) -> &str {
        self.token(id).map(|t| t.text.as_str()).unwrap_or("???")
    }
}

/// Metadata returned alongside an analysed passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMeta {
    #[serde(default, rename = "totalSentences")]
    pub total_sentences: usize,
    /// Name of the NLP model that produced the analysis.
    #[serde(default)]
    pub model: String,
}

/// A fully analysed passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub sentences: Vec<Sentence>,
    #[serde(default)]
    pub meta: PassageMeta,
}

/// How the SUBJECT step is graded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GradingMode {
    /// Only the head word of each subject must be selected.
    Core,
    /// The whole subject span must be selected.
    #[default]
    Full,
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::Core => write!(f, "CORE"),
            GradingMode::Full => write!(f, "FULL"),
        }
    }
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" | "head" => Ok(GradingMode::Core),
            "full" | "span" => Ok(GradingMode::Full),
            other => Err(format!("unknown grading mode: {other}")),
        }
    }
}

/// The two phases of every sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Step {
    Root,
    Subject,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Root => write!(f, "ROOT"),
            Step::Subject => write!(f, "SUBJECT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_mode_display_and_parse() {
        assert_eq!(GradingMode::Core.to_string(), "CORE");
        assert_eq!(GradingMode::Full.to_string(), "FULL");
        assert_eq!("core".parse::<GradingMode>().unwrap(), GradingMode::Core);
        assert_eq!(" FULL ".parse::<GradingMode>().unwrap(), GradingMode::Full);
        assert_eq!("span".parse::<GradingMode>().unwrap(), GradingMode::Full);
        assert!("partial".parse::<GradingMode>().is_err());
        assert_eq!(GradingMode::default(), GradingMode::Full);
    }

    #[test]
    fn legacy_singular_key_is_normalized() {
        let key: AnswerKey =
            serde_json::from_str(r#"{"root": 1, "subject": 0, "subjectSpan": [0]}"#).unwrap();
        assert_eq!(key.roots, vec![1]);
        assert_eq!(key.subjects, vec![Some(0)]);
        assert_eq!(key.subject_spans, vec![vec![0]]);

        let imperative: AnswerKey =
            serde_json::from_str(r#"{"root": 0, "subject": null, "subjectSpan": []}"#).unwrap();
        assert_eq!(imperative.subjects, vec![None]);
        assert!(imperative.subject_spans.is_empty());
    }

    #[test]
    fn plural_key_wins_over_singular_fields() {
        let key: AnswerKey =
            serde_json::from_str(r#"{"roots": [2, 5], "root": 2, "subjects": [0, 4]}"#).unwrap();
        assert_eq!(key.roots, vec![2, 5]);
        assert_eq!(key.subjects, vec![Some(0), Some(4)]);
        assert!(key.subject_spans.is_empty());

        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["subjectSpans"], serde_json::json!([]));
        assert!(json.get("root").is_none());
    }

    #[test]
    fn sentence_deserializes_analysis_json() {
        let json = r#"{
            "id": 0,
            "text": "The dog barks.",
            "tokens": [
                {"id": 0, "text": "The", "start": 0, "end": 3, "pos": "DET", "tag": "DT", "dep": "det"},
                {"id": 1, "text": "dog", "start": 4, "end": 7, "pos": "NOUN", "tag": "NN", "dep": "nsubj"},
                {"id": 2, "text": "barks", "start": 8, "end": 13, "pos": "VERB", "tag": "VBZ", "dep": "ROOT"}
            ],
            "key": {"roots": [2], "subjects": [1], "subjectSpans": [[0, 1]]}
        }"#;
        let sentence: Sentence = serde_json::from_str(json).unwrap();
        assert_eq!(sentence.tokens.len(), 3);
        assert_eq!(sentence.key.roots, vec![2]);
        assert_eq!(sentence.key.subjects, vec![Some(1)]);
        assert_eq!(sentence.key.subject_spans, vec![vec![0, 1]]);
        assert_eq!(sentence.token_text(2), "barks");
        assert_eq!(sentence.token_text(9), "???");
    }

    #[test]
    fn answer_key_accepts_null_subject_and_missing_spans() {
        let key: AnswerKey = serde_json::from_str(r#"{"roots": [0], "subjects": [null]}"#).unwrap();
        assert_eq!(key.subjects, vec![None]);
        assert!(key.subject_spans.is_empty());
    }
}
