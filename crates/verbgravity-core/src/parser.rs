//! Passage loading and validation.
//!
//! Reads analysis JSON from disk, either a full analysis response
//! (`{"sentences": [...], "meta": {...}}`) or a bare sentence array.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{Passage, PassageMeta, Sentence};

/// Parse a single analysis JSON file.
pub fn parse_passage(path: &Path) -> Result<Passage> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read passage file: {}", path.display()))?;

    parse_passage_str(&content, path)
}

/// Parse analysis JSON from a string (useful for testing).
pub fn parse_passage_str(content: &str, source_path: &Path) -> Result<Passage> {
    let value: serde_json::Value = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;

    let mut passage = if value.is_array() {
        let sentences: Vec<Sentence> = serde_json::from_value(value).with_context(|| {
            format!("invalid sentence array: {}", source_path.display())
        })?;
        Passage {
            sentences,
            meta: PassageMeta::default(),
        }
    } else {
        serde_json::from_value(value)
            .with_context(|| format!("invalid analysis response: {}", source_path.display()))?
    };

    if passage.meta.total_sentences == 0 {
        passage.meta.total_sentences = passage.sentences.len();
    }
    Ok(passage)
}

/// A warning from passage validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Index of the offending sentence, if applicable.
    pub sentence_index: Option<usize>,
    pub message: String,
}

impl ValidationWarning {
    fn at(index: usize, message: impl Into<String>) -> Self {
        Self {
            sentence_index: Some(index),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sentence_index {
            Some(i) => write!(f, "sentence {}: {}", i + 1, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Check a passage for answer keys the quiz cannot grade.
pub fn validate_passage(passage: &Passage) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if passage.sentences.is_empty() {
        warnings.push(ValidationWarning {
            sentence_index: None,
            message: "passage has no sentences".into(),
        });
    }

    if passage.meta.total_sentences != passage.sentences.len() {
        warnings.push(ValidationWarning {
            sentence_index: None,
            message: format!(
                "meta.totalSentences is {} but the passage has {} sentences",
                passage.meta.total_sentences,
                passage.sentences.len()
            ),
        });
    }

    for (index, sentence) in passage.sentences.iter().enumerate() {
        let mut ids = HashSet::new();
        for token in &sentence.tokens {
            if !ids.insert(token.id) {
                warnings.push(ValidationWarning::at(
                    index,
                    format!("duplicate token id {}", token.id),
                ));
            }
        }

        let key = &sentence.key;
        if key.roots.is_empty() {
            warnings.push(ValidationWarning::at(index, "answer key has no roots"));
        }

        let key_ids = key
            .roots
            .iter()
            .chain(key.subjects.iter().flatten())
            .chain(key.subject_spans.iter().flatten());
        let mut reported = HashSet::new();
        for &id in key_ids {
            if !ids.contains(&id) && reported.insert(id) {
                warnings.push(ValidationWarning::at(
                    index,
                    format!("answer key refers to unknown token id {id}"),
                ));
            }
        }

        if !key.subject_spans.is_empty() && key.subject_spans.len() != key.subjects.len() {
            warnings.push(ValidationWarning::at(
                index,
                format!(
                    "{} subject spans for {} subjects",
                    key.subject_spans.len(),
                    key.subjects.len()
                ),
            ));
        }
    }

    warnings
}
