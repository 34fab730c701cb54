//! Quiz report with JSON persistence and markdown output.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::ResultRecord;
use crate::model::{GradingMode, Sentence};
use crate::statistics::QuizSummary;

/// Everything needed to show or re-score a finished quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Backend session the quiz was saved under, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    pub grading_mode: GradingMode,
    pub sentences: Vec<Sentence>,
    pub results: Vec<ResultRecord>,
    pub summary: QuizSummary,
}

impl QuizReport {
    pub fn new(
        sentences: Vec<Sentence>,
        results: Vec<ResultRecord>,
        grading_mode: GradingMode,
        session_id: Option<String>,
    ) -> Self {
        let summary = QuizSummary::compute(&sentences, &results, grading_mode);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session_id,
            grading_mode,
            sentences,
            results,
            summary,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// The summary as shown under `mode`.
    ///
    /// Scores are first-attempt outcomes and never move; only the expected
    /// subject text of missed sentences follows the mode.
    pub fn summary_under(&self, mode: GradingMode) -> QuizSummary {
        QuizSummary::compute(&self.sentences, &self.results, mode)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let s = &self.summary;
        let mut md = String::new();

        md.push_str(&format!(
            "## {} {}% overall ({} mode)\n\n",
            s.grade, s.overall_accuracy, s.grading_mode
        ));
        md.push_str("| Category | Correct | Accuracy |\n");
        md.push_str("|----------|---------|----------|\n");
        md.push_str(&format!(
            "| Root | {} / {} | {}% |\n",
            s.root_correct, s.total_sentences, s.root_accuracy
        ));
        md.push_str(&format!(
            "| Subject | {} / {} | {}% |\n\n",
            s.subject_correct, s.total_sentences, s.subject_accuracy
        ));

        if s.missed.is_empty() {
            md.push_str("No missed sentences.\n");
            return md;
        }

        md.push_str(&format!("### Missed sentences ({})\n\n", s.missed.len()));
        for m in &s.missed {
            let reviewed = if m.is_reviewed { " (reviewed)" } else { "" };
            md.push_str(&format!("- **#{}** {}{}\n", m.index + 1, m.text, reviewed));
            if let Some(root) = &m.root {
                md.push_str(&format!("  - root: {} → {}\n", root.wrong, root.correct));
            }
            if let Some(subject) = &m.subject {
                md.push_str(&format!(
                    "  - subject: {} → {}\n",
                    subject.wrong, subject.correct
                ));
            }
        }

        md
    }
}
