//! The `verbgravity summary` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use verbgravity_core::report::QuizReport;
use verbgravity_core::statistics::{QuizSummary, StepMiss};
use verbgravity_report::write_html_report;

use super::parse_mode;

pub fn execute(
    report_path: PathBuf,
    format: String,
    mode: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut report = QuizReport::load_json(&report_path)?;

    if let Some(mode) = mode {
        let mode = parse_mode(&mode)?;
        report.summary = report.summary_under(mode);
        report.grading_mode = mode;
    }

    match format.as_str() {
        "table" => print_summary(&report.summary),
        "markdown" => print!("{}", report.to_markdown()),
        "html" => {
            let path = output.unwrap_or_else(|| report_path.with_extension("html"));
            write_html_report(&report, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        other => anyhow::bail!("unknown format: '{other}' (expected table, markdown, or html)"),
    }

    Ok(())
}

/// Print the score table and the missed-sentence list to stderr.
pub(crate) fn print_summary(summary: &QuizSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Correct", "Accuracy"]);
    let total = summary.total_sentences;
    for (label, correct, out_of, accuracy) in [
        ("Root", summary.root_correct, total, summary.root_accuracy),
        ("Subject", summary.subject_correct, total, summary.subject_accuracy),
        (
            "Overall",
            summary.root_correct + summary.subject_correct,
            total * 2,
            summary.overall_accuracy,
        ),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{correct} / {out_of}")),
            Cell::new(format!("{accuracy}%")),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "{} ({} mode, {} sentences)",
        summary.grade, summary.grading_mode, summary.total_sentences
    );

    if summary.missed.is_empty() {
        return;
    }

    let mut missed = Table::new();
    missed.set_header(vec!["#", "Sentence", "Root", "Subject", "Reviewed"]);
    for m in &summary.missed {
        let detail = |miss: &Option<StepMiss>| {
            miss.as_ref()
                .map(|s| format!("{} → {}", s.wrong, s.correct))
                .unwrap_or_default()
        };
        missed.add_row(vec![
            Cell::new(m.index + 1),
            Cell::new(&m.text),
            Cell::new(detail(&m.root)),
            Cell::new(detail(&m.subject)),
            Cell::new(if m.is_reviewed { "yes" } else { "" }),
        ]);
    }
    eprintln!("\nMissed sentences:\n{missed}");
}
