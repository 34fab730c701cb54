//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use verbgravity_core::report::QuizReport;
use verbgravity_core::statistics::{MissedSentence, StepMiss};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from a quiz report.
pub fn generate_html(report: &QuizReport) -> String {
    let s = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>verbgravity: {}% ({})</title>\n",
        s.overall_accuracy, s.grading_mode
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!(
        "<div class=\"grade {}\">{}</div>\n",
        s.grade.class(),
        html_escape(s.grade.label())
    ));
    html.push_str(&format!(
        "<div class=\"score\"><span class=\"value\">{}</span>%<p>overall accuracy</p></div>\n",
        s.overall_accuracy
    ));
    let session = report
        .session_id
        .as_deref()
        .map(|id| format!(" | session {}", html_escape(id)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\">{} sentences | {} mode | {}{}</p>\n",
        s.total_sentences,
        s.grading_mode,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        session
    ));
    html.push_str("</header>\n");

    // Per-category stats
    html.push_str("<section class=\"stats\">\n");
    html.push_str("<table>\n");
    html.push_str("<thead><tr><th>Category</th><th>Correct</th><th>Accuracy</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (label, correct, accuracy) in [
        ("Root (main verb)", s.root_correct, s.root_accuracy),
        ("Subject", s.subject_correct, s.subject_accuracy),
    ] {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{} / {}</td><td>{}%</td></tr>\n",
            label, correct, s.total_sentences, accuracy
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Missed sentences
    if !s.missed.is_empty() {
        html.push_str("<section class=\"missed\">\n");
        html.push_str(&format!("<h2>Missed sentences ({})</h2>\n", s.missed.len()));
        html.push_str("<ol class=\"missed-list\">\n");
        for m in &s.missed {
            html.push_str(&missed_item(m));
        }
        html.push_str("</ol>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

fn missed_item(m: &MissedSentence) -> String {
    let mut item = format!("<li value=\"{}\">\n", m.index + 1);
    item.push_str(&format!("<p class=\"sentence\">{}</p>\n", html_escape(&m.text)));

    item.push_str("<div class=\"badges\">");
    if m.is_reviewed {
        item.push_str("<span class=\"badge reviewed\">reviewed</span>");
    }
    if m.root.is_some() {
        item.push_str("<span class=\"badge root\">root</span>");
    }
    if m.subject.is_some() {
        item.push_str("<span class=\"badge subject\">subject</span>");
    }
    item.push_str("</div>\n");

    for (label, miss) in [("Root", &m.root), ("Subject", &m.subject)] {
        if let Some(StepMiss { wrong, correct }) = miss {
            item.push_str(&format!(
                "<div class=\"detail\">{}: <span class=\"wrong\">{}</span> → <span class=\"right\">{}</span></div>\n",
                label,
                html_escape(wrong),
                html_escape(correct)
            ));
        }
    }

    item.push_str("</li>\n");
    item
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &QuizReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --right: #16a34a; --wrong: #dc2626; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --right: #4ade80; --wrong: #f87171; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0 auto; padding: 2rem; max-width: 48rem; background: var(--bg); color: var(--fg); }
header { text-align: center; }
.grade { display: inline-block; padding: 0.25rem 1rem; border-radius: 999px; font-weight: bold; }
.grade.excellent { background: #fef3c7; color: #92400e; }
.grade.good { background: #dcfce7; color: #166534; }
.grade.fair { background: #dbeafe; color: #1e40af; }
.grade.needs-work { background: #fde2e2; color: #991b1b; }
.score .value { font-size: 3rem; font-weight: bold; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.missed-list li { margin: 1rem 0; padding: 0.75rem; border: 1px solid var(--border); border-radius: 8px; }
.sentence { margin: 0 0 0.5rem; }
.badge { font-size: 0.75rem; padding: 0.1rem 0.5rem; margin-right: 0.25rem; border-radius: 4px; background: var(--border); }
.badge.reviewed { background: #dcfce7; color: #166534; }
.wrong { color: var(--wrong); }
.right { color: var(--right); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
