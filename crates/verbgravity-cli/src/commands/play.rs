//! The `verbgravity play` command: a line-based quiz in the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use verbgravity_backend::{load_config_from, HttpBackend, VerbGravityConfig};
use verbgravity_core::engine::Intent;
use verbgravity_core::model::{GradingMode, Passage, Step, TokenId};
use verbgravity_core::parser;
use verbgravity_core::report::QuizReport;
use verbgravity_core::session::{QuizSession, SessionConfig, SessionEvent};
use verbgravity_core::state::FeedbackKind;
use verbgravity_core::statistics::QuizSummary;
use verbgravity_core::traits::{
    CreateSessionRequest, GradingModeSource, PassageAnalyzer, ProgressRecord, SessionStore,
    SharedMode,
};
use verbgravity_report::write_html_report;

use super::parse_mode;
use super::summary::print_summary;

pub struct PlayArgs {
    pub passage: Option<PathBuf>,
    pub text: Option<String>,
    pub session: Option<String>,
    pub mode: Option<String>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

const HELP: &str = "\
Commands:
  <id> [<id> ...]    toggle token selection (also: s <id> ...)
  c                  check the selection
  o                  the subject is omitted (imperative)
  n                  next step / next sentence
  p                  previous sentence
  j <n> [review]     jump to sentence n, optionally in review mode
  r <n>              review missed sentence n
  f                  finish the quiz
  mode core|full     switch grading mode
  reset              start over
  show               redraw the sentence
  q                  quit without finishing";

const REVIEW_HELP: &str = "Type 'r <n>' to review a missed sentence, or 'q' to finish.";

/// One line of learner input.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Select(Vec<TokenId>),
    Check,
    Omitted,
    Next,
    Prev,
    Jump { index: usize, review: bool },
    Review(usize),
    Finish,
    Mode(GradingMode),
    Reset,
    Show,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::Show);
    };
    let rest: Vec<&str> = words.collect();

    let ids = |words: &[&str]| -> Result<Vec<TokenId>, String> {
        if words.is_empty() {
            return Err("expected at least one token id".into());
        }
        words
            .iter()
            .map(|w| w.parse().map_err(|_| format!("not a token id: '{w}'")))
            .collect()
    };

    match head {
        "s" | "select" => ids(&rest).map(Command::Select),
        "c" | "check" => Ok(Command::Check),
        "o" | "omitted" => Ok(Command::Omitted),
        "n" | "next" => Ok(Command::Next),
        "p" | "prev" => Ok(Command::Prev),
        "j" | "jump" => Ok(Command::Jump {
            index: sentence_index(rest.first(), "usage: j <sentence number> [review]")?,
            review: rest.get(1).is_some_and(|w| *w == "review" || *w == "r"),
        }),
        "r" | "review" => sentence_index(rest.first(), "usage: r <sentence number>")
            .map(Command::Review),
        "f" | "finish" => Ok(Command::Finish),
        "mode" => rest
            .first()
            .ok_or_else(|| "usage: mode core|full".to_string())?
            .parse()
            .map(Command::Mode),
        "reset" => Ok(Command::Reset),
        "show" => Ok(Command::Show),
        "h" | "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        _ if head.chars().all(|c| c.is_ascii_digit()) => {
            let mut all = vec![head];
            all.extend(rest);
            ids(&all).map(Command::Select)
        }
        other => Err(format!("unknown command: '{other}' (type 'help')")),
    }
}

/// A 1-based sentence number from the learner, as a 0-based index.
fn sentence_index(word: Option<&&str>, usage: &str) -> Result<usize, String> {
    let Some(n) = word else {
        return Err(usage.to_string());
    };
    match n.parse::<usize>() {
        Ok(0) => Err("sentence numbers start at 1".into()),
        Ok(number) => Ok(number - 1),
        Err(_) => Err(format!("not a sentence number: '{n}'")),
    }
}

/// Text shown for the current sentence and feedback.
fn render(session: &QuizSession, mode: GradingMode) -> String {
    let state = session.state();
    let Some(sentence) = session.sentences().get(state.sentence_index) else {
        return String::new();
    };

    let mut header = format!(
        "[{}/{}] {} ({mode})",
        state.sentence_index + 1,
        session.sentences().len(),
        state.step
    );
    if state.is_review_mode {
        header.push_str(" review");
    }

    let tokens: Vec<String> = sentence
        .tokens
        .iter()
        .map(|t| {
            let mark = if state.selection.contains(t.id) { "*" } else { "" };
            format!("{}:{}{}", t.id, t.text, mark)
        })
        .collect();

    let prefix = match state.feedback.kind {
        FeedbackKind::Info => "-",
        FeedbackKind::Correct => "✓",
        FeedbackKind::Incorrect => "✗",
    };

    format!(
        "\n{header}\n{}\n  {}\n{prefix} {}",
        sentence.text,
        tokens.join("  "),
        state.feedback.message
    )
}

/// Where the quiz comes from and where its progress goes.
struct Setup {
    passage: Passage,
    mode: GradingMode,
    session_id: Option<String>,
    restored: Vec<ProgressRecord>,
}

async fn setup(args: &PlayArgs, config: &VerbGravityConfig, backend: Option<&HttpBackend>) -> Result<Setup> {
    let mut mode = config.grading_mode;

    if let Some(id) = &args.session {
        let backend = backend.context("--session needs an API: set api_base_url")?;
        let snapshot = backend
            .get_session(id)
            .await?
            .with_context(|| format!("session not found: {id}"))?;
        mode = snapshot.mode;
        let passage = match &args.passage {
            Some(path) => parser::parse_passage(path)?,
            None => backend.analyze(&snapshot.passage_text).await?,
        };
        if passage.sentences.len() != snapshot.total_sentences {
            tracing::warn!(
                expected = snapshot.total_sentences,
                actual = passage.sentences.len(),
                "passage does not match the saved session"
            );
        }
        return Ok(Setup {
            passage,
            mode,
            session_id: Some(snapshot.id),
            restored: snapshot.progress,
        });
    }

    let (passage, text) = match (&args.passage, &args.text) {
        (Some(path), _) => {
            let passage = parser::parse_passage(path)?;
            let text = passage
                .sentences
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            (passage, text)
        }
        (None, Some(text)) => {
            let backend = backend.context("--text needs an API: set api_base_url")?;
            (backend.analyze(text).await?, text.clone())
        }
        (None, None) => anyhow::bail!("one of --passage, --text, or --session is required"),
    };

    // Saving progress is best-effort, so a failing API only costs persistence.
    let session_id = match backend {
        Some(backend) => {
            let request = CreateSessionRequest {
                passage_text: text,
                total_sentences: passage.sentences.len(),
                mode,
            };
            match backend.create_session(&request).await {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("could not create session, progress will not be saved: {e:#}");
                    None
                }
            }
        }
        None => None,
    };

    Ok(Setup {
        passage,
        mode,
        session_id,
        restored: Vec::new(),
    })
}

pub async fn execute(args: PlayArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let backend = config.backend()?.map(Arc::new);

    let mut setup = setup(&args, &config, backend.as_deref()).await?;
    if let Some(mode) = &args.mode {
        setup.mode = parse_mode(mode)?;
    }

    for warning in parser::validate_passage(&setup.passage) {
        tracing::warn!("{warning}");
    }
    anyhow::ensure!(!setup.passage.sentences.is_empty(), "passage has no sentences");

    let mode = Arc::new(SharedMode::new(setup.mode));
    let mut session = QuizSession::new(
        setup.passage.sentences,
        mode.clone(),
        SessionConfig {
            advance_delay: config.advance_delay(),
        },
    );
    if let (Some(backend), Some(id)) = (&backend, &setup.session_id) {
        session = session.with_progress_sink(backend.clone(), id.clone());
        eprintln!("Session: {id}");
    }

    if !setup.restored.is_empty() {
        let resume_at = session.restore(setup.restored);
        let unreviewed = session.state().results.unreviewed_count();
        if resume_at > 0 {
            session.dispatch(Intent::JumpToSentence {
                index: resume_at,
                review: false,
            });
        }
        eprintln!(
            "Restored progress, resuming at sentence {} ({unreviewed} to review).",
            resume_at + 1
        );
    }

    println!("{HELP}");
    println!("{}", render(&session, mode.grading_mode()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut confirming = false;
    let mut finished = false;
    let mut in_summary = false;

    loop {
        let events = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                if in_summary {
                    match parse_command(&line) {
                        Ok(Command::Quit) => break,
                        Ok(Command::Review(index)) if needs_review(&session, index) => {
                            in_summary = false;
                            session.dispatch(Intent::JumpToSentence { index, review: true })
                        }
                        Ok(Command::Review(index)) => {
                            println!("Sentence {} has nothing to review.", index + 1);
                            continue;
                        }
                        _ => {
                            println!("{REVIEW_HELP}");
                            continue;
                        }
                    }
                } else if confirming {
                    confirming = false;
                    if matches!(line.trim(), "y" | "yes") {
                        session.dispatch(Intent::FinishQuiz)
                    } else {
                        println!("Continuing.");
                        Vec::new()
                    }
                } else {
                    match parse_command(&line) {
                        Ok(Command::Quit) => break,
                        Ok(Command::Help) => {
                            println!("{HELP}");
                            continue;
                        }
                        Ok(Command::Mode(new_mode)) => {
                            mode.set(new_mode);
                            tracing::info!(mode = %new_mode, "grading mode changed");
                            Vec::new()
                        }
                        Ok(command) => run_command(&mut session, command),
                        Err(message) => {
                            println!("{message}");
                            continue;
                        }
                    }
                }
            }
            Some(intent) = session.next_deferred() => session.dispatch(intent),
        };

        let mut done = false;
        for event in events {
            match event {
                SessionEvent::SentenceCompleted(record) => {
                    tracing::debug!(sentence = record.sentence_index, "sentence completed");
                }
                SessionEvent::ConfirmFinish => confirming = true,
                SessionEvent::Finished(_) => done = true,
            }
        }

        if !in_summary {
            println!("{}", render(&session, mode.grading_mode()));
        }
        if done {
            finished = true;
            let summary = QuizSummary::compute(
                session.sentences(),
                session.state().results.records(),
                mode.grading_mode(),
            );
            print_summary(&summary);
            if session.state().results.unreviewed_count() == 0 {
                break;
            }
            in_summary = true;
            println!("\n{REVIEW_HELP}");
        } else if confirming {
            println!("This is the first sentence. Finish the quiz now? [y/N]");
        }
    }

    session.flush().await;

    if !finished {
        eprintln!("Quiz ended without finishing.");
        return Ok(());
    }
    write_report(&session, mode.grading_mode(), args.output, &config)
}

fn needs_review(session: &QuizSession, index: usize) -> bool {
    session
        .state()
        .results
        .get(index)
        .is_some_and(|record| record.needs_review())
}

fn run_command(session: &mut QuizSession, command: Command) -> Vec<SessionEvent> {
    match command {
        Command::Select(ids) => {
            let mut events = Vec::new();
            for token in ids {
                events.extend(session.dispatch(Intent::SelectToken { token }));
            }
            events
        }
        Command::Check => session.dispatch(Intent::CheckAnswer),
        Command::Omitted => session.dispatch(Intent::OmittedSubject),
        Command::Next => match session.state().step {
            Step::Root => session.dispatch(Intent::NextStep),
            Step::Subject => session.dispatch(Intent::NextSentence),
        },
        Command::Prev => session.dispatch(Intent::PrevSentence),
        Command::Jump { index, review } => {
            session.dispatch(Intent::JumpToSentence { index, review })
        }
        Command::Review(index) => session.dispatch(Intent::JumpToSentence {
            index,
            review: true,
        }),
        Command::Finish => session.dispatch(Intent::FinishQuiz),
        Command::Reset => session.dispatch(Intent::ResetQuiz),
        Command::Show | Command::Help | Command::Quit | Command::Mode(_) => Vec::new(),
    }
}

/// Save the final ledger, reviews included, as JSON and HTML.
fn write_report(
    session: &QuizSession,
    mode: GradingMode,
    output: Option<PathBuf>,
    config: &VerbGravityConfig,
) -> Result<()> {
    let report = QuizReport::new(
        session.sentences().to_vec(),
        session.state().results.to_vec(),
        mode,
        session.session_id().map(str::to_string),
    );

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let json_path = output.join(format!("quiz-{timestamp}.json"));
    report.save_json(&json_path)?;
    eprintln!("Results saved to: {}", json_path.display());

    let html_path = output.join(format!("quiz-{timestamp}.html"));
    write_html_report(&report, &html_path)?;
    eprintln!("HTML report: {}", html_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selection() {
        assert_eq!(parse_command("3"), Ok(Command::Select(vec![3])));
        assert_eq!(parse_command("0 1 2"), Ok(Command::Select(vec![0, 1, 2])));
        assert_eq!(parse_command("s 4 5"), Ok(Command::Select(vec![4, 5])));
        assert!(parse_command("s").is_err());
        assert!(parse_command("s x").is_err());
    }

    #[test]
    fn parse_navigation() {
        assert_eq!(parse_command("c"), Ok(Command::Check));
        assert_eq!(parse_command(" next "), Ok(Command::Next));
        assert_eq!(parse_command(""), Ok(Command::Show));
        assert_eq!(
            parse_command("j 2 review"),
            Ok(Command::Jump {
                index: 1,
                review: true
            })
        );
        assert_eq!(
            parse_command("j 1"),
            Ok(Command::Jump {
                index: 0,
                review: false
            })
        );
        assert!(parse_command("j 0").is_err());
        assert!(parse_command("j").is_err());
        assert_eq!(parse_command("r 2"), Ok(Command::Review(1)));
        assert!(parse_command("r").is_err());
        assert!(parse_command("review x").is_err());
    }

    #[test]
    fn parse_mode_switch() {
        assert_eq!(parse_command("mode core"), Ok(Command::Mode(GradingMode::Core)));
        assert_eq!(parse_command("mode FULL"), Ok(Command::Mode(GradingMode::Full)));
        assert!(parse_command("mode").is_err());
        assert!(parse_command("mode loud").is_err());
    }

    #[test]
    fn unknown_command() {
        let err = parse_command("dance").unwrap_err();
        assert!(err.contains("unknown command"));
    }
}
