//! Summary statistics for a finished quiz.

use serde::{Deserialize, Serialize};

use crate::answer_key;
use crate::ledger::{Mark, ResultRecord, WrongAnswer};
use crate::model::{GradingMode, Sentence};

const OMITTED: &str = "(omitted)";

/// Overall grade band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl Grade {
    pub fn from_accuracy(accuracy: u32) -> Self {
        match accuracy {
            90.. => Grade::Excellent,
            70..=89 => Grade::Good,
            50..=69 => Grade::Fair,
            _ => Grade::NeedsWork,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent!",
            Grade::Good => "Well done!",
            Grade::Fair => "Almost there!",
            Grade::NeedsWork => "Keep practising!",
        }
    }

    /// Short CSS-friendly class name.
    pub fn class(&self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Fair => "fair",
            Grade::NeedsWork => "needs-work",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// "What you picked → what was expected" for one missed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMiss {
    pub wrong: String,
    pub correct: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedSentence {
    pub index: usize,
    pub text: String,
    pub is_reviewed: bool,
    /// Present only when the root was answered wrong on the first attempt.
    pub root: Option<StepMiss>,
    pub subject: Option<StepMiss>,
}

/// Scores and missed sentences for a quiz run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub total_sentences: usize,
    pub grading_mode: GradingMode,
    pub root_correct: usize,
    pub subject_correct: usize,
    pub root_accuracy: u32,
    pub subject_accuracy: u32,
    pub overall_accuracy: u32,
    pub grade: Grade,
    pub missed: Vec<MissedSentence>,
}

fn percent(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

fn wrong_text(sentence: &Sentence, mark: Mark) -> String {
    match mark.wrong_answer() {
        Some(WrongAnswer::Token(id)) => sentence.token_text(id).to_string(),
        Some(WrongAnswer::ClaimedOmission) => OMITTED.to_string(),
        None => "-".to_string(),
    }
}

fn correct_root_text(sentence: &Sentence) -> String {
    sentence
        .key
        .roots
        .iter()
        .map(|&id| sentence.token_text(id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn correct_subject_text(sentence: &Sentence, mode: GradingMode) -> String {
    let expected = answer_key::expected_subjects(&sentence.key, mode);
    if expected.is_empty() {
        return OMITTED.to_string();
    }
    expected
        .iter()
        .map(|&id| sentence.token_text(id))
        .collect::<Vec<_>>()
        .join(" ")
}

impl QuizSummary {
    /// Compute the summary. Records missing from `results` count as
    /// unanswered.
    pub fn compute(sentences: &[Sentence], results: &[ResultRecord], mode: GradingMode) -> Self {
        let total = sentences.len();
        let record_at = |i: usize| results.get(i).cloned().unwrap_or_default();

        let root_correct = (0..total).filter(|&i| record_at(i).root().is_correct()).count();
        let subject_correct = (0..total)
            .filter(|&i| record_at(i).subject().is_correct())
            .count();
        let overall_accuracy = percent(root_correct + subject_correct, total * 2);

        let missed = sentences
            .iter()
            .enumerate()
            .filter_map(|(index, sentence)| {
                let record = record_at(index);
                if record.root().is_correct() && record.subject().is_correct() {
                    return None;
                }
                Some(MissedSentence {
                    index,
                    text: sentence.text.clone(),
                    is_reviewed: record.is_reviewed(),
                    root: record.root().is_incorrect().then(|| StepMiss {
                        wrong: wrong_text(sentence, record.root()),
                        correct: correct_root_text(sentence),
                    }),
                    subject: record.subject().is_incorrect().then(|| StepMiss {
                        wrong: wrong_text(sentence, record.subject()),
                        correct: correct_subject_text(sentence, mode),
                    }),
                })
            })
            .collect();

        Self {
            total_sentences: total,
            grading_mode: mode,
            root_correct,
            subject_correct,
            root_accuracy: percent(root_correct, total),
            subject_accuracy: percent(subject_correct, total),
            overall_accuracy,
            grade: Grade::from_accuracy(overall_accuracy),
            missed,
        }
    }

    /// Missed sentences not yet fixed in review mode.
    pub fn unreviewed(&self) -> impl Iterator<Item = &MissedSentence> {
        self.missed.iter().filter(|m| !m.is_reviewed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, Step, Token};

    fn sentence(words: &[&str], key: AnswerKey) -> Sentence {
        Sentence {
            id: 0,
            text: words.join(" "),
            tokens: words
                .iter()
                .enumerate()
                .map(|(i, w)| Token {
                    id: i as u32,
                    text: w.to_string(),
                    pos: String::new(),
                    tag: String::new(),
                    dep: String::new(),
                })
                .collect(),
            key,
        }
    }

    fn record(root: Mark, subject: Mark) -> ResultRecord {
        let mut r = ResultRecord::new();
        r.lock_first_attempt(Step::Root, root);
        r.lock_first_attempt(Step::Subject, subject);
        r
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(Grade::from_accuracy(100), Grade::Excellent);
        assert_eq!(Grade::from_accuracy(90), Grade::Excellent);
        assert_eq!(Grade::from_accuracy(89), Grade::Good);
        assert_eq!(Grade::from_accuracy(70), Grade::Good);
        assert_eq!(Grade::from_accuracy(50), Grade::Fair);
        assert_eq!(Grade::from_accuracy(49), Grade::NeedsWork);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let summary = QuizSummary::compute(&[], &[], GradingMode::Full);
        assert_eq!(summary.overall_accuracy, 0);
        assert_eq!(summary.grade, Grade::NeedsWork);
        assert!(summary.missed.is_empty());
    }

    #[test]
    fn accuracies_and_missed_details() {
        let sentences = vec![
            sentence(
                &["The", "dog", "barks"],
                AnswerKey {
                    roots: vec![2],
                    subjects: vec![Some(1)],
                    subject_spans: vec![vec![0, 1]],
                },
            ),
            sentence(
                &["Close", "the", "door"],
                AnswerKey {
                    roots: vec![0],
                    subjects: vec![None],
                    subject_spans: vec![],
                },
            ),
            sentence(
                &["Birds", "sing"],
                AnswerKey {
                    roots: vec![1],
                    subjects: vec![Some(0)],
                    subject_spans: vec![vec![0]],
                },
            ),
        ];
        let results = vec![
            record(Mark::incorrect(WrongAnswer::Token(1)), Mark::Correct),
            record(Mark::Correct, Mark::incorrect(WrongAnswer::Token(2))),
            record(Mark::Correct, Mark::Correct),
        ];

        let summary = QuizSummary::compute(&sentences, &results, GradingMode::Full);
        assert_eq!(summary.root_correct, 2);
        assert_eq!(summary.subject_correct, 2);
        assert_eq!(summary.root_accuracy, 67);
        assert_eq!(summary.overall_accuracy, 67);
        assert_eq!(summary.grade, Grade::Fair);
        assert_eq!(summary.missed.len(), 2);

        let first = &summary.missed[0];
        assert_eq!(
            first.root,
            Some(StepMiss {
                wrong: "dog".into(),
                correct: "barks".into()
            })
        );
        assert!(first.subject.is_none());

        let second = &summary.missed[1];
        assert_eq!(second.subject.as_ref().unwrap().correct, "(omitted)");
        assert_eq!(second.subject.as_ref().unwrap().wrong, "door");
    }

    #[test]
    fn claimed_omission_and_restored_misses_render() {
        let sentences = vec![sentence(
            &["Time", "flies"],
            AnswerKey {
                roots: vec![1],
                subjects: vec![Some(0)],
                subject_spans: vec![vec![0]],
            },
        )];
        let results = vec![record(
            Mark::Incorrect { wrong: None },
            Mark::incorrect(WrongAnswer::ClaimedOmission),
        )];
        let summary = QuizSummary::compute(&sentences, &results, GradingMode::Core);
        let missed = &summary.missed[0];
        assert_eq!(missed.root.as_ref().unwrap().wrong, "-");
        assert_eq!(missed.subject.as_ref().unwrap().wrong, "(omitted)");
        assert_eq!(missed.subject.as_ref().unwrap().correct, "Time");
        assert_eq!(summary.unreviewed().count(), 1);
    }

    #[test]
    fn unanswered_sentences_count_as_missed() {
        let sentences = vec![sentence(
            &["Run"],
            AnswerKey {
                roots: vec![0],
                subjects: vec![None],
                subject_spans: vec![],
            },
        )];
        let summary = QuizSummary::compute(&sentences, &[], GradingMode::Full);
        assert_eq!(summary.missed.len(), 1);
        assert!(summary.missed[0].root.is_none());
    }
}
