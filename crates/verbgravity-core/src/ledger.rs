//! Per-sentence result records with first-attempt locking.
//!
//! Scoring only ever reflects the learner's first check of each step. The
//! single mutation site for scoring fields is
//! [`ResultRecord::lock_first_attempt`], which refuses to overwrite a field
//! that is already set. The review flag is the only field that may change
//! afterwards, and only from `false` to `true`.

use serde::{Deserialize, Serialize};

use crate::model::{Step, TokenId};
use crate::traits::ProgressRecord;

/// What the learner got wrong on a first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrongAnswer {
    /// A token that was selected but should not have been (or the first
    /// pick of an incomplete selection).
    Token(TokenId),
    /// The learner claimed the subject was omitted when it was not.
    ClaimedOmission,
}

/// First-attempt outcome of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Mark {
    #[default]
    Unset,
    Correct,
    /// `wrong` is `None` for records restored from saved progress.
    Incorrect { wrong: Option<WrongAnswer> },
}

impl Mark {
    pub fn incorrect(wrong: WrongAnswer) -> Self {
        Mark::Incorrect { wrong: Some(wrong) }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Mark::Unset)
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Mark::Correct)
    }

    pub fn is_incorrect(&self) -> bool {
        matches!(self, Mark::Incorrect { .. })
    }

    /// Tri-state view: `None` while unset.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Mark::Unset => None,
            Mark::Correct => Some(true),
            Mark::Incorrect { .. } => Some(false),
        }
    }

    pub fn wrong_answer(&self) -> Option<WrongAnswer> {
        match self {
            Mark::Incorrect { wrong } => *wrong,
            _ => None,
        }
    }
}

/// Scoring record for one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    root: Mark,
    subject: Mark,
    is_reviewed: bool,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record reconstructed from saved progress. Restored misses carry no
    /// wrong-token detail.
    pub fn restored(root_correct: bool, subject_correct: bool) -> Self {
        let mut record = Self::new();
        record.lock_first_attempt(Step::Root, restored_mark(root_correct));
        record.lock_first_attempt(Step::Subject, restored_mark(subject_correct));
        record
    }

    pub fn root(&self) -> Mark {
        self.root
    }

    pub fn subject(&self) -> Mark {
        self.subject
    }

    pub fn mark(&self, step: Step) -> Mark {
        match step {
            Step::Root => self.root,
            Step::Subject => self.subject,
        }
    }

    pub fn is_reviewed(&self) -> bool {
        self.is_reviewed
    }

    /// Is this the first check of `step` for the sentence?
    pub fn is_first_attempt(&self, step: Step) -> bool {
        !self.mark(step).is_set()
    }

    /// Record the outcome of a check if, and only if, it is the first one.
    /// Returns whether the mark was stored.
    pub fn lock_first_attempt(&mut self, step: Step, mark: Mark) -> bool {
        if !self.is_first_attempt(step) || !mark.is_set() {
            return false;
        }
        match step {
            Step::Root => self.root = mark,
            Step::Subject => self.subject = mark,
        }
        true
    }

    pub fn mark_reviewed(&mut self) {
        self.is_reviewed = true;
    }

    /// Either step was missed on the first attempt.
    pub fn is_missed(&self) -> bool {
        self.root.is_incorrect() || self.subject.is_incorrect()
    }

    /// Missed and not yet fixed in review mode.
    pub fn needs_review(&self) -> bool {
        self.is_missed() && !self.is_reviewed
    }

    /// Both steps have a first-attempt outcome.
    pub fn is_complete(&self) -> bool {
        self.root.is_set() && self.subject.is_set()
    }
}

fn restored_mark(correct: bool) -> Mark {
    if correct {
        Mark::Correct
    } else {
        Mark::Incorrect { wrong: None }
    }
}

/// One record per sentence. The length is fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: Vec<ResultRecord>,
}

impl Ledger {
    pub fn new(sentence_count: usize) -> Self {
        Self {
            records: vec![ResultRecord::new(); sentence_count],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultRecord> {
        self.records.get(index)
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> Option<&mut ResultRecord> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn to_vec(&self) -> Vec<ResultRecord> {
        self.records.clone()
    }

    /// Missed records that have not been fixed in review mode yet.
    pub fn unreviewed_count(&self) -> usize {
        self.records.iter().filter(|r| r.needs_review()).count()
    }

    /// Replay saved progress into the ledger. Out-of-range indices are
    /// skipped; a repeated index keeps its first entry.
    pub fn restore(&mut self, progress: &[ProgressRecord]) -> usize {
        let mut applied = 0;
        for item in progress {
            let Some(record) = self.records.get_mut(item.sentence_index) else {
                tracing::warn!(
                    "saved progress for sentence {} is out of range ({} sentences), skipping",
                    item.sentence_index,
                    self.records.len()
                );
                continue;
            };
            let root = record.lock_first_attempt(Step::Root, restored_mark(item.root_correct));
            let subject =
                record.lock_first_attempt(Step::Subject, restored_mark(item.subject_correct));
            if root || subject {
                applied += 1;
            }
        }
        applied
    }
}

impl From<Vec<ResultRecord>> for Ledger {
    fn from(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(index: usize, root: bool, subject: bool) -> ProgressRecord {
        ProgressRecord {
            sentence_index: index,
            root_answer: None,
            root_correct: root,
            subject_answer: None,
            subject_correct: subject,
        }
    }

    #[test]
    fn first_attempt_is_locked() {
        let mut record = ResultRecord::new();
        assert!(record.lock_first_attempt(Step::Root, Mark::incorrect(WrongAnswer::Token(4))));
        assert!(!record.lock_first_attempt(Step::Root, Mark::incorrect(WrongAnswer::Token(7))));
        assert!(!record.lock_first_attempt(Step::Root, Mark::Correct));
        assert_eq!(
            record.root().wrong_answer(),
            Some(WrongAnswer::Token(4))
        );
        assert_eq!(record.root().as_bool(), Some(false));
        assert!(record.subject().as_bool().is_none());
    }

    #[test]
    fn unset_mark_cannot_be_locked() {
        let mut record = ResultRecord::new();
        assert!(!record.lock_first_attempt(Step::Subject, Mark::Unset));
        assert!(record.is_first_attempt(Step::Subject));
    }

    #[test]
    fn review_flag_only_counts_missed_records() {
        let mut ledger = Ledger::from(vec![
            ResultRecord::restored(true, true),
            ResultRecord::restored(false, true),
            ResultRecord::restored(true, false),
        ]);
        assert_eq!(ledger.unreviewed_count(), 2);

        ledger.record_mut(1).unwrap().mark_reviewed();
        assert_eq!(ledger.unreviewed_count(), 1);
        assert!(ledger.get(1).unwrap().is_missed());
        assert!(!ledger.get(1).unwrap().needs_review());
    }

    #[test]
    fn restore_replays_progress_and_skips_bad_indices() {
        let mut ledger = Ledger::new(3);
        let applied = ledger.restore(&[
            progress(0, true, true),
            progress(2, false, true),
            progress(2, true, true),
            progress(7, true, true),
        ]);
        assert_eq!(applied, 2);
        assert_eq!(ledger.len(), 3);
        assert!(ledger.get(0).unwrap().is_complete());
        assert_eq!(ledger.get(2).unwrap().root(), Mark::Incorrect { wrong: None });
        assert!(!ledger.get(1).unwrap().is_complete());
    }

    #[test]
    fn record_serializes_with_tagged_marks() {
        let mut record = ResultRecord::new();
        record.lock_first_attempt(Step::Root, Mark::Correct);
        record.lock_first_attempt(Step::Subject, Mark::incorrect(WrongAnswer::ClaimedOmission));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["root"]["status"], "correct");
        assert_eq!(json["subject"]["status"], "incorrect");
        assert_eq!(json["subject"]["wrong"], "claimed_omission");

        let back: ResultRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
