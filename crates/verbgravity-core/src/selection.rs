//! Selection tracking for the current step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::TokenId;
use crate::state::{Feedback, QuizState};

/// Token ids toggled on for the current step, kept in pick order.
///
/// Order only matters for "first selected" lookups; grading compares the
/// selection as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<TokenId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `id`. Returns `true` if the token is now selected.
    pub fn toggle(&mut self, id: TokenId) -> bool {
        if let Some(pos) = self.ids.iter().position(|&t| t == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The earliest token still selected.
    pub fn first(&self) -> Option<TokenId> {
        self.ids.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_set(&self) -> BTreeSet<TokenId> {
        self.ids.iter().copied().collect()
    }

    /// Set equality against the expected answer: same size, same members.
    pub fn matches(&self, expected: &BTreeSet<TokenId>) -> bool {
        self.ids.len() == expected.len() && self.ids.iter().all(|id| expected.contains(id))
    }

    /// The first selected token that is not part of `expected`, falling back
    /// to the first selected token when every pick is valid but some are
    /// missing.
    pub fn first_offender(&self, expected: &BTreeSet<TokenId>) -> Option<TokenId> {
        self.ids
            .iter()
            .copied()
            .find(|id| !expected.contains(id))
            .or_else(|| self.first())
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

fn selection_message(count: usize) -> String {
    match count {
        0 => "Nothing selected. Pick the words you want to check.".to_string(),
        1 => "1 word selected. Press check when you are ready.".to_string(),
        n => format!("{n} words selected. Press check when you are ready."),
    }
}

/// `SELECT_TOKEN`: toggle a token unless the step is already answered.
pub(crate) fn select_token(state: &QuizState, id: TokenId) -> QuizState {
    if state.is_answered_correctly() {
        return state.clone();
    }

    let mut next = state.clone();
    next.selection.toggle(id);
    next.is_checked = false;
    next.feedback = Feedback::info(selection_message(next.selection.len()));
    next
}
