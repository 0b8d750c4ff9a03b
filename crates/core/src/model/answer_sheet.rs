use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ids::QuestionId;
use crate::model::question::OptionLabel;

/// Last-selected-option record for one session.
///
/// Holds at most one entry per question. Selecting again for the same
/// question overwrites the previous choice; reselecting the same label is a
/// no-op. The engine only ever inserts entries for questions that belong to
/// the session's exam snapshot, so the sheet never references a foreign
/// question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    entries: HashMap<QuestionId, OptionLabel>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selection for a question, replacing any earlier one.
    pub fn select(&mut self, question: QuestionId, label: OptionLabel) {
        self.entries.insert(question, label);
    }

    /// The option last selected for a question, if any.
    #[must_use]
    pub fn selected(&self, question: QuestionId) -> Option<OptionLabel> {
        self.entries.get(&question).copied()
    }

    /// True when the question has a recorded selection.
    #[must_use]
    pub fn has_answer(&self, question: QuestionId) -> bool {
        self.entries.contains_key(&question)
    }

    /// Number of questions with a recorded selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over recorded selections in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, OptionLabel)> + '_ {
        self.entries.iter().map(|(q, label)| (*q, *label))
    }
}
