use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{ExamId, QuestionId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam title cannot be empty")]
    EmptyTitle,

    #[error("time limit must be between 1 and {MAX_TIME_LIMIT_MINUTES} minutes, got {0}")]
    InvalidTimeLimit(u32),

    #[error("duplicate question id {0} in exam")]
    DuplicateQuestionId(QuestionId),
}

/// Upper bound on an exam's time limit, in minutes.
pub const MAX_TIME_LIMIT_MINUTES: u32 = 24 * 60;

//
// ─── EXAM ──────────────────────────────────────────────────────────────────────
//

/// A question set: an ordered sequence of questions with a per-set time limit
/// and a `live` flag.
///
/// At most one exam in the whole store carries `is_live = true`; that
/// invariant is enforced by the store's `set_live` operation, not here. The
/// session engine only ever reads an exam — it clones a snapshot at entry and
/// never sees later edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    id: ExamId,
    title: String,
    description: String,
    category: Option<String>,
    time_limit_minutes: u32,
    is_live: bool,
    questions: Vec<Question>,
}

impl Exam {
    /// Creates a validated exam.
    ///
    /// An empty question list is allowed here so the admin editor can save a
    /// draft before authoring questions; the session engine refuses to start
    /// over an empty set.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` when the title is blank, the time limit is out of
    /// range, or two questions share an id.
    pub fn new(
        id: ExamId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: Option<String>,
        time_limit_minutes: u32,
        is_live: bool,
        questions: Vec<Question>,
    ) -> Result<Self, ExamError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ExamError::EmptyTitle);
        }
        if time_limit_minutes == 0 || time_limit_minutes > MAX_TIME_LIMIT_MINUTES {
            return Err(ExamError::InvalidTimeLimit(time_limit_minutes));
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(ExamError::DuplicateQuestionId(question.id()));
            }
        }

        Ok(Self {
            id,
            title,
            description: description.into(),
            category,
            time_limit_minutes,
            is_live,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> ExamId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    /// The full time budget in seconds, used to seed a session clock.
    #[must_use]
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.is_live
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Question at the given position, if in bounds.
    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// True when the given question belongs to this exam.
    #[must_use]
    pub fn contains_question(&self, id: QuestionId) -> bool {
        self.questions.iter().any(|q| q.id() == id)
    }

    /// Flip the live flag on. Store-layer use only; call sites must clear the
    /// flag on every other exam in the same write.
    pub fn set_live(&mut self, live: bool) {
        self.is_live = live;
    }

    /// Replace the question list, revalidating id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::DuplicateQuestionId` if two questions share an id.
    pub fn replace_questions(&mut self, questions: Vec<Question>) -> Result<(), ExamError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(ExamError::DuplicateQuestionId(question.id()));
            }
        }
        self.questions = questions;
        Ok(())
    }
}
