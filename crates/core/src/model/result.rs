use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ExamId, UserId};

/// Storage identifier for a persisted exam result.
///
/// NOTE: `i64` to match `SQLite` row ids; assigned by the result sink on
/// append.
pub type ExamResultId = i64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamResultError {
    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountExceedsTotal { correct: u32, total: u32 },
}

/// Outcome of one completed exam session.
///
/// Built exactly once, after scoring, and immutable from then on. It carries
/// the exam title alongside the exam id so the record stays readable even if
/// the set is later deleted or renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    user_id: UserId,
    exam_id: ExamId,
    exam_title: String,
    total_questions: u32,
    correct_answers: u32,
    completed_at: DateTime<Utc>,
}

impl ExamResult {
    /// Creates a result record.
    ///
    /// # Errors
    ///
    /// Returns `ExamResultError::CountExceedsTotal` if the correct count is
    /// larger than the question count.
    pub fn new(
        user_id: UserId,
        exam_id: ExamId,
        exam_title: impl Into<String>,
        total_questions: u32,
        correct_answers: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ExamResultError> {
        if correct_answers > total_questions {
            return Err(ExamResultError::CountExceedsTotal {
                correct: correct_answers,
                total: total_questions,
            });
        }

        Ok(Self {
            user_id,
            exam_id,
            exam_title: exam_title.into(),
            total_questions,
            correct_answers,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn exam_title(&self) -> &str {
        &self.exam_title
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
