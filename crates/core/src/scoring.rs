//! Pure scoring over an exam snapshot and a finished answer sheet.
//!
//! Kept free of state and I/O so the session engine can call it exactly once
//! and tests can exercise it in isolation.

use crate::model::{AnswerSheet, Exam};

/// Correct-count over total-count for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    /// Percentage of correct answers, rounded to the nearest integer.
    /// An empty exam scores 0.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.correct * 200 + self.total) / (self.total * 2)
    }
}

/// Awards one point per question whose recorded selection equals the
/// designated correct label exactly. Unanswered questions score nothing; the
/// sheet cannot add points for questions outside the exam because only the
/// exam's own question list is walked.
#[must_use]
pub fn score_exam(exam: &Exam, answers: &AnswerSheet) -> Score {
    let mut correct = 0_u32;
    for question in exam.questions() {
        if answers.selected(question.id()) == Some(question.correct_option()) {
            correct = correct.saturating_add(1);
        }
    }

    Score {
        correct,
        total: u32::try_from(exam.question_count()).unwrap_or(u32::MAX),
    }
}
