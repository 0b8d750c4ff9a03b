//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{ExamError, ExamResultError, QuestionError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the exam session engine and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Session entry was requested but no exam is flagged live.
    #[error("no exam is currently live")]
    NoLiveExam,

    /// The live exam has no questions to sit.
    #[error("the live exam has no questions")]
    EmptyExam,

    /// Submission was requested before the session reached `Finished`.
    #[error("session has not finished, nothing to submit")]
    NotFinished,

    /// A submission is already pending for this session.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error(transparent)]
    Result(#[from] ExamResultError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Exam(#[from] ExamError),

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ResultsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    User(#[from] UserError),
}
