use std::sync::Arc;

use exam_core::model::{ExamResult, ExamResultId, UserId};
use exam_core::time::Clock;
use storage::repository::{ExamRepository, ResultSink};

use crate::error::SessionError;
use crate::session::engine::ExamSession;
use crate::session::settings::SessionSettings;

/// Opens sessions against the live exam and persists their results.
///
/// The workflow is the only writer of a session's submission state. A failed
/// append releases the submission slot and leaves the session `Finished`
/// with its score intact, so the host can retry; a successful append seals
/// the session and repeat calls return the same stored id without touching
/// the sink again.
#[derive(Clone)]
pub struct SessionWorkflow {
    clock: Clock,
    exams: Arc<dyn ExamRepository>,
    results: Arc<dyn ResultSink>,
    settings: SessionSettings,
}

impl SessionWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        exams: Arc<dyn ExamRepository>,
        results: Arc<dyn ResultSink>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            clock,
            exams,
            results,
            settings,
        }
    }

    /// Open a session for the given user over whatever exam is live right
    /// now. The session holds a snapshot; toggling another exam live later
    /// does not affect runs already in flight.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoLiveExam` when no exam is flagged live,
    /// `SessionError::EmptyExam` when the live exam carries no questions,
    /// and `SessionError::Storage` on repository failure.
    pub async fn enter(&self, user_id: UserId) -> Result<ExamSession, SessionError> {
        let exam = self
            .exams
            .get_live()
            .await?
            .ok_or(SessionError::NoLiveExam)?;
        ExamSession::new(user_id, exam, self.settings, self.clock.now())
    }

    /// Persist a finished session's result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` before the session has a score,
    /// `SessionError::SubmissionInFlight` while a previous call holds the
    /// submission slot, and `SessionError::Storage` when the sink rejects
    /// the append (the session stays retryable).
    pub async fn submit(&self, session: &mut ExamSession) -> Result<ExamResultId, SessionError> {
        // A sealed session answers with the id it already holds.
        if let Some(id) = session.result_id() {
            return Ok(id);
        }
        let Some(score) = session.score() else {
            return Err(SessionError::NotFinished);
        };
        if !session.begin_submission() {
            return Err(SessionError::SubmissionInFlight);
        }

        let result = match ExamResult::new(
            session.user_id(),
            session.exam().id(),
            session.exam().title(),
            score.total,
            score.correct,
            self.clock.now(),
        ) {
            Ok(result) => result,
            Err(e) => {
                session.abort_submission();
                return Err(e.into());
            }
        };

        match self.results.append_result(&result).await {
            Ok(id) => {
                session.mark_submitted(id);
                Ok(id)
            }
            Err(e) => {
                session.abort_submission();
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for SessionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWorkflow")
            .field("clock", &self.clock)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
