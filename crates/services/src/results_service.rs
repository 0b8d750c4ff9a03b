use std::sync::Arc;

use exam_core::model::ExamResultId;
use storage::repository::{ResultRow, ResultSink};

use crate::error::ResultsError;

/// Read side of the result sink, for admin dashboards.
#[derive(Clone)]
pub struct ResultsService {
    results: Arc<dyn ResultSink>,
}

impl ResultsService {
    #[must_use]
    pub fn new(results: Arc<dyn ResultSink>) -> Self {
        Self { results }
    }

    /// Most recent results first, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::Storage` if repository access fails.
    pub async fn recent(&self, limit: u32) -> Result<Vec<ResultRow>, ResultsError> {
        let rows = self.results.list_recent_results(limit).await?;
        Ok(rows)
    }

    /// Fetch one stored result by id.
    ///
    /// # Errors
    ///
    /// Returns `ResultsError::Storage` with `NotFound` when the id is
    /// unknown, or if repository access fails.
    pub async fn get(&self, id: ExamResultId) -> Result<ResultRow, ResultsError> {
        let result = self.results.get_result(id).await?;
        Ok(ResultRow { id, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamId, ExamResult, UserId};
    use exam_core::time::fixed_now;
    use storage::repository::Storage;

    fn result(correct: u32) -> ExamResult {
        ExamResult::new(
            UserId::new(1),
            ExamId::new(2),
            "Stored",
            10,
            correct,
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let storage = Storage::in_memory();
        let service = ResultsService::new(Arc::clone(&storage.results));

        storage.results.append_result(&result(3)).await.unwrap();
        let last = storage.results.append_result(&result(7)).await.unwrap();

        let rows = service.recent(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, last);
        assert_eq!(rows[0].result.correct_answers(), 7);

        let fetched = service.get(last).await.unwrap();
        assert_eq!(fetched.result.correct_answers(), 7);
    }
}
