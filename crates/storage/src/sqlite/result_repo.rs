use exam_core::model::{ExamResult, ExamResultId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_result_row, ser};
use crate::repository::{ResultSink, ResultRow, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ResultSink for SqliteRepository {
    async fn append_result(&self, result: &ExamResult) -> Result<ExamResultId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO results (user_id, exam_id, exam_title, total_questions, correct_answers, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_to_i64("user_id", result.user_id().value())?)
        .bind(id_to_i64("exam_id", result.exam_id().value())?)
        .bind(result.exam_title())
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.correct_answers()))
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: ExamResultId) -> Result<ExamResult, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, exam_id, exam_title, total_questions, correct_answers, completed_at
            FROM results WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_result_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, exam_id, exam_title, total_questions, correct_answers, completed_at
            FROM results
            ORDER BY id DESC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            results.push(ResultRow {
                id,
                result: map_result_row(&row)?,
            });
        }
        Ok(results)
    }
}
