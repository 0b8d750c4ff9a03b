use exam_core::model::{Exam, ExamId, Question};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use super::SqliteRepository;
use super::mapping::{encode_options, exam_id_from_i64, id_to_i64, map_exam_row, map_question_row, ser};
use crate::repository::{ExamRepository, StorageError};

fn conn(e: sqlx::Error) -> StorageError {
    // The partial unique index on is_live reports a second live exam as a
    // unique violation.
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return StorageError::Conflict;
    }
    StorageError::Connection(e.to_string())
}

async fn insert_questions(
    tx: &mut Transaction<'_, Sqlite>,
    exam_id: i64,
    questions: &[Question],
) -> Result<(), StorageError> {
    for (position, question) in questions.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO questions (id, exam_id, position, prompt, image_url, options, correct_option)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_to_i64("question_id", question.id().value())?)
        .bind(exam_id)
        .bind(position as i64)
        .bind(question.prompt())
        .bind(question.image_url())
        .bind(encode_options(question.options())?)
        .bind(question.correct_option().as_str())
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

impl SqliteRepository {
    async fn questions_for(&self, exam_id: i64) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt, image_url, options, correct_option
            FROM questions
            WHERE exam_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }

    async fn exam_from_row(&self, row: &SqliteRow) -> Result<Exam, StorageError> {
        let id: i64 = row.try_get("id").map_err(ser)?;
        let questions = self.questions_for(id).await?;
        map_exam_row(row, questions)
    }
}

#[async_trait::async_trait]
impl ExamRepository for SqliteRepository {
    async fn insert_new_exam(&self, exam: &Exam) -> Result<ExamId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO exams (title, description, category, time_limit_minutes, is_live)
            VALUES (?1, ?2, ?3, ?4, 0)
            ",
        )
        .bind(exam.title())
        .bind(exam.description())
        .bind(exam.category())
        .bind(i64::from(exam.time_limit_minutes()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let exam_id = res.last_insert_rowid();
        insert_questions(&mut tx, exam_id, exam.questions()).await?;
        tx.commit().await.map_err(conn)?;

        exam_id_from_i64(exam_id)
    }

    async fn upsert_exam(&self, exam: &Exam) -> Result<(), StorageError> {
        let exam_id = id_to_i64("exam_id", exam.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO exams (id, title, description, category, time_limit_minutes, is_live)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                time_limit_minutes = excluded.time_limit_minutes,
                is_live = excluded.is_live
            ",
        )
        .bind(exam_id)
        .bind(exam.title())
        .bind(exam.description())
        .bind(exam.category())
        .bind(i64::from(exam.time_limit_minutes()))
        .bind(i64::from(exam.is_live()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // The question list is replaced wholesale; positions encode order.
        sqlx::query("DELETE FROM questions WHERE exam_id = ?1")
            .bind(exam_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        insert_questions(&mut tx, exam_id, exam.questions()).await?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_exam(&self, id: ExamId) -> Result<Option<Exam>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, category, time_limit_minutes, is_live
            FROM exams WHERE id = ?1
            ",
        )
        .bind(id_to_i64("exam_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => self.exam_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, category, time_limit_minutes, is_live
            FROM exams
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut exams = Vec::with_capacity(rows.len());
        for row in rows {
            exams.push(self.exam_from_row(&row).await?);
        }
        Ok(exams)
    }

    async fn delete_exam(&self, id: ExamId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM exams WHERE id = ?1")
            .bind(id_to_i64("exam_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn set_live(&self, id: ExamId) -> Result<(), StorageError> {
        let exam_id = id_to_i64("exam_id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM exams WHERE id = ?1")
            .bind(exam_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        // Clear-then-set in one transaction keeps the partial unique index
        // satisfied and the invariant atomic.
        sqlx::query("UPDATE exams SET is_live = 0 WHERE is_live = 1")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("UPDATE exams SET is_live = 1 WHERE id = ?1")
            .bind(exam_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn clear_live(&self) -> Result<(), StorageError> {
        sqlx::query("UPDATE exams SET is_live = 0 WHERE is_live = 1")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn get_live(&self) -> Result<Option<Exam>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, category, time_limit_minutes, is_live
            FROM exams WHERE is_live = 1
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => self.exam_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }
}
