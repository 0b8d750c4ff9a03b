use std::collections::BTreeMap;

use exam_core::model::{
    ExamId, ExamResult, OptionLabel, Question, QuestionId, Role, User, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn exam_id_from_i64(v: i64) -> Result<ExamId, StorageError> {
    Ok(ExamId::new(i64_to_u64("exam_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn parse_label(s: &str) -> Result<OptionLabel, StorageError> {
    s.parse::<OptionLabel>().map_err(ser)
}

pub(crate) fn parse_role(s: &str) -> Result<Role, StorageError> {
    s.parse::<Role>().map_err(ser)
}

/// Question options travel as one JSON object column (`{"A": "...", ...}`).
pub(crate) fn encode_options(
    options: &BTreeMap<OptionLabel, String>,
) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn decode_options(raw: &str) -> Result<BTreeMap<OptionLabel, String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let options = decode_options(&row.try_get::<String, _>("options").map_err(ser)?)?;
    let correct = parse_label(&row.try_get::<String, _>("correct_option").map_err(ser)?)?;

    Question::new(
        QuestionId::new(i64_to_u64("question_id", id)?),
        row.try_get::<String, _>("prompt").map_err(ser)?,
        row.try_get::<Option<String>, _>("image_url").map_err(ser)?,
        options,
        correct,
    )
    .map_err(ser)
}

pub(crate) fn map_exam_row(
    row: &SqliteRow,
    questions: Vec<Question>,
) -> Result<exam_core::model::Exam, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let time_limit: i64 = row.try_get("time_limit_minutes").map_err(ser)?;

    exam_core::model::Exam::new(
        exam_id_from_i64(id)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        row.try_get::<Option<String>, _>("category").map_err(ser)?,
        u32::try_from(time_limit)
            .map_err(|_| StorageError::Serialization("time_limit_minutes overflow".into()))?,
        row.try_get::<i64, _>("is_live").map_err(ser)? != 0,
        questions,
    )
    .map_err(ser)
}

pub(crate) fn map_result_row(row: &SqliteRow) -> Result<ExamResult, StorageError> {
    let user_id: i64 = row.try_get("user_id").map_err(ser)?;
    let exam_id: i64 = row.try_get("exam_id").map_err(ser)?;
    let total: i64 = row.try_get("total_questions").map_err(ser)?;
    let correct: i64 = row.try_get("correct_answers").map_err(ser)?;

    ExamResult::new(
        user_id_from_i64(user_id)?,
        exam_id_from_i64(exam_id)?,
        row.try_get::<String, _>("exam_title").map_err(ser)?,
        u32::try_from(total)
            .map_err(|_| StorageError::Serialization("total_questions overflow".into()))?,
        u32::try_from(correct)
            .map_err(|_| StorageError::Serialization("correct_answers overflow".into()))?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let role = parse_role(&row.try_get::<String, _>("role").map_err(ser)?)?;

    User::new(
        user_id_from_i64(id)?,
        row.try_get::<String, _>("username").map_err(ser)?,
        row.try_get::<String, _>("display_name").map_err(ser)?,
        role,
        row.try_get::<Option<String>, _>("position").map_err(ser)?,
        row.try_get::<Option<String>, _>("language").map_err(ser)?,
    )
    .map_err(ser)
}
