use chrono::{DateTime, Utc};
use exam_core::model::{
    AnswerLetter, Attempt, AttemptId, AttemptType, Question, QuestionId, TestResult,
    TestResultId, TestType, UserId,
};
use sqlx::Row;

use crate::repository::{AttemptRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_to_text(user: UserId) -> String {
    user.to_string()
}

fn user_id_from_text(raw: &str) -> Result<UserId, StorageError> {
    raw.parse().map_err(ser)
}

pub(crate) fn letter_to_text(letter: AnswerLetter) -> String {
    letter.to_string()
}

fn letter_from_text(raw: &str) -> Result<AnswerLetter, StorageError> {
    raw.parse().map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    let options = [
        row.try_get::<String, _>("option_a").map_err(ser)?,
        row.try_get::<String, _>("option_b").map_err(ser)?,
        row.try_get::<String, _>("option_c").map_err(ser)?,
        row.try_get::<String, _>("option_d").map_err(ser)?,
    ];
    let correct = letter_from_text(&row.try_get::<String, _>("correct").map_err(ser)?)?;

    Question::new(
        id,
        row.try_get::<String, _>("display_label").map_err(ser)?,
        row.try_get::<String, _>("prompt").map_err(ser)?,
        options,
        correct,
        row.try_get::<String, _>("subelement").map_err(ser)?,
        row.try_get::<String, _>("question_group").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<AttemptRecord, StorageError> {
    let id = AttemptId::new(i64_to_u64("attempt_id", row.try_get("id").map_err(ser)?)?);
    let attempt_type: AttemptType = row
        .try_get::<String, _>("attempt_type")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let test_result_id = row
        .try_get::<Option<i64>, _>("test_result_id")
        .map_err(ser)?
        .map(|v| i64_to_u64("test_result_id", v).map(TestResultId::new))
        .transpose()?;
    let attempted_at: DateTime<Utc> = row.try_get("attempted_at").map_err(ser)?;

    Ok(AttemptRecord {
        id,
        attempt: Attempt {
            user_id: user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
            question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?)
                .map_err(ser)?,
            selected: letter_from_text(&row.try_get::<String, _>("selected").map_err(ser)?)?,
            is_correct: row.try_get("is_correct").map_err(ser)?,
            attempt_type,
            attempted_at,
            test_result_id,
        },
    })
}

pub(crate) fn map_test_result_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(TestResultId, TestResult), StorageError> {
    let id = TestResultId::new(i64_to_u64("test_result_id", row.try_get("id").map_err(ser)?)?);
    let test_type: TestType = row
        .try_get::<String, _>("test_type")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    let result = TestResult::new(
        user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        test_type,
        u32_from_i64("score", row.try_get("score").map_err(ser)?)?,
        u32_from_i64("total", row.try_get("total").map_err(ser)?)?,
        row.try_get("passed").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok((id, result))
}
