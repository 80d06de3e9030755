use exam_core::model::{Attempt, AttemptId, UserId};

use super::{
    SqliteRepository,
    mapping::{id_i64, letter_to_text, map_attempt_row, ser, user_id_to_text},
};
use crate::repository::{AttemptRecord, AttemptRepository, StorageError};

pub(crate) const INSERT_ATTEMPT: &str = r"
    INSERT INTO attempts (
        user_id, question_id, selected, is_correct,
        attempt_type, attempted_at, test_result_id
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
";

pub(crate) fn test_result_id_i64(attempt: &Attempt) -> Result<Option<i64>, StorageError> {
    attempt
        .test_result_id
        .map(|id| id_i64("test_result_id", id.value()))
        .transpose()
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &Attempt) -> Result<AttemptId, StorageError> {
        let res = sqlx::query(INSERT_ATTEMPT)
            .bind(user_id_to_text(attempt.user_id))
            .bind(attempt.question_id.as_str())
            .bind(letter_to_text(attempt.selected))
            .bind(attempt.is_correct)
            .bind(attempt.attempt_type.as_str())
            .bind(attempt.attempted_at)
            .bind(test_result_id_i64(attempt)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let id = u64::try_from(res.last_insert_rowid()).map_err(ser)?;
        Ok(AttemptId::new(id))
    }

    async fn attempts_for_user(&self, user: UserId) -> Result<Vec<AttemptRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, question_id, selected, is_correct,
                    attempt_type, attempted_at, test_result_id
                FROM attempts
                WHERE user_id = ?1
                ORDER BY attempted_at ASC, id ASC
            ",
        )
        .bind(user_id_to_text(user))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
