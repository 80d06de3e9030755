use exam_core::model::{Attempt, TestResult, TestResultId, UserId};

use super::{
    SqliteRepository,
    attempt_repo::INSERT_ATTEMPT,
    mapping::{letter_to_text, map_test_result_row, ser, user_id_to_text},
};
use crate::repository::{StorageError, TestResultRepository};

#[async_trait::async_trait]
impl TestResultRepository for SqliteRepository {
    async fn record_test_result(
        &self,
        result: &TestResult,
        attempts: &[Attempt],
    ) -> Result<TestResultId, StorageError> {
        if attempts.iter().any(|a| a.user_id != result.user_id()) {
            return Err(StorageError::Conflict);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
                INSERT INTO test_results (
                    user_id, test_type, score, total, passed, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user_id_to_text(result.user_id()))
        .bind(result.test_type().as_str())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total()))
        .bind(result.passed())
        .bind(result.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let result_rowid = res.last_insert_rowid();

        for attempt in attempts {
            sqlx::query(INSERT_ATTEMPT)
                .bind(user_id_to_text(attempt.user_id))
                .bind(attempt.question_id.as_str())
                .bind(letter_to_text(attempt.selected))
                .bind(attempt.is_correct)
                .bind(attempt.attempt_type.as_str())
                .bind(attempt.attempted_at)
                .bind(Some(result_rowid))
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(TestResultId::new(u64::try_from(result_rowid).map_err(ser)?))
    }

    async fn test_results_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(TestResultId, TestResult)>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, test_type, score, total, passed, completed_at
                FROM test_results
                WHERE user_id = ?1
                ORDER BY completed_at ASC, id ASC
            ",
        )
        .bind(user_id_to_text(user))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_test_result_row(&row)?);
        }
        Ok(out)
    }
}
