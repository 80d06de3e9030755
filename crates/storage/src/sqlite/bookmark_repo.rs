use chrono::{DateTime, Utc};
use exam_core::model::{QuestionId, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{ser, user_id_to_text},
};
use crate::repository::{BookmarkRepository, StorageError};

#[async_trait::async_trait]
impl BookmarkRepository for SqliteRepository {
    async fn add_bookmark(
        &self,
        user: UserId,
        question_id: &QuestionId,
        created_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO bookmarks (user_id, question_id, created_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id, question_id) DO NOTHING
            ",
        )
        .bind(user_id_to_text(user))
        .bind(question_id.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected() > 0)
    }

    async fn remove_bookmark(
        &self,
        user: UserId,
        question_id: &QuestionId,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM bookmarks WHERE user_id = ?1 AND question_id = ?2")
            .bind(user_id_to_text(user))
            .bind(question_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_bookmarks(&self, user: UserId) -> Result<Vec<QuestionId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT question_id
                FROM bookmarks
                WHERE user_id = ?1
                ORDER BY created_at ASC, question_id ASC
            ",
        )
        .bind(user_id_to_text(user))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("question_id").map_err(ser)?;
            out.push(QuestionId::new(raw).map_err(ser)?);
        }
        Ok(out)
    }
}
