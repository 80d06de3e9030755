use exam_core::model::{Question, QuestionId, TestType};

use super::{
    SqliteRepository,
    mapping::{letter_to_text, map_question_row},
};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(
        &self,
        test_type: TestType,
        question: &Question,
    ) -> Result<(), StorageError> {
        let [a, b, c, d] = question.options();

        sqlx::query(
            r"
                INSERT INTO questions (
                    id, test_type, display_label, prompt,
                    option_a, option_b, option_c, option_d,
                    correct, subelement, question_group
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ON CONFLICT(id) DO UPDATE SET
                    test_type = excluded.test_type,
                    display_label = excluded.display_label,
                    prompt = excluded.prompt,
                    option_a = excluded.option_a,
                    option_b = excluded.option_b,
                    option_c = excluded.option_c,
                    option_d = excluded.option_d,
                    correct = excluded.correct,
                    subelement = excluded.subelement,
                    question_group = excluded.question_group
            ",
        )
        .bind(question.id().as_str())
        .bind(test_type.as_str())
        .bind(question.display_label())
        .bind(question.prompt())
        .bind(a.as_str())
        .bind(b.as_str())
        .bind(c.as_str())
        .bind(d.as_str())
        .bind(letter_to_text(question.correct()))
        .bind(question.subelement())
        .bind(question.group())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn questions_for_test_type(
        &self,
        test_type: TestType,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, display_label, prompt, option_a, option_b, option_c, option_d,
                    correct, subelement, question_group
                FROM questions
                WHERE test_type = ?1
                ORDER BY id ASC
            ",
        )
        .bind(test_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row)?);
        }
        Ok(out)
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, display_label, prompt, option_a, option_b, option_c, option_d,
                    correct, subelement, question_group
                FROM questions
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_question_row).transpose()
    }
}
