use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use exam_core::model::{
    AnswerLetter, Attempt, AttemptType, Question, TestResult, TestResultId, TestType, UserId,
};
use exam_core::quiz::{DEFAULT_PASSING_THRESHOLD, QuizScore, validate_threshold};
use storage::repository::TestResultRepository;

use crate::Clock;
use crate::attempts::AttemptInvalidator;
use crate::error::{QuizError, QuizSaveError};

/// One answered quiz question as handed to a saver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAnswer {
    pub question: Question,
    pub selected: AnswerLetter,
}

/// Persists a submitted quiz. A failure keeps the quiz open for retry.
#[async_trait]
pub trait QuizAttemptSaver: Send + Sync {
    /// # Errors
    ///
    /// Returns `QuizSaveError` with a user-facing message when saving fails.
    async fn save_attempts(&self, answers: &[QuizAnswer]) -> Result<(), QuizSaveError>;
}

/// Writes a `TestResult` and its `topic_quiz` attempts in one transaction.
#[derive(Clone)]
pub struct StorageQuizSaver {
    clock: Clock,
    user: UserId,
    test_type: TestType,
    threshold: f64,
    results: Arc<dyn TestResultRepository>,
    invalidator: Option<Arc<dyn AttemptInvalidator>>,
}

impl StorageQuizSaver {
    #[must_use]
    pub fn new(
        clock: Clock,
        user: UserId,
        test_type: TestType,
        results: Arc<dyn TestResultRepository>,
    ) -> Self {
        Self {
            clock,
            user,
            test_type,
            threshold: DEFAULT_PASSING_THRESHOLD,
            results,
            invalidator: None,
        }
    }

    /// # Errors
    ///
    /// Returns `QuizError::Threshold` for a threshold outside `0.0..=1.0`.
    pub fn with_passing_threshold(mut self, threshold: f64) -> Result<Self, QuizError> {
        self.threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_invalidator(mut self, invalidator: Arc<dyn AttemptInvalidator>) -> Self {
        self.invalidator = Some(invalidator);
        self
    }

    /// Persist `answers` and return the new result id.
    ///
    /// # Errors
    ///
    /// Returns `QuizSaveError` for an empty submission or a storage failure.
    pub async fn save(&self, answers: &[QuizAnswer]) -> Result<TestResultId, QuizSaveError> {
        let questions: Vec<Question> = answers.iter().map(|a| a.question.clone()).collect();
        let selected: HashMap<_, _> = answers
            .iter()
            .map(|a| (a.question.id().clone(), a.selected))
            .collect();
        let score = QuizScore::compute(&questions, &selected, self.threshold);

        let now = self.clock.now();
        let result = TestResult::new(
            self.user,
            self.test_type,
            count_u32(score.score()),
            count_u32(score.total()),
            score.passed(),
            now,
        )?;
        let attempts: Vec<Attempt> = answers
            .iter()
            .map(|a| {
                Attempt::for_question(
                    self.user,
                    &a.question,
                    a.selected,
                    AttemptType::TopicQuiz,
                    now,
                )
            })
            .collect();

        let id = self.results.record_test_result(&result, &attempts).await?;
        if let Some(invalidator) = &self.invalidator {
            invalidator.invalidate_attempts(self.user);
        }
        info!(
            "saved {} quiz result {id}: {}/{}",
            self.test_type,
            score.score(),
            score.total()
        );
        Ok(id)
    }
}

#[async_trait]
impl QuizAttemptSaver for StorageQuizSaver {
    async fn save_attempts(&self, answers: &[QuizAnswer]) -> Result<(), QuizSaveError> {
        self.save(answers).await.map(|_| ())
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionId;
    use exam_core::time::fixed_now;
    use storage::repository::{AttemptRepository, InMemoryRepository};

    fn question(id: &str, correct: AnswerLetter) -> Question {
        Question::new(
            QuestionId::new(id).unwrap(),
            id,
            "Prompt",
            ["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            "T5",
            "T5A",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn saves_result_and_linked_attempts() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::generate();
        let saver = StorageQuizSaver::new(
            Clock::fixed(fixed_now()),
            user,
            TestType::Technician,
            repo.clone(),
        );

        let answers = vec![
            QuizAnswer {
                question: question("T5A01", AnswerLetter::D),
                selected: AnswerLetter::D,
            },
            QuizAnswer {
                question: question("T5A02", AnswerLetter::B),
                selected: AnswerLetter::A,
            },
        ];
        let id = saver.save(&answers).await.unwrap();

        let results = repo.test_results_for_user(user).await.unwrap();
        assert_eq!(results.len(), 1);
        let (stored_id, result) = &results[0];
        assert_eq!(*stored_id, id);
        assert_eq!((result.score(), result.total()), (1, 2));
        assert!(!result.passed());

        let attempts = repo.attempts_for_user(user).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert!(attempts.iter().all(|r| {
            r.attempt.attempt_type == AttemptType::TopicQuiz && r.attempt.test_result_id == Some(id)
        }));
    }

    #[tokio::test]
    async fn empty_submission_is_rejected() {
        let saver = StorageQuizSaver::new(
            Clock::fixed(fixed_now()),
            UserId::generate(),
            TestType::General,
            Arc::new(InMemoryRepository::new()),
        );
        assert!(saver.save_attempts(&[]).await.is_err());
    }
}
