use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exam_core::model::{
    Attempt, AttemptId, Question, QuestionId, TestResult, TestResultId, TestType, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted attempt together with its storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub id: AttemptId,
    pub attempt: Attempt,
}

/// Question catalog, partitioned by license class.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert or replace a question in the pool of `test_type`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(
        &self,
        test_type: TestType,
        question: &Question,
    ) -> Result<(), StorageError>;

    /// All questions of a pool, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_test_type(
        &self,
        test_type: TestType,
    ) -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by id, `None` if it is not in any pool.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError>;
}

/// Append-only attempt log.
///
/// Attempts are not checked against the question catalog.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist one attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &Attempt) -> Result<AttemptId, StorageError>;

    /// Every attempt of `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn attempts_for_user(&self, user: UserId) -> Result<Vec<AttemptRecord>, StorageError>;
}

#[async_trait]
pub trait TestResultRepository: Send + Sync {
    /// Store a test result and its attempts in one unit; each attempt is
    /// linked to the new result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an attempt belongs to another user,
    /// or other storage errors. Nothing is written on failure.
    async fn record_test_result(
        &self,
        result: &TestResult,
        attempts: &[Attempt],
    ) -> Result<TestResultId, StorageError>;

    /// Test results of `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn test_results_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(TestResultId, TestResult)>, StorageError>;
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Bookmark a question; returns `false` when it was already bookmarked.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn add_bookmark(
        &self,
        user: UserId,
        question_id: &QuestionId,
        created_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Remove a bookmark; returns `false` when there was none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn remove_bookmark(
        &self,
        user: UserId,
        question_id: &QuestionId,
    ) -> Result<bool, StorageError>;

    /// Bookmarked question ids, oldest bookmark first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_bookmarks(&self, user: UserId) -> Result<Vec<QuestionId>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<QuestionId, (TestType, Question)>>>,
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
    test_results: Arc<Mutex<Vec<(TestResultId, TestResult)>>>,
    bookmarks: Arc<Mutex<Vec<(UserId, QuestionId)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn next_id(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX - 1) + 1
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(
        &self,
        test_type: TestType,
        question: &Question,
    ) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert(question.id().clone(), (test_type, question.clone()));
        Ok(())
    }

    async fn questions_for_test_type(
        &self,
        test_type: TestType,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let mut found: Vec<Question> = guard
            .values()
            .filter(|(tt, _)| *tt == test_type)
            .map(|(_, q)| q.clone())
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(id).map(|(_, q)| q.clone()))
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &Attempt) -> Result<AttemptId, StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        let id = AttemptId::new(next_id(guard.len()));
        guard.push(AttemptRecord {
            id,
            attempt: attempt.clone(),
        });
        Ok(id)
    }

    async fn attempts_for_user(&self, user: UserId) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let mut found: Vec<AttemptRecord> = guard
            .iter()
            .filter(|r| r.attempt.user_id == user)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.attempt.attempted_at, r.id));
        Ok(found)
    }
}

#[async_trait]
impl TestResultRepository for InMemoryRepository {
    async fn record_test_result(
        &self,
        result: &TestResult,
        attempts: &[Attempt],
    ) -> Result<TestResultId, StorageError> {
        if attempts.iter().any(|a| a.user_id != result.user_id()) {
            return Err(StorageError::Conflict);
        }

        // lock order: results, then attempts
        let mut results = self.test_results.lock().map_err(poisoned)?;
        let mut log = self.attempts.lock().map_err(poisoned)?;

        let result_id = TestResultId::new(next_id(results.len()));
        results.push((result_id, result.clone()));
        for attempt in attempts {
            let id = AttemptId::new(next_id(log.len()));
            log.push(AttemptRecord {
                id,
                attempt: attempt.clone().with_test_result(result_id),
            });
        }
        Ok(result_id)
    }

    async fn test_results_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(TestResultId, TestResult)>, StorageError> {
        let guard = self.test_results.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|(_, r)| r.user_id() == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookmarkRepository for InMemoryRepository {
    async fn add_bookmark(
        &self,
        user: UserId,
        question_id: &QuestionId,
        _created_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        if guard.iter().any(|(u, q)| *u == user && q == question_id) {
            return Ok(false);
        }
        guard.push((user, question_id.clone()));
        Ok(true)
    }

    async fn remove_bookmark(
        &self,
        user: UserId,
        question_id: &QuestionId,
    ) -> Result<bool, StorageError> {
        let mut guard = self.bookmarks.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|(u, q)| !(*u == user && q == question_id));
        Ok(guard.len() != before)
    }

    async fn list_bookmarks(&self, user: UserId) -> Result<Vec<QuestionId>, StorageError> {
        let guard = self.bookmarks.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, q)| q.clone())
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub test_results: Arc<dyn TestResultRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one backend value for every repository.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionRepository
            + AttemptRepository
            + TestResultRepository
            + BookmarkRepository
            + Clone
            + 'static,
    {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo.clone());
        let test_results: Arc<dyn TestResultRepository> = Arc::new(repo.clone());
        let bookmarks: Arc<dyn BookmarkRepository> = Arc::new(repo);
        Self {
            questions,
            attempts,
            test_results,
            bookmarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{AnswerLetter, AttemptType};
    use exam_core::time::fixed_now;

    fn build_question(id: &str) -> Question {
        Question::new(
            QuestionId::new(id).unwrap(),
            id,
            format!("Prompt for {id}"),
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerLetter::B,
            "T1",
            "T1A",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn questions_are_partitioned_by_test_type() {
        let repo = InMemoryRepository::new();
        repo.upsert_question(TestType::Technician, &build_question("T1A02"))
            .await
            .unwrap();
        repo.upsert_question(TestType::Technician, &build_question("T1A01"))
            .await
            .unwrap();
        repo.upsert_question(TestType::General, &build_question("G1A01"))
            .await
            .unwrap();

        let tech = repo
            .questions_for_test_type(TestType::Technician)
            .await
            .unwrap();
        let ids: Vec<&str> = tech.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, vec!["T1A01", "T1A02"]);

        let missing = repo
            .get_question(&QuestionId::new("E1A01").unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn attempts_accept_unknown_questions_and_sort_by_time() {
        let repo = InMemoryRepository::new();
        let user = UserId::generate();
        let q = build_question("T9Z99");

        let later = Attempt::for_question(
            user,
            &q,
            AnswerLetter::B,
            AttemptType::RandomPractice,
            fixed_now() + Duration::minutes(1),
        );
        let earlier = Attempt::for_question(
            user,
            &q,
            AnswerLetter::A,
            AttemptType::RandomPractice,
            fixed_now(),
        );
        repo.append_attempt(&later).await.unwrap();
        repo.append_attempt(&earlier).await.unwrap();
        repo.append_attempt(&Attempt::for_question(
            UserId::generate(),
            &q,
            AnswerLetter::A,
            AttemptType::RandomPractice,
            fixed_now(),
        ))
        .await
        .unwrap();

        let history = repo.attempts_for_user(user).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].attempt.is_correct);
        assert!(history[1].attempt.is_correct);
    }

    #[tokio::test]
    async fn test_result_links_attempts() {
        let repo = InMemoryRepository::new();
        let user = UserId::generate();
        let q = build_question("T1A01");
        let result = TestResult::new(user, TestType::Technician, 1, 1, true, fixed_now()).unwrap();
        let attempt =
            Attempt::for_question(user, &q, AnswerLetter::B, AttemptType::TopicQuiz, fixed_now());

        let id = repo.record_test_result(&result, &[attempt]).await.unwrap();

        let history = repo.attempts_for_user(user).await.unwrap();
        assert_eq!(history[0].attempt.test_result_id, Some(id));
        assert_eq!(repo.test_results_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_result_rejects_foreign_attempts() {
        let repo = InMemoryRepository::new();
        let user = UserId::generate();
        let q = build_question("T1A01");
        let result = TestResult::new(user, TestType::Technician, 1, 1, true, fixed_now()).unwrap();
        let foreign = Attempt::for_question(
            UserId::generate(),
            &q,
            AnswerLetter::B,
            AttemptType::TopicQuiz,
            fixed_now(),
        );

        let err = repo
            .record_test_result(&result, &[foreign])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert!(repo.test_results_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bookmarks_toggle_per_user() {
        let repo = InMemoryRepository::new();
        let user = UserId::generate();
        let q = QuestionId::new("T1A01").unwrap();

        assert!(repo.add_bookmark(user, &q, fixed_now()).await.unwrap());
        assert!(!repo.add_bookmark(user, &q, fixed_now()).await.unwrap());
        assert_eq!(repo.list_bookmarks(user).await.unwrap(), vec![q.clone()]);
        assert!(repo.list_bookmarks(UserId::generate()).await.unwrap().is_empty());

        assert!(repo.remove_bookmark(user, &q).await.unwrap());
        assert!(!repo.remove_bookmark(user, &q).await.unwrap());
    }
}
