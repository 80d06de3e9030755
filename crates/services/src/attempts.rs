use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};

use exam_core::model::{AnswerLetter, Attempt, AttemptId, AttemptType, Question, UserId};
use storage::repository::AttemptRepository;

use crate::Clock;
use crate::error::RecordError;

//
// ─── COLLABORATORS ─────────────────────────────────────────────────────────────
//

/// Persists one answer event.
///
/// Implementations must accept questions that are missing from any cached
/// catalog; no referential check happens at this layer.
#[async_trait]
pub trait AttemptRecorder: Send + Sync {
    /// Returns the user the attempt was written for.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` when the backing store rejects the write.
    async fn save(
        &self,
        question: &Question,
        selected: AnswerLetter,
        attempt_type: AttemptType,
    ) -> Result<UserId, RecordError>;
}

/// Drops cached attempt-derived data for a user after a successful write.
pub trait AttemptInvalidator: Send + Sync {
    fn invalidate_attempts(&self, user: UserId);
}

//
// ─── STORAGE-BACKED RECORDER ───────────────────────────────────────────────────
//

/// Appends attempts for a single user, stamping them with the service clock.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    user: UserId,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    #[must_use]
    pub fn new(clock: Clock, user: UserId, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self {
            clock,
            user,
            attempts,
        }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Append an attempt and return its storage id.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Storage` on repository failures.
    pub async fn record(
        &self,
        question: &Question,
        selected: AnswerLetter,
        attempt_type: AttemptType,
    ) -> Result<AttemptId, RecordError> {
        let attempt =
            Attempt::for_question(self.user, question, selected, attempt_type, self.now());
        Ok(self.attempts.append_attempt(&attempt).await?)
    }
}

#[async_trait]
impl AttemptRecorder for AttemptService {
    async fn save(
        &self,
        question: &Question,
        selected: AnswerLetter,
        attempt_type: AttemptType,
    ) -> Result<UserId, RecordError> {
        self.record(question, selected, attempt_type).await?;
        Ok(self.user)
    }
}

//
// ─── SUBMIT-THEN-INVALIDATE TASK ───────────────────────────────────────────────
//

/// How a background attempt write ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Persisted,
    Failed,
}

/// A single attempt write followed by cache invalidation for the user the
/// recorder wrote for.
///
/// Built synchronously when an answer is selected; the caller decides whether
/// to await it or hand it to the runtime. Failures are logged and never
/// surface to the caller as errors.
pub struct RecordAttemptTask {
    recorder: Arc<dyn AttemptRecorder>,
    invalidator: Option<Arc<dyn AttemptInvalidator>>,
    question: Question,
    selected: AnswerLetter,
    attempt_type: AttemptType,
}

impl RecordAttemptTask {
    #[must_use]
    pub fn new(
        recorder: Arc<dyn AttemptRecorder>,
        invalidator: Option<Arc<dyn AttemptInvalidator>>,
        question: Question,
        selected: AnswerLetter,
        attempt_type: AttemptType,
    ) -> Self {
        Self {
            recorder,
            invalidator,
            question,
            selected,
            attempt_type,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn selected(&self) -> AnswerLetter {
        self.selected
    }

    /// Save the attempt, then invalidate the user's cached attempts on success.
    pub async fn run(self) -> RecordStatus {
        match self
            .recorder
            .save(&self.question, self.selected, self.attempt_type)
            .await
        {
            Ok(user) => {
                if let Some(invalidator) = &self.invalidator {
                    invalidator.invalidate_attempts(user);
                }
                debug!(
                    "recorded {} attempt on {} for {user}",
                    self.attempt_type,
                    self.question.id()
                );
                RecordStatus::Persisted
            }
            Err(err) => {
                warn!(
                    "failed to record {} attempt for {}: {err}",
                    self.attempt_type,
                    self.question.id()
                );
                RecordStatus::Failed
            }
        }
    }

    /// Run the task on the current tokio runtime without waiting for it.
    ///
    /// Must be called from within a runtime context.
    pub fn dispatch(self) -> tokio::task::JoinHandle<RecordStatus> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use exam_core::model::QuestionId;
    use exam_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn question(id: &str) -> Question {
        Question::new(
            QuestionId::new(id).unwrap(),
            id,
            "Prompt",
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerLetter::B,
            "T1",
            "T1A",
        )
        .unwrap()
    }

    #[derive(Default)]
    struct CountingInvalidator {
        calls: Mutex<Vec<UserId>>,
    }

    impl AttemptInvalidator for CountingInvalidator {
        fn invalidate_attempts(&self, user: UserId) {
            self.calls.lock().unwrap().push(user);
        }
    }

    struct FailingRecorder;

    #[async_trait]
    impl AttemptRecorder for FailingRecorder {
        async fn save(
            &self,
            _question: &Question,
            _selected: AnswerLetter,
            _attempt_type: AttemptType,
        ) -> Result<UserId, RecordError> {
            Err(StorageError::Connection("offline".into()).into())
        }
    }

    #[tokio::test]
    async fn service_stamps_attempt_with_clock_and_user() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::generate();
        let service = AttemptService::new(Clock::fixed(fixed_now()), user, repo.clone());

        service
            .save(&question("T1A01"), AnswerLetter::B, AttemptType::WeakQuestions)
            .await
            .unwrap();

        let stored = repo.attempts_for_user(user).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].attempt.attempted_at, fixed_now());
        assert!(stored[0].attempt.is_correct);
        assert_eq!(stored[0].attempt.attempt_type, AttemptType::WeakQuestions);
    }

    #[tokio::test]
    async fn task_invalidates_the_recorders_user_after_a_write() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::generate();
        let recorder = Arc::new(AttemptService::new(Clock::fixed(fixed_now()), user, repo));
        let invalidator = Arc::new(CountingInvalidator::default());

        let status = RecordAttemptTask::new(
            recorder,
            Some(invalidator.clone()),
            question("T1A01"),
            AnswerLetter::A,
            AttemptType::WeakQuestions,
        )
        .run()
        .await;

        assert_eq!(status, RecordStatus::Persisted);
        assert_eq!(*invalidator.calls.lock().unwrap(), vec![user]);
    }

    #[tokio::test]
    async fn task_swallows_write_failures() {
        let invalidator = Arc::new(CountingInvalidator::default());

        let handle = RecordAttemptTask::new(
            Arc::new(FailingRecorder),
            Some(invalidator.clone()),
            question("T1A01"),
            AnswerLetter::B,
            AttemptType::WeakQuestions,
        )
        .dispatch();

        assert_eq!(handle.await.unwrap(), RecordStatus::Failed);
        assert!(invalidator.calls.lock().unwrap().is_empty());
    }
}
