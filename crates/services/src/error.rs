//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::TestResultError;
use exam_core::quiz::QuizThresholdError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while recording a single attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the weak-question review controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("question index {index} is out of range for {len} active questions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("review is not showing the question list")]
    NotOnList,
}

/// Errors emitted by the topic quiz controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions available for quiz")]
    Empty,
    #[error("quiz already submitted")]
    Completed,
    #[error("{answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },
    #[error("quiz results are not available yet")]
    NotSubmitted,
    #[error(transparent)]
    Threshold(#[from] QuizThresholdError),
    #[error(transparent)]
    Save(#[from] QuizSaveError),
}

/// Failure reported by a quiz-attempt saver.
///
/// The message is shown inline to the user; the quiz stays open for retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct QuizSaveError {
    message: String,
}

impl QuizSaveError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StorageError> for QuizSaveError {
    fn from(err: StorageError) -> Self {
        Self::new(format!("could not save quiz attempts: {err}"))
    }
}

impl From<TestResultError> for QuizSaveError {
    fn from(err: TestResultError) -> Self {
        Self::new(format!("invalid quiz result: {err}"))
    }
}

/// Errors emitted by progress and bookmark services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
