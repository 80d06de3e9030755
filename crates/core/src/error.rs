use thiserror::Error;

use crate::model::{AttemptError, ParseIdError, QuestionError, TestResultError};
use crate::quiz::QuizThresholdError;

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    TestResult(#[from] TestResultError),
    #[error(transparent)]
    Threshold(#[from] QuizThresholdError),
}
