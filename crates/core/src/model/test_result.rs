use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::question::TestType;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("a test result needs at least one question")]
    Empty,

    #[error("score ({score}) exceeds total ({total})")]
    ScoreOutOfRange { score: u32, total: u32 },
}

/// Parent record for a scored submission (topic quiz or practice test).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    user_id: UserId,
    test_type: TestType,
    score: u32,
    total: u32,
    passed: bool,
    completed_at: DateTime<Utc>,
}

impl TestResult {
    /// # Errors
    ///
    /// Returns `TestResultError::Empty` for a zero total and
    /// `TestResultError::ScoreOutOfRange` when `score > total`.
    pub fn new(
        user_id: UserId,
        test_type: TestType,
        score: u32,
        total: u32,
        passed: bool,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, TestResultError> {
        if total == 0 {
            return Err(TestResultError::Empty);
        }
        if score > total {
            return Err(TestResultError::ScoreOutOfRange { score, total });
        }
        Ok(Self {
            user_id,
            test_type,
            score,
            total,
            passed,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
