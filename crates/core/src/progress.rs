//! Aggregation of attempt history into per-question statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Attempt, QuestionId};
use crate::quiz::percentage;

/// Running tally of attempts for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub attempts: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub last_attempted_at: DateTime<Utc>,
}

impl QuestionStats {
    /// A question is weak while its misses outnumber its correct answers.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.incorrect > self.correct
    }
}

/// Summary of a user's attempt history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub questions: HashMap<QuestionId, QuestionStats>,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_attempts<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> Self {
        let mut summary = Self::default();
        for attempt in attempts {
            summary.push(attempt);
        }
        summary
    }

    /// Fold one more attempt into the summary.
    pub fn push(&mut self, attempt: &Attempt) {
        self.total_attempts += 1;
        if attempt.is_correct {
            self.correct_attempts += 1;
        }

        let stats = self
            .questions
            .entry(attempt.question_id.clone())
            .or_insert(QuestionStats {
                attempts: 0,
                correct: 0,
                incorrect: 0,
                last_attempted_at: attempt.attempted_at,
            });
        stats.attempts += 1;
        if attempt.is_correct {
            stats.correct += 1;
        } else {
            stats.incorrect += 1;
        }
        if attempt.attempted_at > stats.last_attempted_at {
            stats.last_attempted_at = attempt.attempted_at;
        }
    }

    #[must_use]
    pub fn questions_attempted(&self) -> usize {
        self.questions.len()
    }

    /// Overall accuracy as a whole percentage.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percentage(
            self.correct_attempts as usize,
            self.total_attempts as usize,
        )
    }

    /// Ids of weak questions, most-missed first.
    ///
    /// Ties break on the most recent attempt, then on id.
    #[must_use]
    pub fn weak_question_ids(&self) -> Vec<QuestionId> {
        let mut weak: Vec<(&QuestionId, &QuestionStats)> = self
            .questions
            .iter()
            .filter(|(_, stats)| stats.is_weak())
            .collect();
        weak.sort_by(|(left_id, left), (right_id, right)| {
            right
                .incorrect
                .cmp(&left.incorrect)
                .then_with(|| right.last_attempted_at.cmp(&left.last_attempted_at))
                .then_with(|| left_id.cmp(right_id))
        });
        weak.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
