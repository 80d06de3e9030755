use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use exam_core::model::{QuestionId, TestResult, TestResultId, TestType, UserId};
use exam_core::progress::ProgressSummary;
use storage::repository::{AttemptRepository, QuestionRepository, TestResultRepository};

use crate::attempts::AttemptInvalidator;
use crate::error::ProgressError;

//
// ─── CACHE ─────────────────────────────────────────────────────────────────────
//

/// Attempt summaries keyed by user and license class.
///
/// Entries are dropped per user whenever a write for that user succeeds;
/// readers may see stale data until then. Each invalidation bumps the user's
/// generation so a read that started earlier cannot repopulate the cache.
#[derive(Debug, Default)]
pub struct AttemptCache {
    state: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<(UserId, TestType), ProgressSummary>,
    generations: HashMap<UserId, u64>,
}

impl AttemptCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, user: UserId, test_type: TestType) -> Option<ProgressSummary> {
        self.lock().entries.get(&(user, test_type)).cloned()
    }

    /// Invalidations seen so far for `user`. Read it before loading a summary
    /// and hand it back to [`AttemptCache::insert_if_current`].
    #[must_use]
    pub fn generation(&self, user: UserId) -> u64 {
        self.lock().generations.get(&user).copied().unwrap_or(0)
    }

    pub fn insert(&self, user: UserId, test_type: TestType, summary: ProgressSummary) {
        self.lock().entries.insert((user, test_type), summary);
    }

    /// Store `summary` only if `user` has not been invalidated since
    /// `generation` was read. Returns whether it was stored.
    pub fn insert_if_current(
        &self,
        user: UserId,
        test_type: TestType,
        generation: u64,
        summary: ProgressSummary,
    ) -> bool {
        let mut state = self.lock();
        if state.generations.get(&user).copied().unwrap_or(0) != generation {
            debug!("dropping {test_type} summary for {user} loaded before an invalidation");
            return false;
        }
        state.entries.insert((user, test_type), summary);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AttemptInvalidator for AttemptCache {
    fn invalidate_attempts(&self, user: UserId) {
        let mut state = self.lock();
        *state.generations.entry(user).or_insert(0) += 1;
        let before = state.entries.len();
        state.entries.retain(|(cached_user, _), _| *cached_user != user);
        debug!(
            "invalidated {} cached attempt summaries for {user}",
            before - state.entries.len()
        );
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Read side for attempt history: per-question stats and weak ids.
#[derive(Clone)]
pub struct ProgressService {
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
    test_results: Arc<dyn TestResultRepository>,
    cache: Arc<AttemptCache>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
        test_results: Arc<dyn TestResultRepository>,
        cache: Arc<AttemptCache>,
    ) -> Self {
        Self {
            questions,
            attempts,
            test_results,
            cache,
        }
    }

    #[must_use]
    pub fn cache(&self) -> Arc<AttemptCache> {
        Arc::clone(&self.cache)
    }

    /// Summary of `user`'s attempts on questions from the `test_type` pool.
    ///
    /// Attempts on ids outside the pool are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn summary(
        &self,
        user: UserId,
        test_type: TestType,
    ) -> Result<ProgressSummary, ProgressError> {
        if let Some(hit) = self.cache.get(user, test_type) {
            return Ok(hit);
        }
        let generation = self.cache.generation(user);

        let pool: HashSet<QuestionId> = self
            .questions
            .questions_for_test_type(test_type)
            .await?
            .into_iter()
            .map(|q| q.id().clone())
            .collect();
        let records = self.attempts.attempts_for_user(user).await?;
        let summary = ProgressSummary::from_attempts(
            records
                .iter()
                .map(|r| &r.attempt)
                .filter(|a| pool.contains(&a.question_id)),
        );

        self.cache
            .insert_if_current(user, test_type, generation, summary.clone());
        Ok(summary)
    }

    /// Weak question ids for the pool, most-missed first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn weak_question_ids(
        &self,
        user: UserId,
        test_type: TestType,
    ) -> Result<Vec<QuestionId>, ProgressError> {
        Ok(self.summary(user, test_type).await?.weak_question_ids())
    }

    /// Submitted quiz results for the pool, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn test_results(
        &self,
        user: UserId,
        test_type: TestType,
    ) -> Result<Vec<(TestResultId, TestResult)>, ProgressError> {
        let mut results = self.test_results.test_results_for_user(user).await?;
        results.retain(|(_, r)| r.test_type() == test_type);
        Ok(results)
    }
}
