use std::sync::Arc;

use exam_core::model::{Question, QuestionId, TestType, UserId};
use storage::repository::Storage;

use crate::Clock;
use crate::attempts::{AttemptInvalidator, AttemptService};
use crate::bookmark_service::BookmarkService;
use crate::error::AppServicesError;
use crate::progress_service::{AttemptCache, ProgressService};
use crate::quiz::{StorageQuizSaver, TopicQuizController};
use crate::weak_review::WeakReviewController;

/// Assembles app-facing services for one user.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    user: UserId,
    storage: Storage,
    cache: Arc<AttemptCache>,
    attempts: Arc<AttemptService>,
    progress: Arc<ProgressService>,
    bookmarks: Arc<BookmarkService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        user: UserId,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, user))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, user: UserId) -> Self {
        Self::from_storage(Storage::in_memory(), clock, user)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, user: UserId) -> Self {
        let cache = Arc::new(AttemptCache::new());
        let attempts = Arc::new(AttemptService::new(
            clock,
            user,
            Arc::clone(&storage.attempts),
        ));
        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.questions),
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.test_results),
            Arc::clone(&cache),
        ));
        let bookmarks = Arc::new(BookmarkService::new(clock, Arc::clone(&storage.bookmarks)));

        Self {
            clock,
            user,
            storage,
            cache,
            attempts,
            progress,
            bookmarks,
        }
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn cache(&self) -> Arc<AttemptCache> {
        Arc::clone(&self.cache)
    }

    #[must_use]
    pub fn attempts(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempts)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn bookmarks(&self) -> Arc<BookmarkService> {
        Arc::clone(&self.bookmarks)
    }

    /// Question pool for a license class, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` on repository failures.
    pub async fn catalog(&self, test_type: TestType) -> Result<Vec<Question>, AppServicesError> {
        Ok(self.storage.questions.questions_for_test_type(test_type).await?)
    }

    /// Catalog and current weak ids for a license class.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` on repository failures.
    pub async fn review_inputs(
        &self,
        test_type: TestType,
    ) -> Result<(Vec<Question>, Vec<QuestionId>), AppServicesError> {
        let catalog = self.catalog(test_type).await?;
        let weak = self.progress.weak_question_ids(self.user, test_type).await?;
        Ok((catalog, weak))
    }

    /// Start a weak-question review wired to storage and the attempt cache.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` on repository failures.
    pub async fn weak_review(
        &self,
        test_type: TestType,
        streak_mode: bool,
    ) -> Result<WeakReviewController, AppServicesError> {
        let (catalog, weak) = self.review_inputs(test_type).await?;
        let invalidator: Arc<dyn AttemptInvalidator> = self.cache();
        Ok(WeakReviewController::new(
            test_type,
            &catalog,
            &weak,
            self.user,
            self.attempts(),
            Some(invalidator),
        )
        .with_streak_mode(streak_mode))
    }

    /// Start a topic quiz over the pool, optionally narrowed to one subelement.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Quiz` when no questions match or the
    /// threshold is invalid.
    pub async fn topic_quiz(
        &self,
        test_type: TestType,
        subelement: Option<&str>,
        passing_threshold: f64,
    ) -> Result<TopicQuizController, AppServicesError> {
        let mut questions = self.catalog(test_type).await?;
        if let Some(subelement) = subelement {
            questions.retain(|q| q.subelement().eq_ignore_ascii_case(subelement));
        }

        let saver = StorageQuizSaver::new(
            self.clock,
            self.user,
            test_type,
            Arc::clone(&self.storage.test_results),
        )
        .with_passing_threshold(passing_threshold)?
        .with_invalidator(self.cache());

        Ok(TopicQuizController::new_shuffled(questions)?
            .with_passing_threshold(passing_threshold)?
            .with_saver(Arc::new(saver)))
    }
}
