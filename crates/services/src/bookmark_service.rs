use std::sync::Arc;

use exam_core::model::{QuestionId, UserId};
use storage::repository::BookmarkRepository;

use crate::Clock;
use crate::error::ProgressError;

/// Per-user question bookmarks.
#[derive(Clone)]
pub struct BookmarkService {
    clock: Clock,
    bookmarks: Arc<dyn BookmarkRepository>,
}

impl BookmarkService {
    #[must_use]
    pub fn new(clock: Clock, bookmarks: Arc<dyn BookmarkRepository>) -> Self {
        Self { clock, bookmarks }
    }

    /// Flip the bookmark for `question_id`. Returns `true` when it is now set.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn toggle(
        &self,
        user: UserId,
        question_id: &QuestionId,
    ) -> Result<bool, ProgressError> {
        if self.bookmarks.remove_bookmark(user, question_id).await? {
            return Ok(false);
        }
        self.bookmarks
            .add_bookmark(user, question_id, self.clock.now())
            .await?;
        Ok(true)
    }

    /// Bookmarked ids, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn list(&self, user: UserId) -> Result<Vec<QuestionId>, ProgressError> {
        Ok(self.bookmarks.list_bookmarks(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn toggle_flips_membership() {
        let service = BookmarkService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let user = UserId::generate();
        let id = QuestionId::new("E5A01").unwrap();

        assert!(service.toggle(user, &id).await.unwrap());
        assert_eq!(service.list(user).await.unwrap(), vec![id.clone()]);
        assert!(!service.toggle(user, &id).await.unwrap());
        assert!(service.list(user).await.unwrap().is_empty());
    }
}
