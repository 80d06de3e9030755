use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info};

use exam_core::mastery::{ClearMode, MasteryOutcome, MasteryTracker};
use exam_core::model::{AnswerLetter, AttemptType, Question, QuestionId, TestType, UserId};

use super::picker::{IndexPicker, RandomPicker};
use super::state::{AnswerResult, EmptyState, ListState, ReviewView};
use crate::attempts::{AttemptInvalidator, AttemptRecorder, RecordAttemptTask};
use crate::error::ReviewError;

const RANDOMIZE_MAX_DRAWS: usize = 10;

/// What happened when an answer was selected.
///
/// Local state has already moved on; `task` still has to be run or
/// dispatched to persist the attempt.
pub struct AnswerSubmission {
    pub correct: bool,
    pub outcome: MasteryOutcome,
    pub task: RecordAttemptTask,
}

/// Drives one weak-question review session.
///
/// The working list is the caller's weak ids, in input order, matched
/// against the loaded catalog. Ids missing from the catalog are dropped.
/// Cleared questions stay in the working list but leave the active list.
pub struct WeakReviewController {
    test_type: TestType,
    user: UserId,
    catalog: HashMap<QuestionId, Question>,
    weak: Vec<Question>,
    tracker: MasteryTracker,
    view: ReviewView,
    recorder: Arc<dyn AttemptRecorder>,
    invalidator: Option<Arc<dyn AttemptInvalidator>>,
    picker: Box<dyn IndexPicker>,
    on_back: Option<Box<dyn FnMut() + Send>>,
}

impl WeakReviewController {
    #[must_use]
    pub fn new(
        test_type: TestType,
        catalog: &[Question],
        weak_ids: &[QuestionId],
        user: UserId,
        recorder: Arc<dyn AttemptRecorder>,
        invalidator: Option<Arc<dyn AttemptInvalidator>>,
    ) -> Self {
        let catalog = index_catalog(catalog);
        let weak = cross_reference(&catalog, weak_ids);
        debug!(
            "weak review for {test_type}: {} of {} ids matched the catalog",
            weak.len(),
            weak_ids.len()
        );

        Self {
            test_type,
            user,
            catalog,
            weak,
            tracker: MasteryTracker::new(ClearMode::default()),
            view: ReviewView::List,
            recorder,
            invalidator,
            picker: Box::new(RandomPicker::new()),
            on_back: None,
        }
    }

    #[must_use]
    pub fn with_streak_mode(mut self, enabled: bool) -> Self {
        self.tracker.set_mode(ClearMode::from_streak_enabled(enabled));
        self
    }

    #[must_use]
    pub fn with_picker(mut self, picker: impl IndexPicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    /// Callback for leaving the review entirely.
    #[must_use]
    pub fn on_back(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_back = Some(Box::new(callback));
        self
    }

    //
    // ─── READ ACCESS ───────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn view(&self) -> &ReviewView {
        &self.view
    }

    #[must_use]
    pub fn streak_mode(&self) -> bool {
        self.tracker.mode().is_streak()
    }

    #[must_use]
    pub fn tracker(&self) -> &MasteryTracker {
        &self.tracker
    }

    #[must_use]
    pub fn streak(&self, id: &QuestionId) -> u32 {
        self.tracker.streak(id)
    }

    #[must_use]
    pub fn cleared_count(&self) -> usize {
        self.tracker.cleared_count()
    }

    /// Matched weak questions, cleared ones included.
    #[must_use]
    pub fn weak_questions(&self) -> &[Question] {
        &self.weak
    }

    /// Weak questions that are not cleared yet, in input order.
    #[must_use]
    pub fn active_questions(&self) -> Vec<&Question> {
        self.weak
            .iter()
            .filter(|q| !self.tracker.is_cleared(q.id()))
            .collect()
    }

    /// Question currently on screen, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match &self.view {
            ReviewView::List => None,
            ReviewView::Detail { index, .. } => self.active_questions().get(*index).copied(),
            ReviewView::JustCleared { question, .. } => Some(question),
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        match &self.view {
            ReviewView::List => false,
            ReviewView::Detail { index, .. } => index + 1 < self.active_len(),
            ReviewView::JustCleared { .. } => true,
        }
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        matches!(self.view, ReviewView::Detail { index, .. } if index > 0)
    }

    #[must_use]
    pub fn list_state(&self) -> ListState {
        let questions: Vec<Question> = self.active_questions().into_iter().cloned().collect();
        let cleared_count = self.tracker.cleared_count();
        let empty = if questions.is_empty() {
            if cleared_count > 0 && !self.weak.is_empty() {
                Some(EmptyState::AllCleared)
            } else {
                Some(EmptyState::NoWeakQuestions)
            }
        } else {
            None
        };

        ListState {
            questions,
            cleared_count,
            empty,
        }
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Open the active question at `index` from the list.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotOnList` outside the list view and
    /// `ReviewError::IndexOutOfRange` for an index past the active list.
    pub fn open(&mut self, index: usize) -> Result<(), ReviewError> {
        if !self.view.is_list() {
            return Err(ReviewError::NotOnList);
        }
        let len = self.active_len();
        if index >= len {
            return Err(ReviewError::IndexOutOfRange { index, len });
        }
        self.view = ReviewView::Detail {
            index,
            answered: None,
        };
        Ok(())
    }

    /// Answer the question on screen.
    ///
    /// Returns `None` when there is nothing to answer: the list is showing,
    /// a result is already visible, or the question was just cleared.
    pub fn select_answer(&mut self, selected: AnswerLetter) -> Option<AnswerSubmission> {
        let ReviewView::Detail {
            index,
            answered: None,
        } = self.view
        else {
            return None;
        };
        let question = self.active_questions().get(index).copied()?.clone();

        let correct = question.is_correct(selected);
        let outcome = self.tracker.record(question.id(), correct);

        let task = RecordAttemptTask::new(
            Arc::clone(&self.recorder),
            self.invalidator.clone(),
            question.clone(),
            selected,
            AttemptType::WeakQuestions,
        );

        if outcome.cleared() {
            info!(
                "cleared {} ({} cleared this session)",
                question.id(),
                self.tracker.cleared_count()
            );
            self.view = ReviewView::JustCleared {
                question,
                selected,
                slot: index,
            };
        } else {
            self.view = ReviewView::Detail {
                index,
                answered: Some(AnswerResult { selected, correct }),
            };
        }

        Some(AnswerSubmission {
            correct,
            outcome,
            task,
        })
    }

    /// Move forward.
    ///
    /// After a clear this continues at the cleared question's slot, clamped to
    /// the shrunken list, or returns to the list when nothing is left.
    /// Returns whether the view changed.
    pub fn next(&mut self) -> bool {
        let len = self.active_len();
        match self.view {
            ReviewView::List => false,
            ReviewView::JustCleared { slot, .. } => {
                self.view = if len == 0 {
                    ReviewView::List
                } else {
                    ReviewView::Detail {
                        index: slot.min(len - 1),
                        answered: None,
                    }
                };
                true
            }
            ReviewView::Detail { index, .. } => {
                if index + 1 >= len {
                    return false;
                }
                self.view = ReviewView::Detail {
                    index: index + 1,
                    answered: None,
                };
                true
            }
        }
    }

    /// Move back one active question. Returns whether the view changed.
    pub fn previous(&mut self) -> bool {
        match self.view {
            ReviewView::Detail { index, .. } if index > 0 => {
                self.view = ReviewView::Detail {
                    index: index - 1,
                    answered: None,
                };
                true
            }
            _ => false,
        }
    }

    /// Jump to a random other active question.
    ///
    /// Draws up to ten times for an index different from the current one and
    /// keeps the last draw if every draw repeats. Returns the new index, or
    /// `None` when not in an active detail view or fewer than two questions
    /// remain.
    pub fn randomize(&mut self) -> Option<usize> {
        let ReviewView::Detail { index: current, .. } = self.view else {
            return None;
        };
        let len = self.active_len();
        if len <= 1 {
            return None;
        }

        let mut picked = current;
        for _ in 0..RANDOMIZE_MAX_DRAWS {
            picked = self.picker.pick(len).min(len - 1);
            if picked != current {
                break;
            }
        }

        self.view = ReviewView::Detail {
            index: picked,
            answered: None,
        };
        Some(picked)
    }

    /// Return to the list. Cleared questions stay cleared.
    pub fn back_to_list(&mut self) {
        self.view = ReviewView::List;
    }

    /// Change the clearing rule. Streaks restart; cleared questions stay cleared.
    pub fn set_streak_mode(&mut self, enabled: bool) {
        self.tracker.set_mode(ClearMode::from_streak_enabled(enabled));
    }

    /// Start a fresh session for another license class.
    pub fn switch_test_type(
        &mut self,
        test_type: TestType,
        catalog: &[Question],
        weak_ids: &[QuestionId],
    ) {
        info!("switching weak review from {} to {test_type}", self.test_type);
        self.test_type = test_type;
        self.catalog = index_catalog(catalog);
        self.weak = cross_reference(&self.catalog, weak_ids);
        self.tracker.reset();
        self.view = ReviewView::List;
    }

    /// Replace the working list with freshly loaded weak ids.
    ///
    /// Questions cleared this session remain counted even when the fresh
    /// list no longer names them. An open question stays open if it is still
    /// active; otherwise the view falls back to the list.
    pub fn refresh_weak_ids(&mut self, weak_ids: &[QuestionId]) {
        let current = match &self.view {
            ReviewView::Detail { answered, .. } => self
                .current_question()
                .map(|q| (q.id().clone(), *answered)),
            _ => None,
        };

        let mut weak = cross_reference(&self.catalog, weak_ids);
        let fresh: HashSet<QuestionId> = weak.iter().map(|q| q.id().clone()).collect();
        weak.extend(
            self.weak
                .iter()
                .filter(|q| self.tracker.is_cleared(q.id()) && !fresh.contains(q.id()))
                .cloned(),
        );
        self.weak = weak;

        if let Some((id, answered)) = current {
            let position = self.active_questions().iter().position(|q| *q.id() == id);
            self.view = match position {
                Some(index) => ReviewView::Detail { index, answered },
                None => ReviewView::List,
            };
        }
    }

    /// Leave the review screen.
    pub fn leave(&mut self) {
        if let Some(callback) = self.on_back.as_mut() {
            callback();
        }
    }

    fn active_len(&self) -> usize {
        self.weak
            .iter()
            .filter(|q| !self.tracker.is_cleared(q.id()))
            .count()
    }
}

fn index_catalog(catalog: &[Question]) -> HashMap<QuestionId, Question> {
    catalog.iter().map(|q| (q.id().clone(), q.clone())).collect()
}

fn cross_reference(catalog: &HashMap<QuestionId, Question>, ids: &[QuestionId]) -> Vec<Question> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert((*id).clone()))
        .filter_map(|id| catalog.get(id).cloned())
        .collect()
}
