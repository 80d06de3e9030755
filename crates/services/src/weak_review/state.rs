use exam_core::model::{AnswerLetter, Question};

/// Result shown under an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerResult {
    pub selected: AnswerLetter,
    pub correct: bool,
}

/// Which screen the weak-question review is on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReviewView {
    /// All not-yet-cleared weak questions.
    #[default]
    List,
    /// One active question; `index` points into the active list.
    Detail {
        index: usize,
        answered: Option<AnswerResult>,
    },
    /// The question that was just cleared. It is no longer in the active
    /// list; `slot` is where it sat before removal.
    JustCleared {
        question: Question,
        selected: AnswerLetter,
        slot: usize,
    },
}

impl ReviewView {
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, ReviewView::List)
    }

    /// Whether an answer has been chosen for the question on screen.
    #[must_use]
    pub fn has_result(&self) -> bool {
        match self {
            ReviewView::List => false,
            ReviewView::Detail { answered, .. } => answered.is_some(),
            ReviewView::JustCleared { .. } => true,
        }
    }
}

/// Message shown when the active list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    AllCleared,
    NoWeakQuestions,
}

/// Snapshot of the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub questions: Vec<Question>,
    pub cleared_count: usize,
    pub empty: Option<EmptyState>,
}
