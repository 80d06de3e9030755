mod controller;
mod picker;
mod state;

pub use controller::{AnswerSubmission, WeakReviewController};
pub use picker::{IndexPicker, RandomPicker, ScriptedPicker};
pub use state::{AnswerResult, EmptyState, ListState, ReviewView};
