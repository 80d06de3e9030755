#![forbid(unsafe_code)]

pub mod app_services;
pub mod attempts;
pub mod bookmark_service;
pub mod error;
pub mod progress_service;
pub mod quiz;
pub mod weak_review;

pub use exam_core::Clock;

pub use app_services::AppServices;
pub use attempts::{
    AttemptInvalidator, AttemptRecorder, AttemptService, RecordAttemptTask, RecordStatus,
};
pub use bookmark_service::BookmarkService;
pub use error::{
    AppServicesError, ProgressError, QuizError, QuizSaveError, RecordError, ReviewError,
};
pub use progress_service::{AttemptCache, ProgressService};
pub use quiz::{
    QuizAnswer, QuizAttemptSaver, QuizMode, QuizResult, StorageQuizSaver, TopicQuizController,
};
pub use weak_review::{
    AnswerResult, AnswerSubmission, EmptyState, IndexPicker, ListState, RandomPicker,
    ReviewView, ScriptedPicker, WeakReviewController,
};
