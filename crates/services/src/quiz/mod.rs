mod controller;
mod saver;

pub use controller::{QuizMode, QuizResult, TopicQuizController};
pub use saver::{QuizAnswer, QuizAttemptSaver, StorageQuizSaver};
