mod attempt;
mod ids;
mod question;
mod test_result;

pub use ids::{AttemptId, ParseIdError, QuestionId, TestResultId, UserId};

pub use attempt::{Attempt, AttemptError, AttemptType};
pub use question::{AnswerLetter, Question, QuestionError, TestType};
pub use test_result::{TestResult, TestResultError};
