use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{QuestionId, TestResultId, UserId};
use crate::model::question::{AnswerLetter, Question};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur while decoding attempt data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("unknown attempt type: {0:?}")]
    UnknownAttemptType(String),
}

//
// ─── ATTEMPT TYPE ─────────────────────────────────────────────────────────────
//

/// Which study flow produced an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptType {
    RandomPractice,
    WeakQuestions,
    TopicQuiz,
    PracticeTest,
    SubelementPractice,
}

impl AttemptType {
    /// Stable storage/wire form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptType::RandomPractice => "random_practice",
            AttemptType::WeakQuestions => "weak_questions",
            AttemptType::TopicQuiz => "topic_quiz",
            AttemptType::PracticeTest => "practice_test",
            AttemptType::SubelementPractice => "subelement_practice",
        }
    }
}

impl fmt::Display for AttemptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptType {
    type Err = AttemptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random_practice" => Ok(Self::RandomPractice),
            "weak_questions" => Ok(Self::WeakQuestions),
            "topic_quiz" => Ok(Self::TopicQuiz),
            "practice_test" => Ok(Self::PracticeTest),
            "subelement_practice" => Ok(Self::SubelementPractice),
            other => Err(AttemptError::UnknownAttemptType(other.to_owned())),
        }
    }
}

//
// ─── ATTEMPT ──────────────────────────────────────────────────────────────────
//

/// One submitted answer.
///
/// Attempts are append-only: created once per submission and never edited.
/// `is_correct` is fixed at creation time from the question's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub selected: AnswerLetter,
    pub is_correct: bool,
    pub attempt_type: AttemptType,
    pub attempted_at: DateTime<Utc>,
    pub test_result_id: Option<TestResultId>,
}

impl Attempt {
    /// Build an attempt for `question`, deriving correctness from its key.
    #[must_use]
    pub fn for_question(
        user_id: UserId,
        question: &Question,
        selected: AnswerLetter,
        attempt_type: AttemptType,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            question_id: question.id().clone(),
            selected,
            is_correct: question.is_correct(selected),
            attempt_type,
            attempted_at,
            test_result_id: None,
        }
    }

    /// Link this attempt to its parent test result.
    #[must_use]
    pub fn with_test_result(mut self, id: TestResultId) -> Self {
        self.test_result_id = Some(id);
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn question() -> Question {
        Question::new(
            QuestionId::new("T5A01").unwrap(),
            "T5A01",
            "Electrical current is measured in which unit?",
            [
                "Volts".into(),
                "Watts".into(),
                "Ohms".into(),
                "Amperes".into(),
            ],
            AnswerLetter::D,
            "T5",
            "T5A",
        )
        .unwrap()
    }

    #[test]
    fn correctness_is_derived_from_key() {
        let user = UserId::generate();
        let right = Attempt::for_question(
            user,
            &question(),
            AnswerLetter::D,
            AttemptType::WeakQuestions,
            fixed_now(),
        );
        assert!(right.is_correct);
        assert_eq!(right.test_result_id, None);

        let wrong = Attempt::for_question(
            user,
            &question(),
            AnswerLetter::A,
            AttemptType::WeakQuestions,
            fixed_now(),
        );
        assert!(!wrong.is_correct);
    }

    #[test]
    fn attempt_type_string_form_is_stable() {
        assert_eq!(AttemptType::TopicQuiz.as_str(), "topic_quiz");
        assert_eq!(
            "weak_questions".parse::<AttemptType>().unwrap(),
            AttemptType::WeakQuestions
        );
        let err = "flashcards".parse::<AttemptType>().unwrap_err();
        assert!(matches!(err, AttemptError::UnknownAttemptType(_)));
    }

    #[test]
    fn links_to_test_result() {
        let attempt = Attempt::for_question(
            UserId::generate(),
            &question(),
            AnswerLetter::D,
            AttemptType::TopicQuiz,
            fixed_now(),
        )
        .with_test_result(TestResultId::new(9));
        assert_eq!(attempt.test_result_id, Some(TestResultId::new(9)));
    }
}
