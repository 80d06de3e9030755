//! Scoring for fixed-length quizzes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerLetter, Question, QuestionId};

/// Fraction of correct answers needed to pass when no threshold is configured.
pub const DEFAULT_PASSING_THRESHOLD: f64 = 0.8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuizThresholdError {
    #[error("passing threshold must be in (0, 1], got {provided}")]
    OutOfRange { provided: f64 },
}

/// Validate a passing threshold.
///
/// # Errors
///
/// Returns `QuizThresholdError::OutOfRange` for non-finite values or values
/// outside `(0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<f64, QuizThresholdError> {
    if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
        Ok(threshold)
    } else {
        Err(QuizThresholdError::OutOfRange {
            provided: threshold,
        })
    }
}

/// Per-question scoring detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub selected: Option<AnswerLetter>,
    pub correct_answer: AnswerLetter,
    pub correct: bool,
}

/// Score of a submitted quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    outcomes: Vec<QuestionOutcome>,
    score: usize,
    passed: bool,
}

impl QuizScore {
    /// Score `answers` against `questions`, in question order.
    ///
    /// Unanswered questions count as incorrect. `passed` is
    /// `score / total >= threshold`, so a score landing exactly on the
    /// threshold passes.
    #[must_use]
    pub fn compute(
        questions: &[Question],
        answers: &HashMap<QuestionId, AnswerLetter>,
        threshold: f64,
    ) -> Self {
        let outcomes: Vec<QuestionOutcome> = questions
            .iter()
            .map(|q| {
                let selected = answers.get(q.id()).copied();
                QuestionOutcome {
                    question_id: q.id().clone(),
                    selected,
                    correct_answer: q.correct(),
                    correct: selected == Some(q.correct()),
                }
            })
            .collect();

        let score = outcomes.iter().filter(|o| o.correct).count();
        let passed = passes(score, outcomes.len(), threshold);

        Self {
            outcomes,
            score,
            passed,
        }
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.score == self.outcomes.len()
    }

    #[must_use]
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }

    /// Questions answered incorrectly, in quiz order.
    pub fn missed(&self) -> impl Iterator<Item = &QuestionOutcome> {
        self.outcomes.iter().filter(|o| !o.correct)
    }

    /// Score as a whole percentage, rounded half up.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.score, self.total())
    }
}

#[allow(clippy::cast_precision_loss)]
fn passes(score: usize, total: usize, threshold: f64) -> bool {
    if total == 0 {
        return false;
    }
    (score as f64) / (total as f64) >= threshold
}

/// Whole percentage of `part` in `total`, rounded half up; 0 for an empty total.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64) * 100.0 / (total as f64)).round() as u32
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question(n: usize) -> Question {
        Question::new(
            QuestionId::new(format!("T0A{n:02}")).unwrap(),
            "",
            format!("Question {n}"),
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerLetter::A,
            "T0",
            "T0A",
        )
        .unwrap()
    }

    fn answers_with(questions: &[Question], correct: usize) -> HashMap<QuestionId, AnswerLetter> {
        questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let letter = if i < correct {
                    AnswerLetter::A
                } else {
                    AnswerLetter::B
                };
                (q.id().clone(), letter)
            })
            .collect()
    }

    #[test]
    fn exactly_eighty_percent_passes() {
        let qs: Vec<_> = (1..=5).map(question).collect();

        let four = QuizScore::compute(&qs, &answers_with(&qs, 4), DEFAULT_PASSING_THRESHOLD);
        assert_eq!(four.score(), 4);
        assert!(four.passed());
        assert_eq!(four.percentage(), 80);

        let three = QuizScore::compute(&qs, &answers_with(&qs, 3), DEFAULT_PASSING_THRESHOLD);
        assert!(!three.passed());
        assert_eq!(three.percentage(), 60);
    }

    #[test]
    fn three_question_quiz_boundaries() {
        let qs: Vec<_> = (1..=3).map(question).collect();

        let all = QuizScore::compute(&qs, &answers_with(&qs, 3), DEFAULT_PASSING_THRESHOLD);
        assert!(all.passed());
        assert!(all.is_perfect());
        assert_eq!(all.missed().count(), 0);

        let one = QuizScore::compute(&qs, &answers_with(&qs, 1), DEFAULT_PASSING_THRESHOLD);
        assert!(!one.passed());
        assert_eq!(one.percentage(), 33);
        let missed: Vec<_> = one.missed().map(|o| o.question_id.clone()).collect();
        assert_eq!(missed, vec![qs[1].id().clone(), qs[2].id().clone()]);
    }

    #[test]
    fn unanswered_counts_as_incorrect() {
        let qs: Vec<_> = (1..=2).map(question).collect();
        let mut answers = HashMap::new();
        answers.insert(qs[0].id().clone(), AnswerLetter::A);

        let score = QuizScore::compute(&qs, &answers, 0.5);
        assert_eq!(score.score(), 1);
        assert!(score.passed());
        assert_eq!(score.outcomes()[1].selected, None);
    }

    #[test]
    fn threshold_validation() {
        assert_eq!(validate_threshold(0.8), Ok(0.8));
        assert_eq!(validate_threshold(1.0), Ok(1.0));
        assert!(validate_threshold(0.0).is_err());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }
}
