use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{info, warn};
use rand::rng;
use rand::seq::SliceRandom;

use exam_core::model::{AnswerLetter, Question, QuestionId};
use exam_core::quiz::{DEFAULT_PASSING_THRESHOLD, QuizScore, validate_threshold};

use super::saver::{QuizAnswer, QuizAttemptSaver};
use crate::error::QuizError;

type CompleteCallback = Box<dyn FnMut(bool, usize, usize) + Send>;
type DoneCallback = Box<dyn FnMut() + Send>;

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Outcome shown after a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    score: QuizScore,
    missed: Vec<Question>,
}

impl QuizResult {
    fn new(questions: &[Question], score: QuizScore) -> Self {
        let missed = questions
            .iter()
            .zip(score.outcomes())
            .filter(|(_, outcome)| !outcome.correct)
            .map(|(q, _)| q.clone())
            .collect();
        Self { score, missed }
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score.score()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.score.total()
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.score.passed()
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.score.percentage()
    }

    /// Incorrectly answered questions in quiz order; empty for a perfect score.
    #[must_use]
    pub fn missed(&self) -> &[Question] {
        &self.missed
    }

    #[must_use]
    pub fn details(&self) -> &QuizScore {
        &self.score
    }
}

/// Whether the quiz is still being answered or showing results.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizMode {
    Quiz,
    Results(QuizResult),
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Fixed-order quiz over a topic's questions.
///
/// Answers can be changed freely until submission; correctness is only
/// revealed in results.
pub struct TopicQuizController {
    questions: Vec<Question>,
    answers: HashMap<QuestionId, AnswerLetter>,
    current: usize,
    threshold: f64,
    mode: QuizMode,
    save_error: Option<String>,
    saver: Option<Arc<dyn QuizAttemptSaver>>,
    on_complete: Option<CompleteCallback>,
    on_done: Option<DoneCallback>,
}

impl TopicQuizController {
    /// Start a quiz over `questions` in the given order.
    ///
    /// Repeated ids keep their first position only.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when no questions are provided.
    pub fn new(mut questions: Vec<Question>) -> Result<Self, QuizError> {
        let mut seen = HashSet::new();
        questions.retain(|q| seen.insert(q.id().clone()));
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        Ok(Self {
            questions,
            answers: HashMap::new(),
            current: 0,
            threshold: DEFAULT_PASSING_THRESHOLD,
            mode: QuizMode::Quiz,
            save_error: None,
            saver: None,
            on_complete: None,
            on_done: None,
        })
    }

    /// Start a quiz with the question order shuffled once up front.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` when no questions are provided.
    pub fn new_shuffled(mut questions: Vec<Question>) -> Result<Self, QuizError> {
        questions.shuffle(&mut rng());
        Self::new(questions)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Threshold` for a threshold outside `0.0..=1.0`.
    pub fn with_passing_threshold(mut self, threshold: f64) -> Result<Self, QuizError> {
        self.threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_saver(mut self, saver: Arc<dyn QuizAttemptSaver>) -> Self {
        self.saver = Some(saver);
        self
    }

    /// Called with `(passed, score, total)` after a successful submission.
    #[must_use]
    pub fn on_complete(
        mut self,
        callback: impl FnMut(bool, usize, usize) + Send + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_done(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_done = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn passing_threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn mode(&self) -> &QuizMode {
        &self.mode
    }

    #[must_use]
    pub fn is_results(&self) -> bool {
        matches!(self.mode, QuizMode::Results(_))
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.mode {
            QuizMode::Results(result) => Some(result),
            QuizMode::Quiz => None,
        }
    }

    /// Message from the last failed save, shown inline above the quiz.
    #[must_use]
    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<AnswerLetter> {
        self.answers.get(id).copied()
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<AnswerLetter> {
        self.answer_for(self.current_question().id())
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.is_last()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Every question has an answer.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.answered_count() == self.questions.len()
    }

    /// Record or replace the answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Completed` once results are showing.
    pub fn select_answer(&mut self, selected: AnswerLetter) -> Result<(), QuizError> {
        if self.is_results() {
            return Err(QuizError::Completed);
        }
        let id = self.current_question().id().clone();
        self.answers.insert(id, selected);
        Ok(())
    }

    /// Returns whether the index moved.
    pub fn next(&mut self) -> bool {
        if self.is_results() || self.is_last() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Returns whether the index moved.
    pub fn previous(&mut self) -> bool {
        if self.is_results() || self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Score the quiz and, once the saver accepts it, show results.
    ///
    /// A saver failure keeps the quiz open with all answers intact and its
    /// message available from `save_error`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Completed` when already submitted,
    /// `QuizError::Incomplete` while questions are unanswered and
    /// `QuizError::Save` when the saver rejects the submission.
    pub async fn submit(&mut self) -> Result<&QuizResult, QuizError> {
        if self.is_results() {
            return Err(QuizError::Completed);
        }
        if !self.can_submit() {
            return Err(QuizError::Incomplete {
                answered: self.answered_count(),
                total: self.questions.len(),
            });
        }

        if let Some(saver) = self.saver.clone() {
            let answers = self.answered_pairs();
            if let Err(err) = saver.save_attempts(&answers).await {
                warn!("quiz submission not saved: {err}");
                self.save_error = Some(err.message().to_owned());
                return Err(err.into());
            }
        }

        let score = QuizScore::compute(&self.questions, &self.answers, self.threshold);
        let result = QuizResult::new(&self.questions, score);
        info!(
            "quiz submitted: {}/{} ({}%), passed={}",
            result.score(),
            result.total(),
            result.percentage(),
            result.passed()
        );

        self.save_error = None;
        if let Some(callback) = self.on_complete.as_mut() {
            callback(result.passed(), result.score(), result.total());
        }
        self.mode = QuizMode::Results(result);
        self.result().ok_or(QuizError::NotSubmitted)
    }

    /// Fresh attempt over the same questions in the same order.
    pub fn try_again(&mut self) {
        self.answers.clear();
        self.current = 0;
        self.save_error = None;
        self.mode = QuizMode::Quiz;
    }

    /// Close the quiz. State is left as is.
    pub fn done(&mut self) {
        if let Some(callback) = self.on_done.as_mut() {
            callback();
        }
    }

    fn answered_pairs(&self) -> Vec<QuizAnswer> {
        self.questions
            .iter()
            .filter_map(|q| {
                self.answers.get(q.id()).map(|selected| QuizAnswer {
                    question: q.clone(),
                    selected: *selected,
                })
            })
            .collect()
    }
}
