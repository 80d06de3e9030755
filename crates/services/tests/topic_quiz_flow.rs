use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use exam_core::model::{AnswerLetter, AttemptType, Question, QuestionId, TestType, UserId};
use exam_core::time::fixed_now;
use services::{
    AppServices, Clock, QuizAnswer, QuizAttemptSaver, QuizError, QuizSaveError,
    TopicQuizController,
};
use storage::repository::{AttemptRepository, QuestionRepository, TestResultRepository};

fn question(id: &str, correct: AnswerLetter) -> Question {
    Question::new(
        QuestionId::new(id).unwrap(),
        id,
        format!("Prompt {id}"),
        [
            "first".into(),
            "second".into(),
            "third".into(),
            "fourth".into(),
        ],
        correct,
        &id[..2],
        &id[..3],
    )
    .unwrap()
}

fn quiz_of(n: usize) -> Vec<Question> {
    (1..=n)
        .map(|i| question(&format!("T5A{i:02}"), AnswerLetter::C))
        .collect()
}

/// Answers the first `correct` questions right and the rest wrong.
fn answer_all(quiz: &mut TopicQuizController, correct: usize) {
    for i in 0..quiz.total() {
        let letter = if i < correct {
            AnswerLetter::C
        } else {
            AnswerLetter::A
        };
        quiz.select_answer(letter).unwrap();
        quiz.next();
    }
}

/// Fails the first `failures` calls, then succeeds.
struct FlakySaver {
    failures: AtomicUsize,
    calls: Mutex<Vec<Vec<QuizAnswer>>>,
}

impl FlakySaver {
    fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QuizAttemptSaver for FlakySaver {
    async fn save_attempts(&self, answers: &[QuizAnswer]) -> Result<(), QuizSaveError> {
        self.calls.lock().unwrap().push(answers.to_vec());
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(QuizSaveError::new("Could not reach the server"));
        }
        Ok(())
    }
}

#[tokio::test]
async fn pass_boundary_for_five_questions() {
    for (correct, passes) in [(4, true), (3, false)] {
        let mut quiz = TopicQuizController::new(quiz_of(5)).unwrap();
        answer_all(&mut quiz, correct);
        let result = quiz.submit().await.unwrap();
        assert_eq!(result.passed(), passes, "{correct}/5");
    }
}

#[tokio::test]
async fn pass_boundary_for_three_questions() {
    for (correct, passes, pct) in [(3, true, 100), (1, false, 33)] {
        let mut quiz = TopicQuizController::new(quiz_of(3)).unwrap();
        answer_all(&mut quiz, correct);
        let result = quiz.submit().await.unwrap();
        assert_eq!(result.passed(), passes);
        assert_eq!(result.percentage(), pct);
    }
}

#[tokio::test]
async fn submit_enables_on_the_last_missing_answer() {
    let mut quiz = TopicQuizController::new(quiz_of(4)).unwrap();

    // answer out of order, leaving index 1 for last
    for index in [3, 0, 2] {
        while quiz.current_index() > index {
            quiz.previous();
        }
        while quiz.current_index() < index {
            quiz.next();
        }
        quiz.select_answer(AnswerLetter::B).unwrap();
        assert!(!quiz.can_submit());
    }

    quiz.previous();
    assert_eq!(quiz.current_index(), 1);
    assert!(quiz.current_answer().is_none());
    quiz.select_answer(AnswerLetter::C).unwrap();
    assert!(quiz.can_submit());
    assert_eq!(quiz.answered_count(), 4);
}

#[tokio::test]
async fn save_failure_keeps_quiz_open_and_allows_retry() {
    let saver = Arc::new(FlakySaver::new(1));
    let completions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completions);

    let mut quiz = TopicQuizController::new(quiz_of(5))
        .unwrap()
        .with_saver(saver.clone())
        .on_complete(move |passed, score, total| {
            sink.lock().unwrap().push((passed, score, total));
        });
    answer_all(&mut quiz, 4);

    let err = quiz.submit().await.unwrap_err();
    assert!(matches!(err, QuizError::Save(_)));
    assert!(!quiz.is_results());
    assert_eq!(quiz.save_error(), Some("Could not reach the server"));
    assert_eq!(quiz.answered_count(), 5);
    assert!(completions.lock().unwrap().is_empty());

    let result = quiz.submit().await.unwrap();
    assert_eq!((result.score(), result.total()), (4, 5));
    assert!(quiz.is_results());
    assert_eq!(quiz.save_error(), None);
    assert_eq!(*completions.lock().unwrap(), vec![(true, 4, 5)]);

    let calls = saver.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(calls[1].len(), 5);
}

#[tokio::test]
async fn done_keeps_results_and_try_again_resets() {
    let done_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done_calls);
    let mut quiz = TopicQuizController::new(quiz_of(3))
        .unwrap()
        .on_done(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    answer_all(&mut quiz, 2);
    quiz.submit().await.unwrap();

    quiz.done();
    assert_eq!(done_calls.load(Ordering::SeqCst), 1);
    assert!(quiz.is_results());
    assert_eq!(quiz.result().unwrap().missed().len(), 1);

    quiz.try_again();
    assert!(!quiz.is_results());
    assert_eq!(quiz.answered_count(), 0);
    assert!(matches!(
        quiz.submit().await,
        Err(QuizError::Incomplete { answered: 0, .. })
    ));
}

#[tokio::test]
async fn custom_threshold_changes_the_verdict() {
    let mut quiz = TopicQuizController::new(quiz_of(5))
        .unwrap()
        .with_passing_threshold(0.6)
        .unwrap();
    answer_all(&mut quiz, 3);
    assert!(quiz.submit().await.unwrap().passed());
}

#[tokio::test]
async fn app_quiz_persists_result_and_topic_attempts() {
    let user = UserId::generate();
    let app = AppServices::in_memory(Clock::fixed(fixed_now()), user);
    for q in quiz_of(3)
        .into_iter()
        .chain([question("T1A01", AnswerLetter::A)])
    {
        app.storage()
            .questions
            .upsert_question(TestType::Technician, &q)
            .await
            .unwrap();
    }

    let mut quiz = app
        .topic_quiz(TestType::Technician, Some("t5"), 0.8)
        .await
        .unwrap();
    assert_eq!(quiz.total(), 3);
    assert!(quiz.questions().iter().all(|q| q.subelement() == "T5"));

    answer_all(&mut quiz, 3);
    assert!(quiz.submit().await.unwrap().passed());

    let results = app
        .storage()
        .test_results
        .test_results_for_user(user)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].1.score(), 3);

    let attempts = app.storage().attempts.attempts_for_user(user).await.unwrap();
    assert_eq!(attempts.len(), 3);
    assert!(
        attempts
            .iter()
            .all(|r| r.attempt.attempt_type == AttemptType::TopicQuiz)
    );
}

#[tokio::test]
async fn app_quiz_with_no_matching_questions_is_rejected() {
    let app = AppServices::in_memory(Clock::fixed(fixed_now()), UserId::generate());
    let err = app
        .topic_quiz(TestType::Extra, None, 0.8)
        .await
        .err()
        .expect("empty pool");
    assert!(matches!(err, services::AppServicesError::Quiz(QuizError::Empty)));
}
