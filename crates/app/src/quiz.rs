use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};

use exam_core::model::{AnswerLetter, TestType};
use services::{AppServices, QuizError, TopicQuizController};

use crate::terminal::Terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizCommand {
    Answer(AnswerLetter),
    Next,
    Previous,
    Submit,
    Again,
    Done,
    Unknown,
}

impl QuizCommand {
    fn parse(line: &str) -> Self {
        match line.to_ascii_lowercase().as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Previous,
            "s" | "submit" => Self::Submit,
            "again" => Self::Again,
            "q" | "done" => Self::Done,
            other => other.parse().map_or(Self::Unknown, Self::Answer),
        }
    }
}

/// Verdict of the last submitted attempt, as `(passed, score, total)`.
pub type QuizVerdict = (bool, usize, usize);

/// Run a topic quiz until `done` or end of input.
///
/// Returns the last successful submission, if any.
///
/// # Errors
///
/// Returns an error when no questions match or on terminal failures.
/// Save failures are shown inline and leave the quiz open.
pub async fn run_quiz<R: BufRead, W: Write>(
    app: &AppServices,
    test_type: TestType,
    subelement: Option<&str>,
    passing_threshold: f64,
    term: &mut Terminal<R, W>,
) -> Result<Option<QuizVerdict>, Box<dyn Error>> {
    let verdict = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&verdict);
    let mut quiz = app
        .topic_quiz(test_type, subelement, passing_threshold)
        .await?
        .on_complete(move |passed, score, total| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some((passed, score, total));
        });

    render(&quiz, term)?;
    while let Some(line) = term.read_line("> ")? {
        match QuizCommand::parse(&line) {
            QuizCommand::Done => {
                quiz.done();
                break;
            }
            QuizCommand::Answer(letter) => {
                if let Err(err) = quiz.select_answer(letter) {
                    writeln!(term.out(), "{err}")?;
                }
            }
            QuizCommand::Next => {
                quiz.next();
            }
            QuizCommand::Previous => {
                quiz.previous();
            }
            QuizCommand::Submit => match quiz.submit().await {
                Ok(_) | Err(QuizError::Save(_)) => {}
                Err(err) => writeln!(term.out(), "{err}")?,
            },
            QuizCommand::Again => {
                if quiz.is_results() {
                    quiz.try_again();
                }
            }
            QuizCommand::Unknown => {
                writeln!(term.out(), "a-d answer, n next, p previous, s submit, q done")?;
            }
        }
        render(&quiz, term)?;
    }

    let last = *verdict.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(last)
}

fn render<R: BufRead, W: Write>(
    quiz: &TopicQuizController,
    term: &mut Terminal<R, W>,
) -> std::io::Result<()> {
    if let Some(result) = quiz.result() {
        let verdict = if result.passed() { "PASSED" } else { "FAILED" };
        writeln!(
            term.out(),
            "\n{verdict}: {}/{} ({}%)",
            result.score(),
            result.total(),
            result.percentage()
        )?;
        if !result.missed().is_empty() {
            writeln!(term.out(), "Review these:")?;
            for question in result.missed() {
                writeln!(
                    term.out(),
                    "  {}  {} (answer {})",
                    question.display_label(),
                    question.prompt(),
                    question.correct()
                )?;
            }
        }
        return writeln!(term.out(), "again to retake, q to finish");
    }

    let question = quiz.current_question();
    writeln!(
        term.out(),
        "\n[{}/{}] {}  ({} answered)",
        quiz.current_index() + 1,
        quiz.total(),
        question.display_label(),
        quiz.answered_count()
    )?;
    term.show_question(question, quiz.current_answer())?;
    if let Some(message) = quiz.save_error() {
        writeln!(term.out(), "! {message}")?;
    }
    if quiz.is_last() {
        if quiz.can_submit() {
            writeln!(term.out(), "s to submit")?;
        } else {
            writeln!(term.out(), "Answer every question to submit.")?;
        }
    }
    Ok(())
}
