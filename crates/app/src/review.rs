use std::error::Error;
use std::io::{BufRead, Write};

use log::info;

use exam_core::mastery::MasteryOutcome;
use exam_core::model::{AnswerLetter, TestType};
use services::{AppServices, EmptyState, RecordStatus, ReviewView, WeakReviewController};

use crate::terminal::Terminal;

/// One line of user input on the review screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewCommand {
    Open(usize),
    Answer(AnswerLetter),
    Next,
    Previous,
    Random,
    List,
    Streak,
    Switch(TestType),
    Bookmark,
    Help,
    Quit,
    Unknown,
}

impl ReviewCommand {
    fn parse(line: &str) -> Self {
        let lower = line.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("t ") {
            return rest
                .trim()
                .parse()
                .map_or(Self::Unknown, Self::Switch);
        }
        match lower.as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Previous,
            "r" | "random" => Self::Random,
            "l" | "list" => Self::List,
            "s" | "streak" => Self::Streak,
            "m" | "mark" => Self::Bookmark,
            "?" | "h" | "help" => Self::Help,
            "q" | "quit" => Self::Quit,
            other => {
                if let Ok(letter) = other.parse() {
                    Self::Answer(letter)
                } else if let Ok(number) = other.parse::<usize>() {
                    Self::Open(number)
                } else {
                    Self::Unknown
                }
            }
        }
    }
}

/// Tallies for one review session, after pending writes have settled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    pub answered: usize,
    pub cleared: usize,
    pub failed_writes: usize,
}

/// Run an interactive weak-question review until quit or end of input.
///
/// # Errors
///
/// Returns an error on storage or terminal failures. Failed attempt writes
/// are counted, not returned.
pub async fn run_review<R: BufRead, W: Write>(
    app: &AppServices,
    test_type: TestType,
    streak_mode: bool,
    term: &mut Terminal<R, W>,
) -> Result<ReviewSummary, Box<dyn Error>> {
    let mut review = app
        .weak_review(test_type, streak_mode)
        .await?
        .on_back(|| info!("left weak-question review"));
    let mut pending = Vec::new();
    let mut summary = ReviewSummary::default();

    render(&review, term)?;
    while let Some(line) = term.read_line("> ")? {
        match ReviewCommand::parse(&line) {
            ReviewCommand::Quit => break,
            ReviewCommand::Open(number) => {
                if let Err(err) = review.open(number.saturating_sub(1)) {
                    writeln!(term.out(), "{err}")?;
                }
            }
            ReviewCommand::Answer(letter) => match review.select_answer(letter) {
                Some(submission) => {
                    summary.answered += 1;
                    if submission.outcome == MasteryOutcome::Cleared {
                        summary.cleared += 1;
                    }
                    pending.push(submission.task.dispatch());
                }
                None => writeln!(term.out(), "Nothing to answer here.")?,
            },
            ReviewCommand::Next => {
                if !review.next() {
                    writeln!(term.out(), "No next question.")?;
                }
            }
            ReviewCommand::Previous => {
                if !review.previous() {
                    writeln!(term.out(), "No previous question.")?;
                }
            }
            ReviewCommand::Random => {
                if review.randomize().is_none() {
                    writeln!(term.out(), "Random needs another question to jump to.")?;
                }
            }
            ReviewCommand::List => {
                review.back_to_list();
                let weak = app
                    .progress()
                    .weak_question_ids(app.user(), review.test_type())
                    .await?;
                review.refresh_weak_ids(&weak);
            }
            ReviewCommand::Streak => {
                let enabled = !review.streak_mode();
                review.set_streak_mode(enabled);
                let mode = if enabled { "streak (3 in a row)" } else { "simple" };
                writeln!(term.out(), "Mastery mode: {mode}")?;
            }
            ReviewCommand::Switch(next) => {
                let (catalog, weak) = app.review_inputs(next).await?;
                review.switch_test_type(next, &catalog, &weak);
            }
            ReviewCommand::Bookmark => match review.current_question() {
                Some(question) => {
                    let id = question.id().clone();
                    let marked = app.bookmarks().toggle(app.user(), &id).await?;
                    let verb = if marked { "Bookmarked" } else { "Removed bookmark for" };
                    writeln!(term.out(), "{verb} {id}")?;
                }
                None => writeln!(term.out(), "Open a question to bookmark it.")?,
            },
            ReviewCommand::Help => print_help(term)?,
            ReviewCommand::Unknown => writeln!(term.out(), "Unknown command, ? for help.")?,
        }
        render(&review, term)?;
    }

    review.leave();
    for handle in pending {
        // a panicked write counts as failed
        if !matches!(handle.await, Ok(RecordStatus::Persisted)) {
            summary.failed_writes += 1;
        }
    }
    Ok(summary)
}

fn print_help<R: BufRead, W: Write>(term: &mut Terminal<R, W>) -> std::io::Result<()> {
    let out = term.out();
    writeln!(out, "list:   <number> open, s toggle streak mode, t <class> switch pool")?;
    writeln!(out, "detail: a-d answer, n next, p previous, r random, m bookmark")?;
    writeln!(out, "        l back to list, q quit")
}

fn render<R: BufRead, W: Write>(
    review: &WeakReviewController,
    term: &mut Terminal<R, W>,
) -> std::io::Result<()> {
    match review.view().clone() {
        ReviewView::List => {
            let list = review.list_state();
            let mode = if review.streak_mode() { " [streak]" } else { "" };
            writeln!(
                term.out(),
                "\nWeak questions ({}): {} to review, {} cleared{mode}",
                review.test_type(),
                list.questions.len(),
                list.cleared_count
            )?;
            match list.empty {
                Some(EmptyState::AllCleared) => {
                    writeln!(term.out(), "All weak questions cleared. Nice work!")?;
                }
                Some(EmptyState::NoWeakQuestions) => {
                    writeln!(term.out(), "No weak questions yet. Keep practicing!")?;
                }
                None => {
                    for (i, question) in list.questions.iter().enumerate() {
                        writeln!(
                            term.out(),
                            "{:>3}. {}  {}",
                            i + 1,
                            question.display_label(),
                            question.prompt()
                        )?;
                    }
                }
            }
        }
        ReviewView::Detail { index, answered } => {
            let Some(question) = review.current_question().cloned() else {
                return Ok(());
            };
            let total = review.active_questions().len();
            write!(term.out(), "\n[{}/{total}] {}", index + 1, question.display_label())?;
            if review.streak_mode() {
                write!(
                    term.out(),
                    "  streak {}/{}",
                    review.streak(question.id()),
                    review.tracker().mode().required_streak()
                )?;
            }
            writeln!(term.out())?;
            term.show_question(&question, answered.map(|a| a.selected))?;
            if let Some(result) = answered {
                if result.correct {
                    writeln!(term.out(), "Correct!")?;
                } else {
                    writeln!(
                        term.out(),
                        "Incorrect. The answer is {}.",
                        question.correct()
                    )?;
                }
            }
        }
        ReviewView::JustCleared {
            question, selected, ..
        } => {
            writeln!(term.out(), "\n{}", question.display_label())?;
            term.show_question(&question, Some(selected))?;
            writeln!(term.out(), "Correct! {} cleared.", question.id())?;
        }
    }
    Ok(())
}
