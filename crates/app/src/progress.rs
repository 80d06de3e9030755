use chrono::{DateTime, Utc};
use serde::Serialize;

use exam_core::model::{QuestionId, TestType, UserId};
use services::{AppServices, ProgressError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultLine {
    pub id: u64,
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    pub completed_at: DateTime<Utc>,
}

/// Snapshot of one learner's progress on a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub user: UserId,
    pub test_type: TestType,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub accuracy_percent: u32,
    pub questions_attempted: usize,
    pub weak_question_ids: Vec<QuestionId>,
    pub bookmarks: Vec<QuestionId>,
    pub test_results: Vec<ResultLine>,
}

impl ProgressReport {
    /// # Errors
    ///
    /// Returns `ProgressError` on repository failures.
    pub async fn load(app: &AppServices, test_type: TestType) -> Result<Self, ProgressError> {
        let user = app.user();
        let progress = app.progress();
        let summary = progress.summary(user, test_type).await?;
        let test_results = progress
            .test_results(user, test_type)
            .await?
            .into_iter()
            .map(|(id, result)| ResultLine {
                id: id.value(),
                score: result.score(),
                total: result.total(),
                passed: result.passed(),
                completed_at: result.completed_at(),
            })
            .collect();

        Ok(Self {
            user,
            test_type,
            total_attempts: summary.total_attempts,
            correct_attempts: summary.correct_attempts,
            accuracy_percent: summary.accuracy_percent(),
            questions_attempted: summary.questions_attempted(),
            weak_question_ids: summary.weak_question_ids(),
            bookmarks: app.bookmarks().list(user).await?,
            test_results,
        })
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Progress for {} ({})\n  attempts: {} ({} correct, {}%)\n  questions seen: {}\n",
            self.user,
            self.test_type,
            self.total_attempts,
            self.correct_attempts,
            self.accuracy_percent,
            self.questions_attempted
        );
        out.push_str(&format!("  weak: {}\n", join_ids(&self.weak_question_ids)));
        out.push_str(&format!("  bookmarked: {}\n", join_ids(&self.bookmarks)));
        for line in &self.test_results {
            let verdict = if line.passed { "pass" } else { "fail" };
            out.push_str(&format!(
                "  quiz #{} {}: {}/{} {verdict}\n",
                line.id,
                line.completed_at.format("%Y-%m-%d %H:%M"),
                line.score,
                line.total
            ));
        }
        out
    }
}

fn join_ids(ids: &[QuestionId]) -> String {
    if ids.is_empty() {
        return "none".into();
    }
    ids.iter()
        .map(QuestionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerLetter, AttemptType, Question};
    use exam_core::time::fixed_now;
    use services::Clock;
    use storage::repository::QuestionRepository;

    #[tokio::test]
    async fn report_covers_attempts_weak_ids_and_bookmarks() {
        let app = AppServices::in_memory(Clock::fixed(fixed_now()), UserId::generate());
        let question = Question::new(
            QuestionId::new("T1A01").unwrap(),
            "T1A01",
            "Prompt",
            ["w".into(), "x".into(), "y".into(), "z".into()],
            AnswerLetter::A,
            "T1",
            "T1A",
        )
        .unwrap();
        app.storage()
            .questions
            .upsert_question(TestType::Technician, &question)
            .await
            .unwrap();
        app.attempts()
            .record(&question, AnswerLetter::C, AttemptType::RandomPractice)
            .await
            .unwrap();
        app.bookmarks()
            .toggle(app.user(), question.id())
            .await
            .unwrap();

        let report = ProgressReport::load(&app, TestType::Technician).await.unwrap();
        assert_eq!(report.total_attempts, 1);
        assert_eq!(report.accuracy_percent, 0);
        assert_eq!(report.weak_question_ids, vec![question.id().clone()]);
        assert_eq!(report.bookmarks, vec![question.id().clone()]);

        let text = report.render_text();
        assert!(text.contains("weak: T1A01"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["test_type"], "technician");
        assert_eq!(json["weak_question_ids"][0], "T1A01");
    }
}
