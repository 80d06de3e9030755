use chrono::Duration;
use exam_core::model::{
    AnswerLetter, Attempt, AttemptType, Question, QuestionId, TestResult, TestType, UserId,
};
use exam_core::time::fixed_now;
use storage::repository::{
    AttemptRepository, BookmarkRepository, QuestionRepository, StorageError, TestResultRepository,
};
use storage::sqlite::SqliteRepository;

fn build_question(id: &str, correct: AnswerLetter) -> Question {
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

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_question_pool() {
    let repo = connect("memdb_questions").await;

    let q = build_question("T5A01", AnswerLetter::D);
    repo.upsert_question(TestType::Technician, &q).await.unwrap();
    repo.upsert_question(TestType::General, &build_question("G5B01", AnswerLetter::B))
        .await
        .unwrap();

    let pool = repo
        .questions_for_test_type(TestType::Technician)
        .await
        .unwrap();
    assert_eq!(pool, vec![q.clone()]);

    // upsert replaces in place
    let edited = build_question("T5A01", AnswerLetter::A);
    repo.upsert_question(TestType::Technician, &edited)
        .await
        .unwrap();
    let fetched = repo.get_question(q.id()).await.unwrap().expect("present");
    assert_eq!(fetched.correct(), AnswerLetter::A);

    let missing = repo
        .get_question(&QuestionId::new("T0Z00").unwrap())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn sqlite_appends_attempts_without_catalog_checks() {
    let repo = connect("memdb_attempts").await;
    let user = UserId::generate();

    // question was never stored
    let orphan = build_question("T9Z99", AnswerLetter::B);
    let first = Attempt::for_question(
        user,
        &orphan,
        AnswerLetter::C,
        AttemptType::WeakQuestions,
        fixed_now(),
    );
    let second = Attempt::for_question(
        user,
        &orphan,
        AnswerLetter::B,
        AttemptType::RandomPractice,
        fixed_now() + Duration::minutes(2),
    );

    let id_second = repo.append_attempt(&second).await.unwrap();
    let id_first = repo.append_attempt(&first).await.unwrap();
    assert_ne!(id_first, id_second);

    let history = repo.attempts_for_user(user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, id_first);
    assert_eq!(history[0].attempt, first);
    assert_eq!(history[1].attempt.attempt_type, AttemptType::RandomPractice);
    assert!(history[1].attempt.is_correct);

    let other = repo.attempts_for_user(UserId::generate()).await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn sqlite_records_test_result_with_linked_attempts() {
    let repo = connect("memdb_results").await;
    let user = UserId::generate();
    let questions = [
        build_question("T1A01", AnswerLetter::C),
        build_question("T1A02", AnswerLetter::C),
    ];
    let attempts: Vec<Attempt> = questions
        .iter()
        .map(|q| {
            Attempt::for_question(user, q, AnswerLetter::C, AttemptType::TopicQuiz, fixed_now())
        })
        .collect();
    let result = TestResult::new(user, TestType::Technician, 2, 2, true, fixed_now()).unwrap();

    let result_id = repo.record_test_result(&result, &attempts).await.unwrap();

    let history = repo.attempts_for_user(user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(
        history
            .iter()
            .all(|r| r.attempt.test_result_id == Some(result_id))
    );

    let results = repo.test_results_for_user(user).await.unwrap();
    assert_eq!(results, vec![(result_id, result)]);
}

#[tokio::test]
async fn sqlite_rejects_mismatched_users_atomically() {
    let repo = connect("memdb_results_conflict").await;
    let user = UserId::generate();
    let q = build_question("T1A01", AnswerLetter::C);
    let foreign = Attempt::for_question(
        UserId::generate(),
        &q,
        AnswerLetter::C,
        AttemptType::TopicQuiz,
        fixed_now(),
    );
    let result = TestResult::new(user, TestType::Technician, 1, 1, true, fixed_now()).unwrap();

    let err = repo
        .record_test_result(&result, &[foreign])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert!(repo.test_results_for_user(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_bookmarks_are_idempotent() {
    let repo = connect("memdb_bookmarks").await;
    let user = UserId::generate();
    let a = QuestionId::new("T1A01").unwrap();
    let b = QuestionId::new("T1A02").unwrap();

    assert!(repo.add_bookmark(user, &a, fixed_now()).await.unwrap());
    assert!(!repo.add_bookmark(user, &a, fixed_now()).await.unwrap());
    assert!(
        repo.add_bookmark(user, &b, fixed_now() + Duration::seconds(1))
            .await
            .unwrap()
    );
    assert_eq!(repo.list_bookmarks(user).await.unwrap(), vec![a.clone(), b]);

    assert!(repo.remove_bookmark(user, &a).await.unwrap());
    assert!(!repo.remove_bookmark(user, &a).await.unwrap());
    assert_eq!(repo.list_bookmarks(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
