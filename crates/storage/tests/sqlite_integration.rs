use std::collections::BTreeMap;

use exam_core::model::{
    Exam, ExamId, ExamResult, OptionLabel, Question, QuestionId, Role, User, UserId,
};
use exam_core::time::fixed_now;
use storage::repository::{ExamRepository, ResultSink, StorageError, UserRecord, UserRepository};
use storage::sqlite::SqliteRepository;

fn build_question(id: u64, correct: OptionLabel) -> Question {
    let mut options = BTreeMap::new();
    options.insert(OptionLabel::A, format!("option A of {id}"));
    options.insert(OptionLabel::B, format!("option B of {id}"));
    options.insert(OptionLabel::C, format!("option C of {id}"));
    Question::new(
        QuestionId::new(id),
        format!("Prompt {id}"),
        Some("https://example.com/diagram.png".to_owned()),
        options,
        correct,
    )
    .unwrap()
}

fn build_exam(id: u64, title: &str) -> Exam {
    Exam::new(
        ExamId::new(id),
        title,
        "Safety induction set",
        Some("induction".to_owned()),
        5,
        false,
        vec![build_question(1, OptionLabel::B), build_question(2, OptionLabel::A)],
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_exam_with_questions() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_exam_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let exam = build_exam(1, "Roundtrip");
    repo.upsert_exam(&exam).await.unwrap();

    let fetched = repo.get_exam(exam.id()).await.unwrap().expect("stored");
    assert_eq!(fetched, exam);
    assert_eq!(fetched.questions()[0].correct_option(), OptionLabel::B);
    assert_eq!(
        fetched.questions()[1].image_url(),
        Some("https://example.com/diagram.png")
    );
}

#[tokio::test]
async fn sqlite_set_live_keeps_single_live_exam() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_live_flag?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = repo.insert_new_exam(&build_exam(0, "First")).await.unwrap();
    let second = repo.insert_new_exam(&build_exam(0, "Second")).await.unwrap();
    assert_ne!(first, second);

    repo.set_live(first).await.unwrap();
    assert_eq!(repo.get_live().await.unwrap().map(|e| e.id()), Some(first));

    repo.set_live(second).await.unwrap();
    let exams = repo.list_exams().await.unwrap();
    let live: Vec<ExamId> = exams.iter().filter(|e| e.is_live()).map(Exam::id).collect();
    assert_eq!(live, vec![second]);

    let err = repo.set_live(ExamId::new(999)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    assert_eq!(repo.get_live().await.unwrap().map(|e| e.id()), Some(second));

    repo.clear_live().await.unwrap();
    assert!(repo.get_live().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_refuses_a_second_live_exam_on_upsert() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_live_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut first = build_exam(1, "First");
    first.set_live(true);
    repo.upsert_exam(&first).await.unwrap();

    let mut second = build_exam(2, "Second");
    second.set_live(true);
    let err = repo.upsert_exam(&second).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let exams = repo.list_exams().await.unwrap();
    let live: Vec<ExamId> = exams.iter().filter(|e| e.is_live()).map(Exam::id).collect();
    assert_eq!(live, vec![ExamId::new(1)]);
}

#[tokio::test]
async fn sqlite_appends_and_lists_results() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_results?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = ExamResult::new(UserId::new(5), ExamId::new(1), "Set A", 5, 3, fixed_now()).unwrap();
    let second = ExamResult::new(UserId::new(6), ExamId::new(1), "Set A", 5, 5, fixed_now()).unwrap();

    let first_id = repo.append_result(&first).await.unwrap();
    let second_id = repo.append_result(&second).await.unwrap();
    assert!(second_id > first_id);

    let fetched = repo.get_result(first_id).await.unwrap();
    assert_eq!(fetched, first);

    let recent = repo.list_recent_results(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, second_id);
    assert_eq!(recent[0].result.correct_answers(), 5);
}

#[tokio::test]
async fn sqlite_enforces_unique_usernames() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_users?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let record = UserRecord {
        user: User::new(
            UserId::new(0),
            "admin",
            "System Administrator",
            Role::Admin,
            None,
            None,
        )
        .unwrap(),
        password: "123".to_owned(),
    };

    let id = repo.insert_new_user(&record).await.unwrap();
    let err = repo.insert_new_user(&record).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let found = repo.find_by_username("admin").await.unwrap().expect("stored");
    assert_eq!(found.user.id(), id);
    assert_eq!(found.password, "123");
    assert!(found.user.is_admin());

    repo.delete_user(id).await.unwrap();
    assert!(repo.find_by_username("admin").await.unwrap().is_none());
}
