use assessment_core::model::{AnswerValue, CategoryKey, CategoryStatus, Question, QuestionId, UserId};
use storage::repository::{
    CategorySubmission, ProgressRepository, ProgressResponses, QuestionRepository,
    SessionGateway, StorageError, SubmissionRepository, SubmittedAnswer,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str, user: u64) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url, UserId::new(user))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn responses(pairs: &[(usize, &str)]) -> ProgressResponses {
    pairs
        .iter()
        .map(|(index, value)| (*index, AnswerValue::from(*value)))
        .collect()
}

#[tokio::test]
async fn sqlite_questions_keep_seeded_order() {
    let repo = connect("memdb_questions", 1).await;
    let key = CategoryKey::new("HowGard");
    repo.replace_questions(
        &key,
        &[
            Question::new("10", "Third by id, first by position"),
            Question::new("2", "Second"),
        ],
    )
    .await
    .unwrap();

    let loaded = repo.load_questions(&key).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, QuestionId::from("10"));
    assert_eq!(loaded[1].prompt, "Second");

    let empty = repo.load_questions(&CategoryKey::new("Attitude")).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn sqlite_draft_round_trips_and_missing_is_none() {
    let repo = connect("memdb_drafts", 1).await;
    let key = CategoryKey::new("Attitude");

    assert_eq!(repo.load_saved_responses(&key).await.unwrap(), None);

    let saved = responses(&[(0, "3"), (4, "1")]);
    repo.save_progress(&key, 2, &saved).await.unwrap();

    assert_eq!(repo.load_saved_responses(&key).await.unwrap(), Some(saved));
    let statuses = repo.load_category_status().await.unwrap();
    let record = statuses.get(&key).expect("status row");
    assert_eq!(record.status, CategoryStatus::InProgress);
    assert_eq!(record.current_progress, 2);
    assert!(record.last_updated.is_some());
}

#[tokio::test]
async fn sqlite_progress_is_scoped_per_user() {
    let alice = connect("memdb_users", 1).await;
    let bob = alice.for_user(UserId::new(2));
    assert_eq!(alice.user_id(), UserId::new(1));
    assert_eq!(bob.user_id(), UserId::new(2));
    let key = CategoryKey::new("HowGard");

    alice
        .save_progress(&key, 1, &responses(&[(0, "4")]))
        .await
        .unwrap();

    assert_eq!(bob.load_saved_responses(&key).await.unwrap(), None);
    assert!(bob.load_category_status().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_submission_marks_category_and_survives_late_save() {
    let repo = connect("memdb_submit", 7).await;
    let key = CategoryKey::new("Motivational");

    let mut submission = CategorySubmission::new();
    submission.insert(
        QuestionId::from("q1"),
        SubmittedAnswer {
            question: "Recognition matters".into(),
            score: 5,
        },
    );
    repo.submit_category(&key, &submission).await.unwrap();

    // An autosave that lands after the submission must not reopen the category.
    repo.save_progress(&key, 1, &responses(&[(0, "5")]))
        .await
        .unwrap();

    let statuses = repo.load_category_status().await.unwrap();
    assert_eq!(statuses.status_of(&key), CategoryStatus::Submitted);
    assert_eq!(statuses.get(&key).unwrap().current_progress, 1);
    assert_eq!(repo.get_submission(&key).await.unwrap(), submission);

    let missing = repo
        .get_submission(&CategoryKey::new("HowGard"))
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_logout_records_timestamp() {
    let repo = connect("memdb_logout", 3).await;
    assert!(repo.last_logout_at().await.unwrap().is_none());

    repo.logout().await.unwrap();

    assert!(repo.last_logout_at().await.unwrap().is_some());
}
