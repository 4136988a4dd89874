use std::time::Duration;

use assessment_core::model::{
    AnswerValue, CategoryCatalog, CategoryKey, CategoryStatus, Question, QuestionId,
};
use services::{Advance, AssessmentService, BootstrapError, SessionCursor, SessionError};
use storage::repository::{InMemoryRepository, ProgressResponses, Storage, SubmittedAnswer};

fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.insert_questions(
        CategoryKey::new("HowGard"),
        vec![
            Question::new("q1", "I enjoy number puzzles."),
            Question::new("q2", "I notice patterns in music."),
        ],
    );
    repo.insert_questions(
        CategoryKey::new("Attitude"),
        vec![
            Question::new("a1", "I plan before I act."),
            Question::new("a2", "I stay calm when plans change."),
        ],
    );
    repo.insert_questions(
        CategoryKey::new("Motivational"),
        vec![Question::new("m1", "Recognition matters to me.")],
    );
    repo
}

fn service(repo: &InMemoryRepository) -> AssessmentService {
    AssessmentService::from_storage(CategoryCatalog::standard(), &Storage::from_in_memory(repo))
}

fn draft(pairs: &[(usize, &str)]) -> ProgressResponses {
    pairs
        .iter()
        .map(|(index, value)| (*index, AnswerValue::from(*value)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn finishing_a_category_submits_scores_by_question_id() {
    let repo = seeded_repo();
    let mut session = service(&repo).start_session().await.expect("start");
    let how_gard = CategoryKey::new("HowGard");

    assert_eq!(session.select_category(0).await.unwrap(), 0);
    session.answer(AnswerValue::from("3")).unwrap();
    assert_eq!(session.submit_answer().await.unwrap(), Advance::NextQuestion(1));
    session.answer(AnswerValue::from("1")).unwrap();
    assert_eq!(
        session.submit_answer().await.unwrap(),
        Advance::Submitted { category: 0 }
    );

    let submission = repo.submission(&how_gard).expect("submission stored");
    assert_eq!(submission.len(), 2);
    assert_eq!(
        submission[&QuestionId::from("q1")],
        SubmittedAnswer {
            question: "I enjoy number puzzles.".into(),
            score: 3,
        }
    );
    assert_eq!(submission[&QuestionId::from("q2")].score, 1);

    assert_eq!(repo.status(&how_gard), CategoryStatus::Submitted);
    assert_eq!(session.cursor(), SessionCursor::CategorySelection);
    assert!(session.category_progress(0).unwrap().is_submitted());

    // The final draft is saved once alongside the submission; the debounce
    // timer armed by the last answer never fires.
    assert_eq!(repo.save_log().len(), 1);
    assert_eq!(repo.draft(&how_gard), Some(draft(&[(0, "3"), (1, "1")])));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(repo.save_log().len(), 1);
    assert_eq!(repo.status(&how_gard), CategoryStatus::Submitted);
}

#[tokio::test(start_paused = true)]
async fn submitted_answers_survive_a_reload() {
    let repo = seeded_repo();
    let service = service(&repo);
    let mut session = service.start_session().await.unwrap();

    session.select_category(0).await.unwrap();
    session.answer(AnswerValue::from("3")).unwrap();
    session.submit_answer().await.unwrap();
    session.answer(AnswerValue::from("1")).unwrap();
    assert_eq!(
        session.submit_answer().await.unwrap(),
        Advance::Submitted { category: 0 }
    );
    session.logout().await;

    let mut reloaded = service.start_session().await.unwrap();
    let progress = reloaded.category_progress(0).unwrap();
    assert!(progress.is_submitted());
    assert_eq!((progress.answered, progress.total), (2, 2));
    assert_eq!(reloaded.overall_progress().answered, 2);

    reloaded.select_category(0).await.unwrap();
    assert_eq!(reloaded.current_answer(), Some(&AnswerValue::from("3")));
    reloaded.skip().await.unwrap();
    assert_eq!(reloaded.current_answer(), Some(&AnswerValue::from("1")));
}

#[tokio::test(start_paused = true)]
async fn answered_count_never_exceeds_question_count() {
    let repo = seeded_repo();
    let mut session = service(&repo).start_session().await.unwrap();

    fn check(session: &services::AssessmentSession, category: usize) {
        let progress = session.category_progress(category).unwrap();
        assert!(
            progress.answered <= progress.total,
            "answered {} of {} after {:?}",
            progress.answered,
            progress.total,
            session.cursor()
        );
    }

    session.select_category(1).await.unwrap();
    check(&session, 1);

    session.answer(AnswerValue::from("2")).unwrap();
    check(&session, 1);
    session.answer(AnswerValue::from("4")).unwrap();
    check(&session, 1);
    session.skip().await.unwrap();
    check(&session, 1);
    session.previous().await.unwrap();
    session.answer(AnswerValue::from("1")).unwrap();
    check(&session, 1);
    session.skip().await.unwrap();
    session.answer(AnswerValue::from("3")).unwrap();
    check(&session, 1);
    session.previous().await.unwrap();
    session.answer(AnswerValue::from("2")).unwrap();
    check(&session, 1);
    session.submit_answer().await.unwrap();
    session.answer(AnswerValue::from("3")).unwrap();
    check(&session, 1);
    assert_eq!(
        session.submit_answer().await.unwrap(),
        Advance::Submitted { category: 1 }
    );
    check(&session, 1);

    // Review pass over the submitted category.
    session.select_category(1).await.unwrap();
    for _ in 0..2 {
        assert!(session.answer(AnswerValue::from("4")).is_err());
        session.skip().await.unwrap();
        check(&session, 1);
    }
    assert_eq!(session.cursor(), SessionCursor::CategorySelection);

    let progress = session.category_progress(1).unwrap();
    assert_eq!((progress.answered, progress.total), (2, 2));
    assert!(session.overall_progress().answered <= session.overall_progress().total);
}

#[tokio::test(start_paused = true)]
async fn failed_submission_keeps_user_on_last_question() {
    let repo = seeded_repo();
    repo.fail_submissions(true);
    let mut session = service(&repo).start_session().await.unwrap();

    session.select_category(2).await.unwrap();
    session.answer(AnswerValue::from("5")).unwrap();
    let err = session.submit_answer().await.unwrap_err();

    assert!(matches!(err, SessionError::Submission { .. }));
    assert_eq!(
        session.cursor(),
        SessionCursor::Answering {
            category: 2,
            question: 0
        }
    );
    assert!(!session.statuses().is_submitted(&CategoryKey::new("Motivational")));
    assert_eq!(session.current_answer(), Some(&AnswerValue::from("5")));
}

#[tokio::test(start_paused = true)]
async fn previous_from_first_question_returns_to_selection_and_saves() {
    let repo = seeded_repo();
    let mut session = service(&repo).start_session().await.unwrap();

    session.select_category(1).await.unwrap();
    session.answer(AnswerValue::from("2")).unwrap();
    session.skip().await.unwrap();
    assert_eq!(
        session.previous().await.unwrap(),
        SessionCursor::Answering {
            category: 1,
            question: 0
        }
    );
    assert!(repo.save_log().is_empty());

    assert_eq!(
        session.previous().await.unwrap(),
        SessionCursor::CategorySelection
    );
    let log = repo.save_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].category, CategoryKey::new("Attitude"));
    assert_eq!(log[0].responses, draft(&[(0, "2")]));
}

#[tokio::test(start_paused = true)]
async fn logout_closes_even_when_save_and_logout_fail() {
    let repo = seeded_repo();
    let mut session = service(&repo).start_session().await.unwrap();
    session.select_category(0).await.unwrap();
    session.answer(AnswerValue::from("4")).unwrap();

    repo.fail_saves(true);
    repo.fail_logout(true);
    session.logout().await;

    assert!(session.is_closed());
    assert_eq!(session.cursor(), SessionCursor::Closed);
    assert_eq!(repo.logouts(), 1);
    assert!(matches!(session.skip().await, Err(SessionError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn saved_drafts_resume_where_the_user_left_off() {
    let repo = seeded_repo();
    repo.insert_draft(CategoryKey::new("HowGard"), draft(&[(0, "2"), (1, "3")]));
    repo.insert_draft(CategoryKey::new("Attitude"), draft(&[(0, "1")]));

    let mut session = service(&repo).start_session().await.unwrap();

    assert_eq!(session.overall_progress().answered, 3);
    assert_eq!(session.overall_progress().total, 5);
    assert_eq!(session.next_incomplete_category(), 1);

    assert_eq!(session.start_next_category().await.unwrap(), 1);
    assert_eq!(
        session.cursor(),
        SessionCursor::Answering {
            category: 1,
            question: 1
        }
    );

    // A fully answered category reopens at its first question.
    session.back_to_category_selection().await.unwrap();
    assert_eq!(session.select_category(0).await.unwrap(), 0);
    assert_eq!(session.current_answer(), Some(&AnswerValue::from("2")));
}

#[tokio::test(start_paused = true)]
async fn draft_entries_past_the_question_list_are_dropped() {
    let repo = seeded_repo();
    repo.insert_draft(CategoryKey::new("Motivational"), draft(&[(0, "4"), (3, "2")]));

    let session = service(&repo).start_session().await.unwrap();

    assert_eq!(session.answers().count_in_category(2), 1);
    let progress = session.category_progress(2).unwrap();
    assert_eq!((progress.answered, progress.total), (1, 1));
    assert!((progress.percent() - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn question_load_failure_prevents_start() {
    let repo = seeded_repo();
    repo.fail_question_loads(true);

    let err = service(&repo).start_session().await.unwrap_err();
    assert!(matches!(err, BootstrapError::Questions { .. }));
}

#[tokio::test]
async fn status_load_failure_starts_with_nothing_submitted() {
    let repo = seeded_repo();
    repo.fail_status_loads(true);

    let session = service(&repo).start_session().await.unwrap();

    assert!(session.statuses().is_empty());
    assert!(!session.all_submitted());
    assert_eq!(session.next_incomplete_category(), 0);
}

#[tokio::test(start_paused = true)]
async fn submitted_category_can_be_reviewed_but_not_changed() {
    let repo = seeded_repo();
    let mut session = service(&repo).start_session().await.unwrap();

    session.select_category(2).await.unwrap();
    session.answer(AnswerValue::from("4")).unwrap();
    assert_eq!(
        session.submit_answer().await.unwrap(),
        Advance::Submitted { category: 2 }
    );

    session.select_category(2).await.unwrap();
    assert_eq!(session.current_answer(), Some(&AnswerValue::from("4")));
    assert!(matches!(
        session.answer(AnswerValue::from("1")),
        Err(SessionError::CategorySubmitted(_))
    ));
    assert_eq!(
        session.submit_answer().await.unwrap(),
        Advance::ReviewFinished { category: 2 }
    );
    assert_eq!(
        repo.submission(&CategoryKey::new("Motivational")).unwrap()[&QuestionId::from("m1")].score,
        4
    );
}
