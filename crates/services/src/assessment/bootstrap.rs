//! Loading everything a session needs before the user sees the first screen.

use futures::future::try_join_all;
use tracing::{debug, error, warn};

use assessment_core::model::{AnswerStore, AnswerValue, CategoryCatalog, CategoryStatusMap, QuestionBank};
use storage::repository::{ProgressRepository, QuestionRepository, StorageError};

use crate::error::BootstrapError;

/// Load every category's questions concurrently. Any failure is fatal.
pub(crate) async fn load_question_bank(
    catalog: &CategoryCatalog,
    questions: &dyn QuestionRepository,
) -> Result<QuestionBank, BootstrapError> {
    let loads = catalog.iter().map(|category| async move {
        questions.load_questions(category.key()).await.map_err(|source| {
            error!(category = %category.key(), error = %source, "failed to load questions");
            BootstrapError::Questions {
                category: category.key().clone(),
                source,
            }
        })
    });

    let sets = try_join_all(loads).await?;
    Ok(QuestionBank::new(sets))
}

/// Status map for every category. A failed load starts from an empty map.
pub(crate) async fn load_statuses(progress: &dyn ProgressRepository) -> CategoryStatusMap {
    match progress.load_category_status().await {
        Ok(statuses) => statuses,
        Err(err) => {
            warn!(error = %err, "failed to load category status, treating all as not started");
            CategoryStatusMap::new()
        }
    }
}

/// Hydrate saved drafts into a fresh answer store.
///
/// A missing draft, a `NotFound` and any other failure all leave the category
/// empty. Indices past the loaded question count are dropped.
pub(crate) async fn load_answers(
    catalog: &CategoryCatalog,
    questions: &QuestionBank,
    progress: &dyn ProgressRepository,
) -> AnswerStore {
    let mut answers = AnswerStore::new();

    for (index, category) in catalog.iter().enumerate() {
        let responses = match progress.load_saved_responses(category.key()).await {
            Ok(Some(responses)) => responses,
            Ok(None) | Err(StorageError::NotFound) => {
                debug!(category = %category.key(), "no saved responses");
                continue;
            }
            Err(err) => {
                warn!(category = %category.key(), error = %err, "failed to load saved responses");
                continue;
            }
        };

        let total = questions.total(index);
        let (kept, dropped): (Vec<(usize, AnswerValue)>, Vec<_>) = responses
            .into_iter()
            .partition(|(question, _)| *question < total);
        if !dropped.is_empty() {
            warn!(
                category = %category.key(),
                dropped = dropped.len(),
                total,
                "saved responses reference questions that are not loaded"
            );
        }

        answers.hydrate_category(index, kept);
    }

    answers
}

#[cfg(test)]
mod tests {
    use super::*;
    use assessment_core::model::{AnswerKey, CategoryKey, CategoryStatus, Question, StatusRecord};
    use storage::repository::{InMemoryRepository, ProgressResponses};

    fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for key in ["HowGard", "Attitude", "Motivational"] {
            repo.insert_questions(
                CategoryKey::new(key),
                vec![Question::new("1", "First"), Question::new("2", "Second")],
            );
        }
        repo
    }

    #[tokio::test]
    async fn question_bank_follows_catalog_order() {
        let repo = seeded();
        repo.insert_questions(CategoryKey::new("Attitude"), vec![Question::new("a", "Only")]);
        let catalog = CategoryCatalog::standard();

        let bank = load_question_bank(&catalog, &repo).await.unwrap();

        assert_eq!(bank.total(0), 2);
        assert_eq!(bank.total(1), 1);
        assert_eq!(bank.total(2), 2);
    }

    #[tokio::test]
    async fn question_failure_is_fatal() {
        let repo = seeded();
        repo.fail_question_loads(true);

        let err = load_question_bank(&CategoryCatalog::standard(), &repo)
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Questions { .. }));
    }

    #[tokio::test]
    async fn status_failure_falls_back_to_empty() {
        let repo = seeded();
        repo.insert_status(
            CategoryKey::new("HowGard"),
            StatusRecord {
                status: CategoryStatus::Submitted,
                ..StatusRecord::default()
            },
        );
        assert_eq!(load_statuses(&repo).await.len(), 1);

        repo.fail_status_loads(true);
        assert!(load_statuses(&repo).await.is_empty());
    }

    #[tokio::test]
    async fn hydration_drops_out_of_range_indices() {
        let repo = seeded();
        let draft: ProgressResponses = [(0, "2"), (1, "3"), (9, "1")]
            .into_iter()
            .map(|(i, v)| (i, AnswerValue::from(v)))
            .collect();
        repo.insert_draft(CategoryKey::new("Motivational"), draft);
        let catalog = CategoryCatalog::standard();
        let bank = load_question_bank(&catalog, &repo).await.unwrap();

        let answers = load_answers(&catalog, &bank, &repo).await;

        assert_eq!(answers.len(), 2);
        assert_eq!(
            answers.get(AnswerKey::new(2, 1)),
            Some(&AnswerValue::from("3"))
        );
        assert!(!answers.contains(AnswerKey::new(2, 9)));
        assert_eq!(answers.count_in_category(0), 0);
    }
}
