//! Progress derived from the answer store, the loaded questions and the
//! server-reported status map. Nothing here is cached: every call rescans.

use crate::model::{AnswerStore, CategoryCatalog, CategoryStatus, CategoryStatusMap, QuestionBank};

/// `numerator / denominator * 100`, or 0 when there is nothing to count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Per-category progress, as shown on the category selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryProgress {
    pub status: CategoryStatus,
    pub answered: usize,
    pub total: usize,
}

impl CategoryProgress {
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.answered, self.total)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status.is_submitted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverallProgress {
    pub answered: usize,
    pub total: usize,
}

impl OverallProgress {
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.answered, self.total)
    }
}

/// Read-only view combining everything progress depends on.
#[derive(Debug, Clone, Copy)]
pub struct ProgressAggregator<'a> {
    catalog: &'a CategoryCatalog,
    questions: &'a QuestionBank,
    answers: &'a AnswerStore,
    statuses: &'a CategoryStatusMap,
}

impl<'a> ProgressAggregator<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a CategoryCatalog,
        questions: &'a QuestionBank,
        answers: &'a AnswerStore,
        statuses: &'a CategoryStatusMap,
    ) -> Self {
        Self {
            catalog,
            questions,
            answers,
            statuses,
        }
    }

    /// Progress of the category at `index`, or `None` for an unknown index.
    #[must_use]
    pub fn category(&self, index: usize) -> Option<CategoryProgress> {
        let category = self.catalog.get(index)?;
        let answered = self.answers.count_in_category(index);
        let status = if self.statuses.is_submitted(category.key()) {
            CategoryStatus::Submitted
        } else if answered > 0 {
            CategoryStatus::InProgress
        } else {
            CategoryStatus::NotStarted
        };

        Some(CategoryProgress {
            status,
            answered,
            total: self.questions.total(index),
        })
    }

    /// Progress of every category in display order.
    #[must_use]
    pub fn categories(&self) -> Vec<CategoryProgress> {
        (0..self.catalog.len())
            .filter_map(|index| self.category(index))
            .collect()
    }

    #[must_use]
    pub fn overall(&self) -> OverallProgress {
        OverallProgress {
            answered: self.answers.len(),
            total: (0..self.catalog.len())
                .map(|index| self.questions.total(index))
                .sum(),
        }
    }

    /// Every category has been submitted.
    #[must_use]
    pub fn all_submitted(&self) -> bool {
        self.catalog
            .iter()
            .all(|category| self.statuses.is_submitted(category.key()))
    }

    #[must_use]
    pub fn has_any_progress(&self) -> bool {
        !self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, CategoryKey, Question, StatusRecord};

    fn bank(sizes: &[usize]) -> QuestionBank {
        QuestionBank::new(
            sizes
                .iter()
                .map(|n| {
                    (0..*n)
                        .map(|i| Question::new(format!("q{i}"), "prompt"))
                        .collect()
                })
                .collect(),
        )
    }

    fn submitted(key: &str) -> CategoryStatusMap {
        std::iter::once((
            CategoryKey::new(key),
            StatusRecord {
                status: CategoryStatus::Submitted,
                current_progress: 0,
                last_updated: None,
            },
        ))
        .collect()
    }

    #[test]
    fn percent_guards_zero_denominator() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(4, 4), 100.0);
        assert_eq!(percent(1, 4), 25.0);
        assert!(!percent(0, 0).is_nan());
    }

    #[test]
    fn display_status_prefers_server_submission() {
        let catalog = CategoryCatalog::standard();
        let questions = bank(&[2, 3, 4]);
        let mut answers = AnswerStore::new();
        answers.set(AnswerKey::new(1, 0), "2".into());
        let statuses = submitted("Motivational");

        let agg = ProgressAggregator::new(&catalog, &questions, &answers, &statuses);
        let all = agg.categories();

        assert_eq!(all[0].status, CategoryStatus::NotStarted);
        assert_eq!(all[1].status, CategoryStatus::InProgress);
        assert_eq!(all[2].status, CategoryStatus::Submitted);
        assert_eq!(all[1].answered, 1);
        assert_eq!(all[1].total, 3);
    }

    #[test]
    fn overall_counts_every_answer() {
        let catalog = CategoryCatalog::standard();
        let questions = bank(&[2, 2, 0]);
        let mut answers = AnswerStore::new();
        answers.set(AnswerKey::new(0, 0), "1".into());
        answers.set(AnswerKey::new(0, 1), "1".into());
        answers.set(AnswerKey::new(1, 0), "1".into());
        answers.set(AnswerKey::new(1, 1), "1".into());
        let statuses = CategoryStatusMap::new();

        let agg = ProgressAggregator::new(&catalog, &questions, &answers, &statuses);
        let overall = agg.overall();
        assert_eq!(overall.answered, 4);
        assert_eq!(overall.total, 4);
        assert_eq!(overall.percent(), 100.0);

        let empty = agg.category(2).unwrap();
        assert_eq!(empty.percent(), 0.0);
        assert!(agg.category(3).is_none());
        assert!(agg.has_any_progress());
        assert!(!agg.all_submitted());
    }

    #[test]
    fn empty_session_reports_zero_percent() {
        let catalog = CategoryCatalog::standard();
        let questions = QuestionBank::default();
        let answers = AnswerStore::new();
        let statuses = CategoryStatusMap::new();

        let agg = ProgressAggregator::new(&catalog, &questions, &answers, &statuses);
        assert_eq!(agg.overall().percent(), 0.0);
        assert!(!agg.has_any_progress());
    }
}
