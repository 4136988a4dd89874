//! Where a returning user lands: which category, and which question in it.

use crate::model::{AnswerKey, AnswerStore, CategoryCatalog, CategoryStatusMap, QuestionBank};

#[derive(Debug, Clone, Copy)]
pub struct ResumeResolver<'a> {
    catalog: &'a CategoryCatalog,
    questions: &'a QuestionBank,
    answers: &'a AnswerStore,
    statuses: &'a CategoryStatusMap,
}

impl<'a> ResumeResolver<'a> {
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

    /// First unanswered question of `category`; 0 when every question has an
    /// answer so the user re-reviews from the start.
    #[must_use]
    pub fn resolve_start(&self, category: usize) -> usize {
        (0..self.questions.total(category))
            .find(|&question| !self.answers.contains(AnswerKey::new(category, question)))
            .unwrap_or(0)
    }

    /// First category, in display order, that is neither submitted nor fully
    /// answered. Falls back to 0.
    #[must_use]
    pub fn next_incomplete_category(&self) -> usize {
        self.catalog
            .iter()
            .enumerate()
            .find(|(index, category)| {
                !self.statuses.is_submitted(category.key())
                    && self.answers.count_in_category(*index) < self.questions.total(*index)
            })
            .map_or(0, |(index, _)| index)
    }
}
