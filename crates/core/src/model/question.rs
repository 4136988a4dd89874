use serde::{Deserialize, Serialize};

use crate::model::answer::AnswerKey;
use crate::model::ids::QuestionId;

/// A prompt as delivered by the question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub prompt: String,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<QuestionId>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
        }
    }
}

impl From<String> for QuestionId {
    fn from(value: String) -> Self {
        QuestionId::new(value)
    }
}

/// Questions loaded for one session, indexed by category display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    by_category: Vec<Vec<Question>>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(by_category: Vec<Vec<Question>>) -> Self {
        Self { by_category }
    }

    /// Number of loaded questions for `category` (0 for unknown indices).
    #[must_use]
    pub fn total(&self, category: usize) -> usize {
        self.by_category.get(category).map_or(0, Vec::len)
    }

    /// Sum of all loaded questions.
    #[must_use]
    pub fn total_all(&self) -> usize {
        self.by_category.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn get(&self, key: AnswerKey) -> Option<&Question> {
        self.by_category.get(key.category)?.get(key.question)
    }

    /// Whether `key` addresses a loaded question.
    #[must_use]
    pub fn contains(&self, key: AnswerKey) -> bool {
        self.get(key).is_some()
    }
}
