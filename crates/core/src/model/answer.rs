use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Position of an answer: category index in the catalog, question index within
/// that category's loaded question sequence.
///
/// Ordering is category first, so every category occupies one contiguous range
/// of the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnswerKey {
    pub category: usize,
    pub question: usize,
}

impl AnswerKey {
    #[must_use]
    pub fn new(category: usize, question: usize) -> Self {
        Self { category, question }
    }

    fn category_start(category: usize) -> Self {
        Self::new(category, 0)
    }

    fn category_end(category: usize) -> Self {
        Self::new(category, usize::MAX)
    }
}

/// One answer token (e.g. `"3"`). Membership in the category's scale is only
/// checked at submission.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerValue(String);

impl AnswerValue {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric score carried by the token, if it is a non-negative integer.
    #[must_use]
    pub fn score(&self) -> Option<u8> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Debug for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnswerValue({})", self.0)
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// In-memory answers of the active session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    entries: BTreeMap<AnswerKey, AnswerValue>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the answer at `key`, returning the previous value.
    pub fn set(&mut self, key: AnswerKey, value: AnswerValue) -> Option<AnswerValue> {
        self.entries.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: AnswerKey) -> Option<&AnswerValue> {
        self.entries.get(&key)
    }

    #[must_use]
    pub fn contains(&self, key: AnswerKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Total number of recorded answers across all categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of answers recorded for `category`.
    #[must_use]
    pub fn count_in_category(&self, category: usize) -> usize {
        self.category_entries(category).count()
    }

    /// Answers of `category` as `(question index, value)` pairs in question order.
    pub fn category_entries(
        &self,
        category: usize,
    ) -> impl Iterator<Item = (usize, &AnswerValue)> + '_ {
        self.entries
            .range(AnswerKey::category_start(category)..=AnswerKey::category_end(category))
            .map(|(key, value)| (key.question, value))
    }

    /// Snapshot of `category` keyed by question index, the shape persisted as
    /// in-progress responses.
    #[must_use]
    pub fn category_responses(&self, category: usize) -> BTreeMap<usize, AnswerValue> {
        self.category_entries(category)
            .map(|(question, value)| (question, value.clone()))
            .collect()
    }

    /// Replace every answer of `category` with `responses`.
    pub fn hydrate_category(
        &mut self,
        category: usize,
        responses: impl IntoIterator<Item = (usize, AnswerValue)>,
    ) {
        self.entries.retain(|key, _| key.category != category);
        for (question, value) in responses {
            self.entries.insert(AnswerKey::new(category, question), value);
        }
    }
}
