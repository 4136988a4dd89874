use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::CategoryKey;

/// Completion state of a category as recorded by persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    #[default]
    NotStarted,
    InProgress,
    Submitted,
}

impl CategoryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
        }
    }

    #[must_use]
    pub fn is_submitted(self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown category status: {0}")]
pub struct StatusParseError(pub String);

impl FromStr for CategoryStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Server-side progress entry for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: CategoryStatus,
    pub current_progress: u32,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Server-reported status per category. Missing entries read as `not_started`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryStatusMap {
    entries: HashMap<CategoryKey, StatusRecord>,
}

impl CategoryStatusMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: CategoryKey, record: StatusRecord) -> Option<StatusRecord> {
        self.entries.insert(key, record)
    }

    #[must_use]
    pub fn get(&self, key: &CategoryKey) -> Option<&StatusRecord> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn status_of(&self, key: &CategoryKey) -> CategoryStatus {
        self.entries
            .get(key)
            .map(|record| record.status)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_submitted(&self, key: &CategoryKey) -> bool {
        self.status_of(key).is_submitted()
    }

    /// Record a successful submission locally.
    pub fn mark_submitted(&mut self, key: &CategoryKey, answered: u32, at: DateTime<Utc>) {
        let record = self.entries.entry(key.clone()).or_default();
        record.status = CategoryStatus::Submitted;
        record.current_progress = answered;
        record.last_updated = Some(at);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(CategoryKey, StatusRecord)> for CategoryStatusMap {
    fn from_iter<T: IntoIterator<Item = (CategoryKey, StatusRecord)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
