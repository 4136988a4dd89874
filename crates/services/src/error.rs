//! Shared error types for the services crate.

use thiserror::Error;

use assessment_core::model::{AnswerValue, CategoryKey};
use storage::repository::StorageError;

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BootstrapError {
    #[error("failed to load questions for {category}")]
    Questions {
        category: CategoryKey,
        #[source]
        source: StorageError,
    },
}

/// Errors emitted by session operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has been closed")]
    Closed,
    #[error("no category at index {0}")]
    UnknownCategory(usize),
    #[error("category {0} has no questions")]
    EmptyCategory(CategoryKey),
    #[error("no category is being answered")]
    NotAnswering,
    #[error("category {0} is already submitted")]
    CategorySubmitted(CategoryKey),
    #[error("answer {value} to question {question} is not on the {category} scale")]
    InvalidAnswer {
        category: CategoryKey,
        question: usize,
        value: AnswerValue,
    },
    #[error("failed to submit {category}")]
    Submission {
        category: CategoryKey,
        #[source]
        source: StorageError,
    },
}
