use async_trait::async_trait;
use assessment_core::model::{
    AnswerValue, CategoryKey, CategoryStatus, CategoryStatusMap, Question, QuestionId,
    StatusRecord,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// In-progress answers of one category, keyed by question index.
///
/// Serializes to a JSON object whose keys are the indices in string form.
pub type ProgressResponses = BTreeMap<usize, AnswerValue>;

/// One finalized answer as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question: String,
    pub score: u8,
}

/// Final answers of one category, keyed by question id.
pub type CategorySubmission = BTreeMap<QuestionId, SubmittedAnswer>;

/// Source of question sets.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Load the ordered questions of a category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the source cannot be reached or returns a
    /// malformed answer.
    async fn load_questions(&self, category: &CategoryKey) -> Result<Vec<Question>, StorageError>;
}

/// Draft progress: status per category plus in-progress responses.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Status of every category the backend knows about.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the status map cannot be loaded.
    async fn load_category_status(&self) -> Result<CategoryStatusMap, StorageError>;

    /// Previously saved responses, or `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures. Missing records are `Ok(None)`.
    async fn load_saved_responses(
        &self,
        category: &CategoryKey,
    ) -> Result<Option<ProgressResponses>, StorageError>;

    /// Persist the in-progress responses of a category.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn save_progress(
        &self,
        category: &CategoryKey,
        progress_count: u32,
        responses: &ProgressResponses,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store the final answers of a category and mark it submitted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the submission is not accepted.
    async fn submit_category(
        &self,
        category: &CategoryKey,
        submission: &CategorySubmission,
    ) -> Result<(), StorageError>;
}

/// The authenticated session owning the questionnaire.
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects or cannot process the logout.
    async fn logout(&self) -> Result<(), StorageError>;
}

/// A save recorded by [`InMemoryRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedProgress {
    pub category: CategoryKey,
    pub progress_count: u32,
    pub responses: ProgressResponses,
}

#[derive(Debug, Clone, Copy, Default)]
struct FailureSwitches {
    questions: bool,
    status: bool,
    saves: bool,
    submissions: bool,
    logout: bool,
}

#[derive(Default)]
struct MemoryState {
    questions: HashMap<CategoryKey, Vec<Question>>,
    statuses: CategoryStatusMap,
    drafts: HashMap<CategoryKey, ProgressResponses>,
    submissions: HashMap<CategoryKey, CategorySubmission>,
    save_log: Vec<SavedProgress>,
    logouts: usize,
    fail: FailureSwitches,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Failures can be switched on per operation to exercise best-effort paths.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Result<T, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(f(&mut guard))
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        match self.state.lock() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write(&self, f: impl FnOnce(&mut MemoryState)) {
        match self.state.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Seed the question set of a category.
    pub fn insert_questions(&self, category: CategoryKey, questions: Vec<Question>) {
        self.write(|state| {
            state.questions.insert(category, questions);
        });
    }

    pub fn insert_status(&self, category: CategoryKey, record: StatusRecord) {
        self.write(|state| {
            state.statuses.insert(category, record);
        });
    }

    pub fn insert_draft(&self, category: CategoryKey, responses: ProgressResponses) {
        self.write(|state| {
            state.drafts.insert(category, responses);
        });
    }

    pub fn fail_question_loads(&self, fail: bool) {
        self.write(|state| state.fail.questions = fail);
    }

    pub fn fail_status_loads(&self, fail: bool) {
        self.write(|state| state.fail.status = fail);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.write(|state| state.fail.saves = fail);
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.write(|state| state.fail.submissions = fail);
    }

    pub fn fail_logout(&self, fail: bool) {
        self.write(|state| state.fail.logout = fail);
    }

    /// Every successful save, oldest first.
    #[must_use]
    pub fn save_log(&self) -> Vec<SavedProgress> {
        self.read(|state| state.save_log.clone())
    }

    #[must_use]
    pub fn draft(&self, category: &CategoryKey) -> Option<ProgressResponses> {
        self.read(|state| state.drafts.get(category).cloned())
    }

    #[must_use]
    pub fn submission(&self, category: &CategoryKey) -> Option<CategorySubmission> {
        self.read(|state| state.submissions.get(category).cloned())
    }

    #[must_use]
    pub fn status(&self, category: &CategoryKey) -> CategoryStatus {
        self.read(|state| state.statuses.status_of(category))
    }

    #[must_use]
    pub fn logouts(&self) -> usize {
        self.read(|state| state.logouts)
    }
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn load_questions(&self, category: &CategoryKey) -> Result<Vec<Question>, StorageError> {
        self.with_state(|state| {
            if state.fail.questions {
                return Err(StorageError::Unavailable("question source offline".into()));
            }
            Ok(state.questions.get(category).cloned().unwrap_or_default())
        })?
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_category_status(&self) -> Result<CategoryStatusMap, StorageError> {
        self.with_state(|state| {
            if state.fail.status {
                return Err(StorageError::Unavailable("progress offline".into()));
            }
            Ok(state.statuses.clone())
        })?
    }

    async fn load_saved_responses(
        &self,
        category: &CategoryKey,
    ) -> Result<Option<ProgressResponses>, StorageError> {
        self.with_state(|state| state.drafts.get(category).cloned())
    }

    async fn save_progress(
        &self,
        category: &CategoryKey,
        progress_count: u32,
        responses: &ProgressResponses,
    ) -> Result<(), StorageError> {
        self.with_state(|state| {
            if state.fail.saves {
                return Err(StorageError::Unavailable("save rejected".into()));
            }
            state.drafts.insert(category.clone(), responses.clone());
            if !state.statuses.is_submitted(category) {
                state.statuses.insert(
                    category.clone(),
                    StatusRecord {
                        status: CategoryStatus::InProgress,
                        current_progress: progress_count,
                        last_updated: Some(Utc::now()),
                    },
                );
            }
            state.save_log.push(SavedProgress {
                category: category.clone(),
                progress_count,
                responses: responses.clone(),
            });
            Ok(())
        })?
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn submit_category(
        &self,
        category: &CategoryKey,
        submission: &CategorySubmission,
    ) -> Result<(), StorageError> {
        self.with_state(|state| {
            if state.fail.submissions {
                return Err(StorageError::Unavailable("submission rejected".into()));
            }
            state
                .statuses
                .mark_submitted(category, count_u32(submission.len()), Utc::now());
            state
                .submissions
                .insert(category.clone(), submission.clone());
            Ok(())
        })?
    }
}

#[async_trait]
impl SessionGateway for InMemoryRepository {
    async fn logout(&self) -> Result<(), StorageError> {
        self.with_state(|state| {
            state.logouts += 1;
            if state.fail.logout {
                return Err(StorageError::Unavailable("logout rejected".into()));
            }
            Ok(())
        })?
    }
}

/// Aggregates the collaborator traits behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub session: Arc<dyn SessionGateway>,
}

impl Storage {
    /// Wrap an existing in-memory repository so callers can keep inspecting it.
    #[must_use]
    pub fn from_in_memory(repo: &InMemoryRepository) -> Self {
        Self {
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            session: Arc::new(repo.clone()),
        }
    }
}
