use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::info;

use assessment_core::model::CategoryCatalog;
use storage::repository::{
    ProgressRepository, QuestionRepository, SessionGateway, Storage, SubmissionRepository,
};

use super::autosave::AutosaveScheduler;
use super::bootstrap::{load_answers, load_question_bank, load_statuses};
use super::config::SessionConfig;
use super::session::AssessmentSession;
use crate::error::BootstrapError;

/// Entry point: wires repositories to a catalog and starts sessions.
#[derive(Clone)]
pub struct AssessmentService {
    catalog: Arc<CategoryCatalog>,
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    session: Arc<dyn SessionGateway>,
    config: SessionConfig,
}

impl AssessmentService {
    #[must_use]
    pub fn new(
        catalog: CategoryCatalog,
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        session: Arc<dyn SessionGateway>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            questions,
            progress,
            submissions,
            session,
            config: SessionConfig::default(),
        }
    }

    #[must_use]
    pub fn from_storage(catalog: CategoryCatalog, storage: &Storage) -> Self {
        Self::new(
            catalog,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.submissions),
            Arc::clone(&storage.session),
        )
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load questions, statuses and saved drafts, then open a session on the
    /// category selection screen.
    ///
    /// Must be called from within a Tokio runtime; autosave timers run on it.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Questions` if any category's questions fail
    /// to load. Status and draft failures are logged and tolerated.
    pub async fn start_session(&self) -> Result<AssessmentSession, BootstrapError> {
        let questions = load_question_bank(&self.catalog, self.questions.as_ref()).await?;
        let statuses = load_statuses(self.progress.as_ref()).await;
        let answers = load_answers(&self.catalog, &questions, self.progress.as_ref()).await;

        info!(
            categories = self.catalog.len(),
            questions = questions.total_all(),
            answered = answers.len(),
            "assessment session started"
        );

        let autosave = AutosaveScheduler::new(
            Arc::clone(&self.progress),
            self.config.autosave_delay,
            Handle::current(),
        );

        Ok(AssessmentSession::new(
            Arc::clone(&self.catalog),
            questions,
            answers,
            statuses,
            autosave,
            Arc::clone(&self.submissions),
            Arc::clone(&self.session),
        ))
    }
}
