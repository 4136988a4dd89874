use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use assessment_core::model::{
    AnswerKey, AnswerStore, AnswerValue, Category, CategoryCatalog, CategoryKey,
    CategoryStatusMap, Question, QuestionBank,
};
use assessment_core::{CategoryProgress, OverallProgress, ProgressAggregator, ResumeResolver};
use storage::repository::{
    CategorySubmission, SessionGateway, SubmissionRepository, SubmittedAnswer,
};

use super::autosave::{AutosaveScheduler, SaveRequest};
use crate::error::SessionError;

//
// ─── CURSOR ────────────────────────────────────────────────────────────────────
//

/// Where the user currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCursor {
    CategorySelection,
    Answering { category: usize, question: usize },
    Closed,
}

/// Outcome of moving forward from the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The current question has no answer yet; nothing moved.
    Unanswered,
    NextQuestion(usize),
    /// The category was submitted and the cursor is back on selection.
    Submitted { category: usize },
    /// End of an already submitted category; nothing was resubmitted.
    ReviewFinished { category: usize },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's pass through the questionnaire.
///
/// Holds every answer in memory, debounces saves of the active category and
/// submits a category once its last question is passed.
pub struct AssessmentSession {
    catalog: Arc<CategoryCatalog>,
    questions: QuestionBank,
    answers: AnswerStore,
    statuses: CategoryStatusMap,
    cursor: SessionCursor,
    autosave: AutosaveScheduler,
    submissions: Arc<dyn SubmissionRepository>,
    gateway: Arc<dyn SessionGateway>,
}

impl AssessmentSession {
    pub(crate) fn new(
        catalog: Arc<CategoryCatalog>,
        questions: QuestionBank,
        answers: AnswerStore,
        statuses: CategoryStatusMap,
        autosave: AutosaveScheduler,
        submissions: Arc<dyn SubmissionRepository>,
        gateway: Arc<dyn SessionGateway>,
    ) -> Self {
        Self {
            catalog,
            questions,
            answers,
            statuses,
            cursor: SessionCursor::CategorySelection,
            autosave,
            submissions,
            gateway,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> SessionCursor {
        self.cursor
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cursor == SessionCursor::Closed
    }

    #[must_use]
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn statuses(&self) -> &CategoryStatusMap {
        &self.statuses
    }

    /// True while a save holds the in-flight slot.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.autosave.is_saving()
    }

    #[must_use]
    pub fn current_category(&self) -> Option<&Category> {
        match self.cursor {
            SessionCursor::Answering { category, .. } => self.catalog.get(category),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.cursor {
            SessionCursor::Answering { category, question } => {
                self.questions.get(AnswerKey::new(category, question))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&AnswerValue> {
        match self.cursor {
            SessionCursor::Answering { category, question } => {
                self.answers.get(AnswerKey::new(category, question))
            }
            _ => None,
        }
    }

    fn aggregator(&self) -> ProgressAggregator<'_> {
        ProgressAggregator::new(&self.catalog, &self.questions, &self.answers, &self.statuses)
    }

    fn resolver(&self) -> ResumeResolver<'_> {
        ResumeResolver::new(&self.catalog, &self.questions, &self.answers, &self.statuses)
    }

    #[must_use]
    pub fn category_progress(&self, index: usize) -> Option<CategoryProgress> {
        self.aggregator().category(index)
    }

    #[must_use]
    pub fn categories_progress(&self) -> Vec<CategoryProgress> {
        self.aggregator().categories()
    }

    #[must_use]
    pub fn overall_progress(&self) -> OverallProgress {
        self.aggregator().overall()
    }

    #[must_use]
    pub fn all_submitted(&self) -> bool {
        self.aggregator().all_submitted()
    }

    #[must_use]
    pub fn has_any_progress(&self) -> bool {
        self.aggregator().has_any_progress()
    }

    /// Index of the first category still needing answers, 0 if none.
    #[must_use]
    pub fn next_incomplete_category(&self) -> usize {
        self.resolver().next_incomplete_category()
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Open the category at `index`, landing on its first unanswered question.
    ///
    /// The previously active category is flushed first.
    ///
    /// # Errors
    ///
    /// `Closed`, `UnknownCategory` for an index outside the catalog, or
    /// `EmptyCategory` when the category has no loaded questions.
    pub async fn select_category(&mut self, index: usize) -> Result<usize, SessionError> {
        self.ensure_open()?;
        let key = self.key_of(index)?;
        if self.questions.total(index) == 0 {
            return Err(SessionError::EmptyCategory(key));
        }

        self.flush_active().await;

        let start = self.resolver().resolve_start(index);
        self.cursor = SessionCursor::Answering {
            category: index,
            question: start,
        };
        info!(category = %key, question = start, "category opened");
        Ok(start)
    }

    /// Open the first incomplete category.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select_category`].
    pub async fn start_next_category(&mut self) -> Result<usize, SessionError> {
        self.ensure_open()?;
        let next = self.next_incomplete_category();
        self.select_category(next).await?;
        Ok(next)
    }

    /// Record `value` for the current question and re-arm the autosave timer.
    ///
    /// # Errors
    ///
    /// `Closed`, `NotAnswering` outside a category, or `CategorySubmitted`
    /// when the open category is only being reviewed.
    pub fn answer(&mut self, value: AnswerValue) -> Result<(), SessionError> {
        let (category, question) = self.answering()?;
        let key = self.key_of(category)?;
        if self.statuses.is_submitted(&key) {
            return Err(SessionError::CategorySubmitted(key));
        }

        self.answers.set(AnswerKey::new(category, question), value);
        let request = SaveRequest::new(key, self.answers.category_responses(category));
        self.autosave.arm(request);
        Ok(())
    }

    /// Move forward if the current question is answered.
    ///
    /// # Errors
    ///
    /// `Closed`, `NotAnswering`, or any error from finalizing the category.
    pub async fn submit_answer(&mut self) -> Result<Advance, SessionError> {
        let (category, question) = self.answering()?;
        if !self.answers.contains(AnswerKey::new(category, question)) {
            return Ok(Advance::Unanswered);
        }
        self.advance().await
    }

    /// Move forward without requiring an answer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit_answer`].
    pub async fn skip(&mut self) -> Result<Advance, SessionError> {
        self.answering()?;
        self.advance().await
    }

    /// Step back one question, or back to selection from the first one.
    ///
    /// # Errors
    ///
    /// `Closed` or `NotAnswering`.
    pub async fn previous(&mut self) -> Result<SessionCursor, SessionError> {
        let (category, question) = self.answering()?;
        if question > 0 {
            self.cursor = SessionCursor::Answering {
                category,
                question: question - 1,
            };
        } else {
            self.flush_active().await;
            self.cursor = SessionCursor::CategorySelection;
        }
        Ok(self.cursor)
    }

    /// Leave the current category, saving its answers first.
    ///
    /// # Errors
    ///
    /// `Closed`.
    pub async fn back_to_category_selection(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;
        if matches!(self.cursor, SessionCursor::Answering { .. }) {
            self.flush_active().await;
        }
        self.cursor = SessionCursor::CategorySelection;
        Ok(())
    }

    /// Save what is pending, end the remote session and close.
    ///
    /// Always ends `Closed`; save and logout failures are only logged.
    pub async fn logout(&mut self) {
        if self.is_closed() {
            return;
        }

        self.flush_active().await;

        if let Err(err) = self.gateway.logout().await {
            warn!(error = %err, "logout failed, closing session locally");
        }

        self.cursor = SessionCursor::Closed;
        info!("session closed");
    }

    async fn advance(&mut self) -> Result<Advance, SessionError> {
        let (category, question) = self.answering()?;
        let next = question + 1;
        if next < self.questions.total(category) {
            self.cursor = SessionCursor::Answering {
                category,
                question: next,
            };
            return Ok(Advance::NextQuestion(next));
        }
        self.finalize_category().await
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    async fn finalize_category(&mut self) -> Result<Advance, SessionError> {
        let (category, _) = self.answering()?;
        let key = self.key_of(category)?;

        if self.statuses.is_submitted(&key) {
            self.autosave.cancel();
            self.cursor = SessionCursor::CategorySelection;
            debug!(category = %key, "finished reviewing submitted category");
            return Ok(Advance::ReviewFinished { category });
        }

        let submission = self.build_submission(category)?;
        if let Err(source) = self.submissions.submit_category(&key, &submission).await {
            error!(category = %key, error = %source, "failed to submit category");
            return Err(SessionError::Submission {
                category: key,
                source,
            });
        }

        // Persist the final draft too, so a reload shows the submitted answers.
        // Storage keeps the submitted status when this save lands.
        let request = SaveRequest::new(key.clone(), self.answers.category_responses(category));
        self.autosave.flush(request).await;

        let answered = u32::try_from(submission.len()).unwrap_or(u32::MAX);
        self.statuses.mark_submitted(&key, answered, Utc::now());
        self.cursor = SessionCursor::CategorySelection;
        info!(category = %key, answered, "category submitted");
        Ok(Advance::Submitted { category })
    }

    /// Answers of `category` keyed by question id, with numeric scores.
    fn build_submission(&self, category: usize) -> Result<CategorySubmission, SessionError> {
        let meta = self
            .catalog
            .get(category)
            .ok_or(SessionError::UnknownCategory(category))?;

        let mut submission = CategorySubmission::new();
        for (question, value) in self.answers.category_entries(category) {
            let Some(loaded) = self.questions.get(AnswerKey::new(category, question)) else {
                warn!(category = %meta.key(), question, "answer has no loaded question, leaving it out");
                continue;
            };

            let score = value
                .score()
                .filter(|_| meta.allows(value))
                .ok_or_else(|| SessionError::InvalidAnswer {
                    category: meta.key().clone(),
                    question,
                    value: value.clone(),
                })?;

            submission.insert(
                loaded.id.clone(),
                SubmittedAnswer {
                    question: loaded.prompt.clone(),
                    score,
                },
            );
        }
        Ok(submission)
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────────
    //

    /// Save the active category now, unless it is submitted or has no answers.
    async fn flush_active(&mut self) {
        let SessionCursor::Answering { category, .. } = self.cursor else {
            return;
        };
        let Some(key) = self.catalog.get(category).map(|c| c.key().clone()) else {
            return;
        };

        if self.statuses.is_submitted(&key) || self.answers.count_in_category(category) == 0 {
            self.autosave.cancel();
            return;
        }

        let request = SaveRequest::new(key, self.answers.category_responses(category));
        self.autosave.flush(request).await;
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn answering(&self) -> Result<(usize, usize), SessionError> {
        match self.cursor {
            SessionCursor::Answering { category, question } => Ok((category, question)),
            SessionCursor::CategorySelection => Err(SessionError::NotAnswering),
            SessionCursor::Closed => Err(SessionError::Closed),
        }
    }

    fn key_of(&self, index: usize) -> Result<CategoryKey, SessionError> {
        self.catalog
            .get(index)
            .map(|category| category.key().clone())
            .ok_or(SessionError::UnknownCategory(index))
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("cursor", &self.cursor)
            .field("answers", &self.answers.len())
            .field("statuses", &self.statuses)
            .field("saving", &self.autosave.is_saving())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use assessment_core::model::{CategoryStatus, StatusRecord};
    use storage::repository::InMemoryRepository;
    use tokio::runtime::Handle;

    fn session_with(repo: &InMemoryRepository, sizes: [usize; 3]) -> AssessmentSession {
        let catalog = Arc::new(CategoryCatalog::standard());
        let bank = QuestionBank::new(
            sizes
                .iter()
                .map(|&n| {
                    (0..n)
                        .map(|i| Question::new(format!("q{}", i + 1), format!("Prompt {i}")))
                        .collect()
                })
                .collect(),
        );
        AssessmentSession::new(
            catalog,
            bank,
            AnswerStore::new(),
            CategoryStatusMap::new(),
            AutosaveScheduler::new(
                Arc::new(repo.clone()),
                Duration::from_millis(1000),
                Handle::current(),
            ),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn answer_outside_category_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, [2, 2, 2]);

        let err = session.answer(AnswerValue::from("1")).unwrap_err();
        assert!(matches!(err, SessionError::NotAnswering));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_unknown_or_empty_category_fails() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, [2, 0, 2]);

        assert!(matches!(
            session.select_category(7).await,
            Err(SessionError::UnknownCategory(7))
        ));
        assert!(matches!(
            session.select_category(1).await,
            Err(SessionError::EmptyCategory(_))
        ));
        assert_eq!(session.cursor(), SessionCursor::CategorySelection);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_question_does_not_advance_but_skip_does() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, [3, 1, 1]);
        session.select_category(0).await.unwrap();

        assert_eq!(session.submit_answer().await.unwrap(), Advance::Unanswered);
        assert_eq!(session.skip().await.unwrap(), Advance::NextQuestion(1));
        assert_eq!(
            session.cursor(),
            SessionCursor::Answering {
                category: 0,
                question: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn off_scale_answer_blocks_submission() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, [1, 1, 1]);
        session.select_category(0).await.unwrap();
        // HowGard is a four point scale.
        session.answer(AnswerValue::from("5")).unwrap();

        let err = session.submit_answer().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidAnswer { question: 0, .. }));
        assert!(repo.submission(&CategoryKey::new("HowGard")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_category_is_read_only() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, [2, 1, 1]);
        session.statuses.insert(
            CategoryKey::new("HowGard"),
            StatusRecord {
                status: CategoryStatus::Submitted,
                current_progress: 2,
                last_updated: None,
            },
        );

        session.select_category(0).await.unwrap();
        assert!(matches!(
            session.answer(AnswerValue::from("2")),
            Err(SessionError::CategorySubmitted(_))
        ));

        session.skip().await.unwrap();
        assert_eq!(
            session.skip().await.unwrap(),
            Advance::ReviewFinished { category: 0 }
        );
        assert_eq!(session.cursor(), SessionCursor::CategorySelection);
        assert!(repo.submission(&CategoryKey::new("HowGard")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_rejects_everything() {
        let repo = InMemoryRepository::new();
        let mut session = session_with(&repo, [1, 1, 1]);
        session.logout().await;

        assert!(session.is_closed());
        assert!(matches!(
            session.select_category(0).await,
            Err(SessionError::Closed)
        ));
        assert!(matches!(
            session.answer(AnswerValue::from("1")),
            Err(SessionError::Closed)
        ));
        assert!(matches!(
            session.back_to_category_selection().await,
            Err(SessionError::Closed)
        ));

        // A second logout is a no-op.
        session.logout().await;
        assert_eq!(repo.logouts(), 1);
    }
}
