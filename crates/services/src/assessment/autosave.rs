use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use assessment_core::model::CategoryKey;
use storage::repository::{ProgressRepository, ProgressResponses};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Snapshot of one category's in-progress answers, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub category: CategoryKey,
    pub responses: ProgressResponses,
}

impl SaveRequest {
    #[must_use]
    pub fn new(category: CategoryKey, responses: ProgressResponses) -> Self {
        Self {
            category,
            responses,
        }
    }

    /// Number of answered questions carried by this request.
    #[must_use]
    pub fn progress_count(&self) -> u32 {
        u32::try_from(self.responses.len()).unwrap_or(u32::MAX)
    }
}

/// Single-slot in-flight marker: at most one guard exists at a time.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlightToken {
    held: Arc<AtomicBool>,
}

impl InFlightToken {
    pub(crate) fn try_acquire(&self) -> Option<InFlightGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(InFlightGuard {
            held: Arc::clone(&self.held),
        })
    }

    pub(crate) fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Releases the token when the save it guards finishes or is dropped.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    held: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Trailing-debounce saver for in-progress answers.
///
/// `arm` replaces the pending scheduled task. The task only owns the delay:
/// once it fires and takes the in-flight token, the save runs as its own
/// detached task, so a later `arm`/`cancel` never interrupts a started save.
pub(crate) struct AutosaveScheduler {
    progress: Arc<dyn ProgressRepository>,
    delay: Duration,
    runtime: Handle,
    pending: Option<JoinHandle<()>>,
    in_flight: InFlightToken,
}

impl AutosaveScheduler {
    pub(crate) fn new(progress: Arc<dyn ProgressRepository>, delay: Duration, runtime: Handle) -> Self {
        Self {
            progress,
            delay,
            runtime,
            pending: None,
            in_flight: InFlightToken::default(),
        }
    }

    /// (Re)start the debounce timer for `request`.
    pub(crate) fn arm(&mut self, request: SaveRequest) {
        self.cancel();

        let progress = Arc::clone(&self.progress);
        let token = self.in_flight.clone();
        let runtime = self.runtime.clone();
        let delay = self.delay;

        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(guard) = token.try_acquire() else {
                debug!(category = %request.category, "autosave skipped, a save is already in flight");
                return;
            };
            runtime.spawn(async move {
                let _guard = guard;
                persist(progress.as_ref(), &request).await;
            });
        }));
    }

    /// Drop the pending timer, if any. In-flight saves are unaffected.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Cancel the pending timer and save `request` now.
    ///
    /// Returns `false` when the save failed or was skipped because another
    /// save still holds the in-flight token.
    pub(crate) async fn flush(&mut self, request: SaveRequest) -> bool {
        self.cancel();
        let Some(_guard) = self.in_flight.try_acquire() else {
            debug!(category = %request.category, "flush skipped, a save is already in flight");
            return false;
        };
        persist(self.progress.as_ref(), &request).await
    }

    pub(crate) fn is_saving(&self) -> bool {
        self.in_flight.is_held()
    }

    #[cfg(test)]
    pub(crate) fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

/// Best effort: failures are logged, never returned.
async fn persist(progress: &dyn ProgressRepository, request: &SaveRequest) -> bool {
    let count = request.progress_count();
    match progress
        .save_progress(&request.category, count, &request.responses)
        .await
    {
        Ok(()) => {
            debug!(category = %request.category, answered = count, "progress saved");
            true
        }
        Err(err) => {
            warn!(category = %request.category, error = %err, "failed to save progress");
            false
        }
    }
}
