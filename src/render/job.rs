//! Cancellation bookkeeping for in-flight renders.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Maps request ids to the cancellation token of their running render.
///
/// The token is registered before the render task spawns, so a
/// `notifications/cancelled` that races the spawn still lands. Ids for
/// finished or unknown jobs cancel nothing.
#[derive(Debug, Default)]
pub struct JobTracker {
    jobs: Mutex<HashMap<String, CancellationToken>>,
}

impl JobTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job and returns its cancellation token.
    ///
    /// Re-registering an id replaces the previous token.
    #[must_use]
    pub fn begin(&self, request_id: impl Into<String>) -> CancellationToken {
        let token = CancellationToken::new();
        self.lock_jobs().insert(request_id.into(), token.clone());
        metrics::gauge!("render_jobs_active").increment(1.0);
        token
    }

    /// Cancels the job for a request id. Returns false when no job is
    /// tracked under it.
    pub fn cancel(&self, request_id: &str) -> bool {
        let token = self.lock_jobs().get(request_id).cloned();
        match token {
            Some(token) => {
                token.cancel();
                tracing::debug!(request_id, "render cancellation requested");
                true
            }
            None => {
                tracing::debug!(request_id, "cancellation for unknown request ignored");
                false
            }
        }
    }

    /// Drops the tracking entry once a job settles.
    pub fn finish(&self, request_id: &str) {
        if self.lock_jobs().remove(request_id).is_some() {
            metrics::gauge!("render_jobs_active").decrement(1.0);
        }
    }

    /// Number of jobs still tracked.
    #[must_use]
    pub fn active(&self) -> usize {
        self.lock_jobs().len()
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
