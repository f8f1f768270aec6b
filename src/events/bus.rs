//! Change bus for cross-component notifications.
//!
//! Every committed mutation publishes one [`ChangeSet`] here. Handlers run
//! sequentially in registration order and are awaited one at a time, so a
//! consumer can rely on everything registered before it having already seen
//! the change. A failing handler is logged and skipped; it never aborts the
//! rest of the dispatch and never surfaces to the publisher.
//!
//! `publish` snapshots the handler list before awaiting anything, so handlers
//! may subscribe or unsubscribe mid-dispatch without deadlocking. Such changes
//! take effect from the next publish.

use crate::Result;
use crate::models::ChangeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type ChangeFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type BoxedHandler = Arc<dyn Fn(ChangeSet) -> ChangeFuture + Send + Sync>;

/// Handle returned by [`ChangeBus::subscribe`].
///
/// The bus owns the handler; the caller owns only this token. Dropping the
/// token does not unregister the handler, only an explicit
/// [`ChangeBus::unsubscribe`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Returns the raw id value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Ordered fan-out of change sets to async handlers.
pub struct ChangeBus {
    inner: Mutex<BusInner>,
}

struct BusInner {
    handlers: Vec<(SubscriberId, BoxedHandler)>,
    next_id: u64,
}

impl ChangeBus {
    /// Creates a new bus with no subscribers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                handlers: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Registers a handler and returns its subscription token.
    ///
    /// Handlers are invoked in registration order on every publish until
    /// explicitly unsubscribed.
    pub fn subscribe<H, F>(&self, handler: H) -> SubscriberId
    where
        H: Fn(ChangeSet) -> F + Send + Sync + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: BoxedHandler = Arc::new(move |change| {
            let fut: ChangeFuture = Box::pin(handler(change));
            fut
        });

        let mut inner = self.lock_inner();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        inner.handlers.push((id, handler));
        metrics::counter!("change_bus_subscriptions_total").increment(1);
        id
    }

    /// Removes a handler.
    ///
    /// Returns `false` when the token was already unsubscribed; removal of
    /// an absent subscriber is a silent no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock_inner();
        let before = inner.handlers.len();
        inner.handlers.retain(|(sid, _)| *sid != id);
        before != inner.handlers.len()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.lock_inner().handlers.len()
    }

    /// Publishes a change to every handler registered at call time.
    ///
    /// Handlers are awaited sequentially in registration order. A handler
    /// error is logged and dispatch continues with the next handler.
    pub async fn publish(&self, change: &ChangeSet) {
        let snapshot: Vec<(SubscriberId, BoxedHandler)> = self.lock_inner().handlers.clone();
        metrics::counter!("change_bus_publish_total").increment(1);

        for (id, handler) in snapshot {
            if let Err(e) = handler(change.clone()).await {
                tracing::warn!(
                    subscriber = id.value(),
                    error = %e,
                    "change handler failed"
                );
                metrics::counter!("change_bus_handler_errors_total").increment(1);
            }
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
