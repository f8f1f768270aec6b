//! Per-resource update subscriptions.
//!
//! Clients opt in to `resources/updated` notifications one URI at a time.
//! The registry is a plain set of opaque URIs; matching happens against the
//! identity URIs a [`ChangeSet`] expands to, so a subscription to a resource
//! that does not exist yet is valid and starts firing once the resource does.

use crate::models::ChangeSet;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Registry of URIs a client asked to watch.
///
/// Nothing here is durable; a restart drops all subscriptions and clients
/// re-subscribe after the next initialize.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    uris: Mutex<HashSet<String>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription. Returns false when it already existed.
    pub fn subscribe(&self, uri: impl Into<String>) -> bool {
        let added = self.lock_uris().insert(uri.into());
        if added {
            metrics::counter!("resource_subscriptions_total").increment(1);
        }
        added
    }

    /// Removes a subscription. Returns false when it was not present.
    pub fn unsubscribe(&self, uri: &str) -> bool {
        self.lock_uris().remove(uri)
    }

    /// Returns true when the URI is currently subscribed.
    #[must_use]
    pub fn is_subscribed(&self, uri: &str) -> bool {
        self.lock_uris().contains(uri)
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock_uris().len()
    }

    /// Returns the subscribed identities a change touched.
    ///
    /// Order follows the change set's identity expansion, so each affected
    /// identity comes back once even if the mutation named it repeatedly.
    #[must_use]
    pub fn affected(&self, change: &ChangeSet) -> Vec<String> {
        let uris = self.lock_uris();
        change
            .identities()
            .into_iter()
            .filter(|uri| uris.contains(uri))
            .collect()
    }

    fn lock_uris(&self) -> MutexGuard<'_, HashSet<String>> {
        self.uris.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
