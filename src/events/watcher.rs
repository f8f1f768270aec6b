//! Poll-based watcher for the externally managed media directory.
//!
//! The watcher owns its own [`ChangeBus`]: video files appear and disappear
//! outside any store mutation, so their changes cannot ride the store's
//! publishes. Consumers subscribe with the same handler shape as on the
//! store bus.

use super::bus::{ChangeBus, SubscriberId};
use crate::Result;
use crate::media::MediaLibrary;
use crate::models::{ChangeSet, ResourceCategory};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Watches the media directory and publishes listing diffs.
///
/// External additions and removals are observed within one poll interval.
pub struct MediaWatcher {
    library: MediaLibrary,
    bus: Arc<ChangeBus>,
    known: Mutex<BTreeSet<String>>,
    poll_interval: Duration,
}

impl MediaWatcher {
    /// Creates a watcher over the given library.
    ///
    /// The current directory listing becomes the baseline; only later
    /// diffs publish changes.
    #[must_use]
    pub fn new(library: MediaLibrary, poll_interval: Duration) -> Self {
        let known = library.file_names().into_iter().collect();
        Self {
            library,
            bus: Arc::new(ChangeBus::new()),
            known: Mutex::new(known),
            poll_interval,
        }
    }

    /// Returns the library this watcher observes.
    #[must_use]
    pub const fn library(&self) -> &MediaLibrary {
        &self.library
    }

    /// Registers a handler on the watcher's bus.
    pub fn subscribe<H, F>(&self, handler: H) -> SubscriberId
    where
        H: Fn(ChangeSet) -> F + Send + Sync + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Removes a handler from the watcher's bus.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Polls the directory once and publishes a diff if anything changed.
    ///
    /// The render pipeline calls this directly after writing an artifact so
    /// a successful render is observed without waiting out the poll
    /// interval. Returns `true` when a change was published.
    pub async fn refresh_now(&self) -> bool {
        let current: BTreeSet<String> = self.library.file_names().into_iter().collect();

        let change = {
            let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
            if *known == current {
                return false;
            }

            let mut change = ChangeSet::new().with_category(ResourceCategory::Videos);
            for added in current.difference(&known) {
                change = change.with_video(added.clone());
            }
            for removed in known.difference(&current) {
                change = change.with_video(removed.clone());
            }
            *known = current;
            change
        };

        tracing::debug!(videos = change.videos.len(), "media listing changed");
        metrics::counter!("media_watcher_diffs_total").increment(1);
        self.bus.publish(&change).await;
        true
    }

    /// Runs the poll loop until cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.refresh_now().await;
                },
            }
        }

        tracing::debug!("media watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn watcher_for(dir: &std::path::Path) -> MediaWatcher {
        MediaWatcher::new(MediaLibrary::new(dir), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_missing_directory_publishes_nothing() {
        let watcher = watcher_for(std::path::Path::new("/nonexistent/daybook-media"));
        assert!(!watcher.refresh_now().await);
    }

    #[tokio::test]
    async fn test_addition_is_published_once() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = watcher_for(dir.path());

        let changes = Arc::new(Mutex::new(Vec::new()));
        let changes_clone = changes.clone();
        watcher.subscribe(move |change| {
            let changes = changes_clone.clone();
            async move {
                changes.lock().unwrap().push(change);
                Ok(())
            }
        });

        std::fs::write(dir.path().join("new.mp4"), b"x").unwrap();
        assert!(watcher.refresh_now().await);
        // Unchanged listing publishes nothing.
        assert!(!watcher.refresh_now().await);

        let seen = changes.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].videos, vec!["new.mp4".to_string()]);
        assert_eq!(seen[0].categories, vec![ResourceCategory::Videos]);
    }

    #[tokio::test]
    async fn test_removal_is_published() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.mp4"), b"x").unwrap();

        let watcher = watcher_for(dir.path());
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        watcher.subscribe(move |change| {
            let count = count_clone.clone();
            async move {
                assert_eq!(change.videos, vec!["old.mp4".to_string()]);
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        std::fs::remove_file(dir.path().join("old.mp4")).unwrap();
        assert!(watcher.refresh_now().await);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_baseline_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("existing.mp4"), b"x").unwrap();

        // Files present at construction are the baseline.
        let watcher = watcher_for(dir.path());
        assert!(!watcher.refresh_now().await);
    }
}
