//! In-process journal store with JSON snapshot persistence.
//!
//! The store is intentionally plain: BTreeMaps behind a mutex, rewritten to
//! a snapshot file after each commit. Its one hard obligation is publishing
//! exactly one [`ChangeSet`] per successful mutation, with publishes totally
//! ordered across concurrent callers.

use crate::events::ChangeBus;
use crate::models::{ChangeSet, EntryId, JournalEntry, ResourceCategory, Tag, TagId};
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Journal entry and tag storage.
///
/// Reads take a short std mutex and may run from inside change handlers.
/// Mutations serialize through an async commit lock that covers the state
/// change, the snapshot write, and the bus publish, so every handler
/// observes publishes in commit order. Mutating the store from inside a
/// change handler is unsupported; it would re-enter the commit lock.
pub struct JournalStore {
    state: Mutex<StoreState>,
    commit: tokio::sync::Mutex<()>,
    bus: Arc<ChangeBus>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Default)]
struct StoreState {
    entries: BTreeMap<u64, JournalEntry>,
    tags: BTreeMap<u64, Tag>,
    next_entry_id: u64,
    next_tag_id: u64,
}

/// On-disk snapshot layout.
#[derive(Serialize, Deserialize, Default)]
struct SnapshotFile {
    #[serde(default)]
    entries: Vec<JournalEntry>,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl JournalStore {
    /// Creates a store, loading the snapshot file when one exists.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing snapshot cannot be read or parsed.
    pub fn new(bus: Arc<ChangeBus>, snapshot_path: Option<PathBuf>) -> Result<Self> {
        let mut state = StoreState {
            next_entry_id: 1,
            next_tag_id: 1,
            ..StoreState::default()
        };

        if let Some(path) = snapshot_path.as_deref() {
            if path.exists() {
                let snapshot = load_snapshot(path)?;
                for entry in snapshot.entries {
                    state.next_entry_id = state.next_entry_id.max(entry.id.value() + 1);
                    state.entries.insert(entry.id.value(), entry);
                }
                for tag in snapshot.tags {
                    state.next_tag_id = state.next_tag_id.max(tag.id.value() + 1);
                    state.tags.insert(tag.id.value(), tag);
                }
                tracing::info!(
                    entries = state.entries.len(),
                    tags = state.tags.len(),
                    "journal snapshot loaded"
                );
            }
        }

        Ok(Self {
            state: Mutex::new(state),
            commit: tokio::sync::Mutex::new(()),
            bus,
            snapshot_path,
        })
    }

    /// Returns the bus this store publishes on.
    #[must_use]
    pub const fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.lock_state().entries.len()
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.lock_state().tags.len()
    }

    /// Lists all entries in id order.
    #[must_use]
    pub fn list_entries(&self) -> Vec<JournalEntry> {
        self.lock_state().entries.values().cloned().collect()
    }

    /// Returns one entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id has no record.
    pub fn get_entry(&self, id: EntryId) -> Result<JournalEntry> {
        self.lock_state()
            .entries
            .get(&id.value())
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "entry".to_string(),
                id: id.to_string(),
            })
    }

    /// Lists all tags in id order.
    #[must_use]
    pub fn list_tags(&self) -> Vec<Tag> {
        self.lock_state().tags.values().cloned().collect()
    }

    /// Returns one tag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id has no record.
    pub fn get_tag(&self, id: TagId) -> Result<Tag> {
        self.lock_state()
            .tags
            .get(&id.value())
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "tag".to_string(),
                id: id.to_string(),
            })
    }

    /// Creates an entry and publishes the change.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the title is empty.
    pub async fn create_entry(
        &self,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<JournalEntry> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("entry title must not be empty".to_string()));
        }

        let _commit = self.commit.lock().await;
        let entry = {
            let mut state = self.lock_state();
            let id = state.next_entry_id;
            state.next_entry_id += 1;
            let now = Utc::now();
            let entry = JournalEntry {
                id: EntryId::new(id),
                title: title.to_string(),
                content: content.to_string(),
                tags: tags.to_vec(),
                created_at: now,
                updated_at: now,
            };
            state.entries.insert(id, entry.clone());
            entry
        };

        self.write_snapshot();
        let change = ChangeSet::new()
            .with_entry(entry.id)
            .with_category(ResourceCategory::Entries);
        self.bus.publish(&change).await;

        tracing::debug!(entry = %entry.id, "entry created");
        Ok(entry)
    }

    /// Updates an entry's fields and publishes the change.
    ///
    /// Only the provided fields change. The category marker is reserved for
    /// mutations that change listing membership, so an update names the
    /// entry identity alone.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id has no record.
    pub async fn update_entry(
        &self,
        id: EntryId,
        title: Option<String>,
        content: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<JournalEntry> {
        let _commit = self.commit.lock().await;
        let entry = {
            let mut state = self.lock_state();
            let entry = state
                .entries
                .get_mut(&id.value())
                .ok_or_else(|| Error::NotFound {
                    kind: "entry".to_string(),
                    id: id.to_string(),
                })?;
            if let Some(title) = title {
                entry.title = title;
            }
            if let Some(content) = content {
                entry.content = content;
            }
            if let Some(tags) = tags {
                entry.tags = tags;
            }
            entry.updated_at = Utc::now();
            entry.clone()
        };

        self.write_snapshot();
        let change = ChangeSet::new().with_entry(id);
        self.bus.publish(&change).await;

        tracing::debug!(entry = %id, "entry updated");
        Ok(entry)
    }

    /// Deletes an entry and publishes the change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id has no record.
    pub async fn delete_entry(&self, id: EntryId) -> Result<JournalEntry> {
        let _commit = self.commit.lock().await;
        let entry = {
            let mut state = self.lock_state();
            state
                .entries
                .remove(&id.value())
                .ok_or_else(|| Error::NotFound {
                    kind: "entry".to_string(),
                    id: id.to_string(),
                })?
        };

        self.write_snapshot();
        let change = ChangeSet::new()
            .with_entry(id)
            .with_category(ResourceCategory::Entries);
        self.bus.publish(&change).await;

        tracing::debug!(entry = %id, "entry deleted");
        Ok(entry)
    }

    /// Creates a tag and publishes the change.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the name is empty or already in use.
    pub async fn create_tag(&self, name: &str, description: Option<String>) -> Result<Tag> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("tag name must not be empty".to_string()));
        }

        let _commit = self.commit.lock().await;
        let tag = {
            let mut state = self.lock_state();
            if state.tags.values().any(|t| t.name == name) {
                return Err(Error::InvalidInput(format!("tag '{name}' already exists")));
            }
            let id = state.next_tag_id;
            state.next_tag_id += 1;
            let tag = Tag {
                id: TagId::new(id),
                name: name.to_string(),
                description,
                created_at: Utc::now(),
            };
            state.tags.insert(id, tag.clone());
            tag
        };

        self.write_snapshot();
        let change = ChangeSet::new()
            .with_tag(tag.id)
            .with_category(ResourceCategory::Tags);
        self.bus.publish(&change).await;

        tracing::debug!(tag = %tag.id, "tag created");
        Ok(tag)
    }

    /// Deletes a tag and publishes the change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the id has no record.
    pub async fn delete_tag(&self, id: TagId) -> Result<Tag> {
        let _commit = self.commit.lock().await;
        let tag = {
            let mut state = self.lock_state();
            state.tags.remove(&id.value()).ok_or_else(|| Error::NotFound {
                kind: "tag".to_string(),
                id: id.to_string(),
            })?
        };

        self.write_snapshot();
        let change = ChangeSet::new()
            .with_tag(id)
            .with_category(ResourceCategory::Tags);
        self.bus.publish(&change).await;

        tracing::debug!(tag = %id, "tag deleted");
        Ok(tag)
    }

    /// Rewrites the snapshot file.
    ///
    /// A failed write keeps the in-memory commit; durability is best effort
    /// and the failure is logged.
    fn write_snapshot(&self) {
        let Some(path) = self.snapshot_path.as_deref() else {
            return;
        };

        let snapshot = {
            let state = self.lock_state();
            SnapshotFile {
                entries: state.entries.values().cloned().collect(),
                tags: state.tags.values().cloned().collect(),
            }
        };

        if let Err(e) = persist_snapshot(path, &snapshot) {
            tracing::warn!(path = %path.display(), error = %e, "snapshot write failed");
            metrics::counter!("store_snapshot_failures_total").increment(1);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for JournalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalStore")
            .field("snapshot_path", &self.snapshot_path)
            .finish_non_exhaustive()
    }
}

fn load_snapshot(path: &Path) -> Result<SnapshotFile> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_snapshot".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "snapshot did not parse");
        Error::MalformedPayload {
            context: "snapshot".to_string(),
            payload: contents.chars().take(120).collect(),
        }
    })
}

fn persist_snapshot(path: &Path, snapshot: &SnapshotFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_data_dir".to_string(),
            cause: e.to_string(),
        })?;
    }

    let contents = serde_json::to_string_pretty(snapshot).map_err(|e| Error::OperationFailed {
        operation: "serialize_snapshot".to_string(),
        cause: e.to_string(),
    })?;

    std::fs::write(path, contents).map_err(|e| Error::OperationFailed {
        operation: "write_snapshot".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> JournalStore {
        JournalStore::new(Arc::new(ChangeBus::new()), None).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_entry() {
        let store = store();
        let entry = store
            .create_entry("First", "hello world", &["travel".to_string()])
            .await
            .unwrap();

        assert_eq!(entry.id, EntryId::new(1));
        let fetched = store.get_entry(entry.id).unwrap();
        assert_eq!(fetched.title, "First");
        assert_eq!(fetched.tags, vec!["travel".to_string()]);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = store();
        let a = store.create_entry("a", "", &[]).await.unwrap();
        let b = store.create_entry("b", "", &[]).await.unwrap();
        assert_eq!(a.id.value() + 1, b.id.value());
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let store = store();
        assert!(store.create_entry("  ", "body", &[]).await.is_err());
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_exactly_one_publish_per_mutation() {
        let bus = Arc::new(ChangeBus::new());
        let publishes = Arc::new(AtomicUsize::new(0));
        let publishes_clone = publishes.clone();
        bus.subscribe(move |_change| {
            let publishes = publishes_clone.clone();
            async move {
                publishes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let store = JournalStore::new(bus, None).unwrap();
        let entry = store.create_entry("a", "b", &[]).await.unwrap();
        store
            .update_entry(entry.id, Some("c".to_string()), None, None)
            .await
            .unwrap();
        store.delete_entry(entry.id).await.unwrap();

        assert_eq!(publishes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_mutation_publishes_nothing() {
        let bus = Arc::new(ChangeBus::new());
        let publishes = Arc::new(AtomicUsize::new(0));
        let publishes_clone = publishes.clone();
        bus.subscribe(move |_change| {
            let publishes = publishes_clone.clone();
            async move {
                publishes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let store = JournalStore::new(bus, None).unwrap();
        assert!(store.delete_entry(EntryId::new(9)).await.is_err());
        assert!(
            store
                .update_entry(EntryId::new(9), None, None, None)
                .await
                .is_err()
        );
        assert_eq!(publishes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_changeset_names_identity_only() {
        let bus = Arc::new(ChangeBus::new());
        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();
        bus.subscribe(move |change| {
            let last = last_clone.clone();
            async move {
                *last.lock().unwrap() = Some(change);
                Ok(())
            }
        });

        let store = JournalStore::new(bus, None).unwrap();
        let entry = store.create_entry("a", "b", &[]).await.unwrap();
        store
            .update_entry(entry.id, None, Some("new body".to_string()), None)
            .await
            .unwrap();

        let change = last.lock().unwrap().clone().unwrap();
        assert_eq!(change.entries, vec![entry.id]);
        assert!(change.categories.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_tag_rejected() {
        let store = store();
        store.create_tag("travel", None).await.unwrap();
        assert!(store.create_tag("travel", None).await.is_err());
        assert_eq!(store.tag_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        {
            let store =
                JournalStore::new(Arc::new(ChangeBus::new()), Some(path.clone())).unwrap();
            store.create_entry("kept", "body", &[]).await.unwrap();
            store.create_tag("travel", Some("trips".to_string())).await.unwrap();
        }

        let reloaded = JournalStore::new(Arc::new(ChangeBus::new()), Some(path)).unwrap();
        assert_eq!(reloaded.entry_count(), 1);
        assert_eq!(reloaded.tag_count(), 1);
        assert_eq!(reloaded.list_entries()[0].title, "kept");

        // Ids continue after the loaded maximum.
        let next = reloaded.create_entry("new", "", &[]).await.unwrap();
        assert_eq!(next.id, EntryId::new(2));
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JournalStore::new(Arc::new(ChangeBus::new()), Some(path)).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }
}
