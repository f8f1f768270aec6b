//! Data models for daybook.
//!
//! This module contains all the core data structures used throughout the system.

mod change;
mod entry;
mod uri;

pub use change::{ChangeSet, ResourceCategory};
pub use entry::{DomainCounts, EntryId, JournalEntry, Tag, TagId};
pub use uri::{ResourceUri, entry_uri, tag_uri, video_uri};
