//! Change descriptors published on the change bus.

use super::entry::{EntryId, TagId};
use super::uri::{entry_uri, tag_uri, video_uri};
use std::fmt;

/// Resource categories served by the MCP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    /// Journal entries.
    Entries,
    /// Tags.
    Tags,
    /// Rendered and externally added videos.
    Videos,
}

impl ResourceCategory {
    /// Returns the category name used in URIs and capability ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entries => "entries",
            Self::Tags => "tags",
            Self::Videos => "videos",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Description of one committed mutation.
///
/// A `ChangeSet` names the identities a mutation touched. It is an immutable
/// value: the store builds it, the bus hands a clone to every handler, and
/// nothing is persisted. Consumers decide for themselves what a change means
/// (the capability gate recounts, the subscription registry routes).
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Entry ids the mutation touched.
    pub entries: Vec<EntryId>,
    /// Tag ids the mutation touched.
    pub tags: Vec<TagId>,
    /// Video filenames that appeared or disappeared.
    pub videos: Vec<String>,
    /// Categories whose overall listing changed.
    pub categories: Vec<ResourceCategory>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            tags: Vec::new(),
            videos: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Adds a touched entry.
    #[must_use]
    pub fn with_entry(mut self, id: EntryId) -> Self {
        self.entries.push(id);
        self
    }

    /// Adds a touched tag.
    #[must_use]
    pub fn with_tag(mut self, id: TagId) -> Self {
        self.tags.push(id);
        self
    }

    /// Adds a touched video filename.
    #[must_use]
    pub fn with_video(mut self, name: impl Into<String>) -> Self {
        self.videos.push(name.into());
        self
    }

    /// Marks a category whose listing changed.
    #[must_use]
    pub fn with_category(mut self, category: ResourceCategory) -> Self {
        self.categories.push(category);
        self
    }

    /// Returns true when the change set names nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.tags.is_empty()
            && self.videos.is_empty()
            && self.categories.is_empty()
    }

    /// Expands the change set to identity URIs.
    ///
    /// Each affected identity appears exactly once, in first-seen order,
    /// even when the mutation touched it more than once.
    #[must_use]
    pub fn identities(&self) -> Vec<String> {
        let mut uris = Vec::new();
        for id in &self.entries {
            push_unique(&mut uris, entry_uri(*id));
        }
        for id in &self.tags {
            push_unique(&mut uris, tag_uri(*id));
        }
        for name in &self.videos {
            push_unique(&mut uris, video_uri(name));
        }
        uris
    }
}

fn push_unique(uris: &mut Vec<String>, uri: String) {
    if !uris.iter().any(|u| u == &uri) {
        uris.push(uri);
    }
}
