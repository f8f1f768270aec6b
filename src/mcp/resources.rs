//! MCP resource catalog.
//!
//! Resources are accessed via the `daybook://` scheme: a per-category index
//! plus one resource per entry, tag, and video. Categories stay hidden while
//! the capability gate has them disabled, and reads against a disabled
//! category fail the same way as reads against nothing.

use crate::capabilities::CapabilityGate;
use crate::media::MediaLibrary;
use crate::models::{ResourceCategory, ResourceUri, entry_uri, tag_uri, video_uri};
use crate::store::JournalStore;
use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Definition of an MCP resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Resource URI.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// MIME type of the resource.
    pub mime_type: Option<String>,
}

/// Content of an MCP resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContent {
    /// Resource URI.
    pub uri: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Text content (for text resources).
    pub text: Option<String>,
    /// Binary content as base64 (for binary resources).
    pub blob: Option<String>,
}

/// Gated view over journal and media resources.
pub struct ResourceCatalog {
    store: Arc<JournalStore>,
    media: MediaLibrary,
    gate: Arc<CapabilityGate>,
}

impl ResourceCatalog {
    /// Creates a catalog over the given stores.
    #[must_use]
    pub const fn new(
        store: Arc<JournalStore>,
        media: MediaLibrary,
        gate: Arc<CapabilityGate>,
    ) -> Self {
        Self { store, media, gate }
    }

    /// Lists the resources of every enabled category.
    #[must_use]
    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        let mut resources = Vec::new();

        if self.category_enabled(ResourceCategory::Entries) {
            resources.push(ResourceDefinition {
                uri: "daybook://entries".to_string(),
                name: "Journal entries".to_string(),
                description: Some("All journal entries as JSON".to_string()),
                mime_type: Some("application/json".to_string()),
            });
            for entry in self.store.list_entries() {
                resources.push(ResourceDefinition {
                    uri: entry_uri(entry.id),
                    name: entry.title,
                    description: None,
                    mime_type: Some("application/json".to_string()),
                });
            }
        }

        if self.category_enabled(ResourceCategory::Tags) {
            resources.push(ResourceDefinition {
                uri: "daybook://tags".to_string(),
                name: "Tags".to_string(),
                description: Some("All tags as JSON".to_string()),
                mime_type: Some("application/json".to_string()),
            });
            for tag in self.store.list_tags() {
                resources.push(ResourceDefinition {
                    uri: tag_uri(tag.id),
                    name: tag.name,
                    description: tag.description,
                    mime_type: Some("application/json".to_string()),
                });
            }
        }

        if self.category_enabled(ResourceCategory::Videos) {
            resources.push(ResourceDefinition {
                uri: "daybook://videos".to_string(),
                name: "Videos".to_string(),
                description: Some("Rendered recap videos".to_string()),
                mime_type: Some("application/json".to_string()),
            });
            for file in self.media.list() {
                resources.push(ResourceDefinition {
                    uri: video_uri(&file.name),
                    name: file.name.clone(),
                    description: None,
                    mime_type: Some(video_mime(&file.name).to_string()),
                });
            }
        }

        resources
    }

    /// Reads one resource.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for URIs outside the `daybook://` scheme and
    /// `NotFound` for disabled categories or missing records.
    pub fn read(&self, uri: &str) -> Result<ResourceContent> {
        let parsed = ResourceUri::parse(uri)?;

        if !self.category_enabled(parsed.category()) {
            return Err(Error::NotFound {
                kind: "resource".to_string(),
                id: uri.to_string(),
            });
        }

        match parsed {
            ResourceUri::EntryIndex => json_content(uri, &self.store.list_entries()),
            ResourceUri::Entry(id) => json_content(uri, &self.store.get_entry(id)?),
            ResourceUri::TagIndex => json_content(uri, &self.store.list_tags()),
            ResourceUri::Tag(id) => json_content(uri, &self.store.get_tag(id)?),
            ResourceUri::VideoIndex => json_content(uri, &self.media.list()),
            ResourceUri::Video(name) => {
                let bytes = self.media.read(&name)?;
                Ok(ResourceContent {
                    uri: uri.to_string(),
                    mime_type: Some(video_mime(&name).to_string()),
                    text: None,
                    blob: Some(STANDARD.encode(bytes)),
                })
            }
        }
    }

    fn category_enabled(&self, category: ResourceCategory) -> bool {
        self.gate.is_enabled(category.as_str())
    }
}

fn json_content<T: Serialize>(uri: &str, value: &T) -> Result<ResourceContent> {
    let text = serde_json::to_string_pretty(value).map_err(|e| Error::OperationFailed {
        operation: "serialize_resource".to_string(),
        cause: e.to_string(),
    })?;
    Ok(ResourceContent {
        uri: uri.to_string(),
        mime_type: Some("application/json".to_string()),
        text: Some(text),
        blob: None,
    })
}

fn video_mime(name: &str) -> &'static str {
    let extension = name.rsplit('.').next().unwrap_or_default();
    if extension.eq_ignore_ascii_case("mp4") {
        "video/mp4"
    } else if extension.eq_ignore_ascii_case("mov") {
        "video/quicktime"
    } else if extension.eq_ignore_ascii_case("webm") {
        "video/webm"
    } else if extension.eq_ignore_ascii_case("mkv") {
        "video/x-matroska"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilityKind;
    use crate::events::ChangeBus;
    use crate::models::DomainCounts;
    use test_case::test_case;

    struct Fixture {
        catalog: ResourceCatalog,
        store: Arc<JournalStore>,
        gate: Arc<CapabilityGate>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JournalStore::new(Arc::new(ChangeBus::new()), None).unwrap());
        let media = MediaLibrary::new(dir.path().join("videos"));
        let gate = Arc::new(CapabilityGate::new());
        for category in [
            ResourceCategory::Entries,
            ResourceCategory::Tags,
            ResourceCategory::Videos,
        ] {
            let wanted = category;
            gate.register(category.as_str(), CapabilityKind::Resources, move |c| {
                match wanted {
                    ResourceCategory::Entries => c.entries > 0,
                    ResourceCategory::Tags => c.tags > 0,
                    ResourceCategory::Videos => c.videos > 0,
                }
            });
        }
        let catalog = ResourceCatalog::new(store.clone(), media, gate.clone());
        Fixture {
            catalog,
            store,
            gate,
            _dir: dir,
        }
    }

    fn enable(fixture: &Fixture, entries: usize, tags: usize, videos: usize) {
        fixture.gate.initialize(&DomainCounts {
            entries,
            tags,
            videos,
        });
    }

    #[tokio::test]
    async fn test_disabled_categories_list_nothing() {
        let fixture = fixture();
        fixture
            .store
            .create_entry("hidden", "body", &[])
            .await
            .unwrap();
        enable(&fixture, 0, 0, 0);

        assert!(fixture.catalog.list_resources().is_empty());
    }

    #[tokio::test]
    async fn test_enabled_category_lists_index_and_items() {
        let fixture = fixture();
        let entry = fixture
            .store
            .create_entry("First day", "body", &[])
            .await
            .unwrap();
        enable(&fixture, 1, 0, 0);

        let resources = fixture.catalog.list_resources();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].uri, "daybook://entries");
        assert_eq!(resources[1].uri, entry_uri(entry.id));
        assert_eq!(resources[1].name, "First day");
    }

    #[tokio::test]
    async fn test_read_entry_as_json() {
        let fixture = fixture();
        let entry = fixture
            .store
            .create_entry("First day", "hello", &[])
            .await
            .unwrap();
        enable(&fixture, 1, 0, 0);

        let content = fixture.catalog.read(&entry_uri(entry.id)).unwrap();
        assert_eq!(content.mime_type.as_deref(), Some("application/json"));
        let text = content.text.unwrap();
        assert!(text.contains("First day"));
        assert!(content.blob.is_none());
    }

    #[tokio::test]
    async fn test_read_disabled_category_is_not_found() {
        let fixture = fixture();
        let entry = fixture
            .store
            .create_entry("hidden", "body", &[])
            .await
            .unwrap();
        enable(&fixture, 0, 0, 0);

        let err = fixture.catalog.read(&entry_uri(entry.id)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_read_unknown_scheme_is_invalid() {
        let fixture = fixture();
        enable(&fixture, 1, 1, 1);
        let err = fixture.catalog.read("notes://stuff/abc").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_read_video_returns_base64_blob() {
        let fixture = fixture();
        let videos = fixture._dir.path().join("videos");
        std::fs::create_dir_all(&videos).unwrap();
        std::fs::write(videos.join("clip.mp4"), b"abc").unwrap();
        enable(&fixture, 0, 0, 1);

        let content = fixture.catalog.read("daybook://videos/clip.mp4").unwrap();
        assert_eq!(content.mime_type.as_deref(), Some("video/mp4"));
        assert!(content.text.is_none());
        assert_eq!(content.blob.as_deref(), Some("YWJj"));
    }

    #[test_case("a.mp4", "video/mp4")]
    #[test_case("a.MOV", "video/quicktime")]
    #[test_case("a.webm", "video/webm")]
    #[test_case("a.mkv", "video/x-matroska")]
    #[test_case("weird", "application/octet-stream")]
    fn test_video_mime_by_extension(name: &str, expected: &str) {
        assert_eq!(video_mime(name), expected);
    }
}
