//! # Daybook
//!
//! A journaling system with a reactive MCP front end.
//!
//! Daybook stores journal entries and tags, serves them to MCP clients over
//! stdio, and turns a year of entries into a short recap video through an
//! external renderer.
//!
//! ## Features
//!
//! - Single-binary distribution with a JSON snapshot store
//! - Change bus fanning out every committed mutation to ordered handlers
//! - Capability gate that enables prompts and resource categories from
//!   live domain counts, with batched `list_changed` notifications
//! - Per-URI resource subscriptions with targeted `resources/updated`
//!   notifications
//! - Poll-based watcher for externally managed video files
//! - ffmpeg render pipeline with live progress and immediate cancellation
//!
//! ## Example
//!
//! ```rust,ignore
//! use daybook::{ChangeBus, JournalStore};
//! use std::sync::Arc;
//!
//! let bus = Arc::new(ChangeBus::new());
//! let store = JournalStore::new(bus.clone(), None)?;
//! let entry = store.create_entry("First entry", "Hello", &[]).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod capabilities;
pub mod config;
pub mod events;
pub mod mcp;
pub mod media;
pub mod models;
pub mod observability;
pub mod render;
pub mod store;
pub mod subscriptions;

// Re-exports for convenience
pub use capabilities::{CapabilityFlip, CapabilityGate, CapabilityKind};
pub use config::DaybookConfig;
pub use events::{ChangeBus, MediaWatcher, SubscriberId};
pub use mcp::McpServer;
pub use media::MediaLibrary;
pub use models::{
    ChangeSet, DomainCounts, EntryId, JournalEntry, ResourceCategory, ResourceUri, Tag, TagId,
};
pub use render::{RenderOutcome, RenderPipeline, RendererKind, SceneSpec};
pub use store::JournalStore;
pub use subscriptions::SubscriptionRegistry;

/// Error type for daybook operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Missing required parameters, unknown tools or prompts, malformed URIs |
/// | `NotFound` | Entry, tag, video, or resource lookups that name a missing identity |
/// | `OperationFailed` | Filesystem I/O fails, snapshot writes fail, subprocess spawn fails |
/// | `MalformedPayload` | External data such as the snapshot file fails to parse |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Required parameters are missing from a tool or method call
    /// - An unknown tool or prompt name is requested
    /// - A resource URI does not parse under the `daybook://` scheme
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A named record or resource does not exist.
    ///
    /// Raised when:
    /// - An entry or tag id has no record in the store
    /// - A video filename is absent from the media directory
    /// - A resource read targets a URI outside the current listing
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of the missing identity (entry, tag, video, resource).
        kind: String,
        /// The identity that was requested.
        id: String,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - The store snapshot cannot be written or read
    /// - The renderer subprocess cannot be spawned
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// External data could not be parsed.
    ///
    /// Carries a prefix of the offending payload so logs show what arrived.
    #[error("malformed {context} payload: {payload}")]
    MalformedPayload {
        /// Where the payload came from.
        context: String,
        /// The raw payload that failed to parse.
        payload: String,
    },
}

/// Result type alias for daybook operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::NotFound {
            kind: "entry".to_string(),
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "entry not found: 42");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::MalformedPayload {
            context: "snapshot".to_string(),
            payload: "{not json".to_string(),
        };
        assert_eq!(err.to_string(), "malformed snapshot payload: {not json");
    }
}
