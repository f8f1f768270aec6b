//! Resource URI parsing and handling.
//!
//! Daybook identifies resources with URIs under the `daybook://` scheme:
//!
//! ```text
//! daybook://entries          category index
//! daybook://entries/{id}     one journal entry
//! daybook://tags             category index
//! daybook://tags/{id}        one tag
//! daybook://videos           category index
//! daybook://videos/{name}    one video file
//! ```
//!
//! # Examples
//!
//! ```
//! use daybook::models::ResourceUri;
//!
//! let uri = ResourceUri::parse("daybook://entries/42").unwrap();
//! assert_eq!(uri.to_string(), "daybook://entries/42");
//!
//! let uri = ResourceUri::parse("daybook://videos/recap-2025.mp4").unwrap();
//! assert!(matches!(uri, ResourceUri::Video(_)));
//! ```

use super::entry::{EntryId, TagId};
use crate::{Error, Result};
use std::fmt;

/// URI scheme prefix for all daybook resources.
pub const SCHEME: &str = "daybook://";

/// A parsed daybook resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// Index of all journal entries.
    EntryIndex,
    /// One journal entry.
    Entry(EntryId),
    /// Index of all tags.
    TagIndex,
    /// One tag.
    Tag(TagId),
    /// Index of all videos.
    VideoIndex,
    /// One video file, by filename.
    Video(String),
}

impl ResourceUri {
    /// Parses a resource URI string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid daybook URI.
    pub fn parse(s: &str) -> Result<Self> {
        let path = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidInput(format!("URI must start with '{SCHEME}': {s}")))?;

        let (category, rest) = match path.split_once('/') {
            Some((category, rest)) => (category, Some(rest)),
            None => (path, None),
        };

        match (category, rest) {
            ("entries", None) => Ok(Self::EntryIndex),
            ("entries", Some(id)) => Ok(Self::Entry(EntryId::new(parse_id(s, id)?))),
            ("tags", None) => Ok(Self::TagIndex),
            ("tags", Some(id)) => Ok(Self::Tag(TagId::new(parse_id(s, id)?))),
            ("videos", None) => Ok(Self::VideoIndex),
            ("videos", Some(name)) if !name.is_empty() && !name.contains('/') => {
                Ok(Self::Video(name.to_string()))
            },
            _ => Err(Error::InvalidInput(format!("unrecognized resource URI: {s}"))),
        }
    }

    /// Returns the category this URI belongs to.
    #[must_use]
    pub const fn category(&self) -> super::ResourceCategory {
        match self {
            Self::EntryIndex | Self::Entry(_) => super::ResourceCategory::Entries,
            Self::TagIndex | Self::Tag(_) => super::ResourceCategory::Tags,
            Self::VideoIndex | Self::Video(_) => super::ResourceCategory::Videos,
        }
    }
}

fn parse_id(uri: &str, segment: &str) -> Result<u64> {
    segment
        .parse()
        .map_err(|_| Error::InvalidInput(format!("URI id segment must be numeric: {uri}")))
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryIndex => write!(f, "{SCHEME}entries"),
            Self::Entry(id) => write!(f, "{SCHEME}entries/{id}"),
            Self::TagIndex => write!(f, "{SCHEME}tags"),
            Self::Tag(id) => write!(f, "{SCHEME}tags/{id}"),
            Self::VideoIndex => write!(f, "{SCHEME}videos"),
            Self::Video(name) => write!(f, "{SCHEME}videos/{name}"),
        }
    }
}

/// Builds the URI for one journal entry.
#[must_use]
pub fn entry_uri(id: EntryId) -> String {
    ResourceUri::Entry(id).to_string()
}

/// Builds the URI for one tag.
#[must_use]
pub fn tag_uri(id: TagId) -> String {
    ResourceUri::Tag(id).to_string()
}

/// Builds the URI for one video file.
#[must_use]
pub fn video_uri(name: &str) -> String {
    ResourceUri::Video(name.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_indexes() {
        assert_eq!(
            ResourceUri::parse("daybook://entries").unwrap(),
            ResourceUri::EntryIndex
        );
        assert_eq!(
            ResourceUri::parse("daybook://tags").unwrap(),
            ResourceUri::TagIndex
        );
        assert_eq!(
            ResourceUri::parse("daybook://videos").unwrap(),
            ResourceUri::VideoIndex
        );
    }

    #[test]
    fn test_parse_items() {
        assert_eq!(
            ResourceUri::parse("daybook://entries/42").unwrap(),
            ResourceUri::Entry(EntryId::new(42))
        );
        assert_eq!(
            ResourceUri::parse("daybook://tags/3").unwrap(),
            ResourceUri::Tag(TagId::new(3))
        );
        assert_eq!(
            ResourceUri::parse("daybook://videos/recap-2025.mp4").unwrap(),
            ResourceUri::Video("recap-2025.mp4".to_string())
        );
    }

    #[test]
    fn test_display_round_trip() {
        for uri in [
            "daybook://entries",
            "daybook://entries/7",
            "daybook://tags/1",
            "daybook://videos/a.mp4",
        ] {
            let parsed = ResourceUri::parse(uri).unwrap();
            assert_eq!(parsed.to_string(), uri);
        }
    }

    #[test]
    fn test_rejects_bad_uris() {
        assert!(ResourceUri::parse("journal://entries/1").is_err());
        assert!(ResourceUri::parse("daybook://notes/1").is_err());
        assert!(ResourceUri::parse("daybook://entries/abc").is_err());
        assert!(ResourceUri::parse("daybook://videos/a/b.mp4").is_err());
        assert!(ResourceUri::parse("daybook://videos/").is_err());
    }

    #[test]
    fn test_category() {
        use crate::models::ResourceCategory;
        assert_eq!(
            ResourceUri::parse("daybook://entries/1").unwrap().category(),
            ResourceCategory::Entries
        );
        assert_eq!(
            ResourceUri::parse("daybook://videos").unwrap().category(),
            ResourceCategory::Videos
        );
    }

    #[test]
    fn test_builders() {
        assert_eq!(entry_uri(EntryId::new(5)), "daybook://entries/5");
        assert_eq!(tag_uri(TagId::new(2)), "daybook://tags/2");
        assert_eq!(video_uri("x.mp4"), "daybook://videos/x.mp4");
    }
}
