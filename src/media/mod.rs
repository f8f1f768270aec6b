//! Video file access for the media directory.
//!
//! The media directory is externally managed: the render pipeline writes
//! into it and users may add or delete files at any time. Listing therefore
//! never fails; a missing or unreadable directory is an empty library.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Recognized video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv"];

/// One video file in the media directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    /// Filename without any directory component.
    pub name: String,
    /// File size in bytes.
    pub size: u64,
}

/// Read access to the media directory.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    dir: PathBuf,
}

impl MediaLibrary {
    /// Creates a library over the given directory.
    ///
    /// The directory does not need to exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the media directory path.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists video files, sorted by filename.
    ///
    /// A missing or unreadable directory yields an empty list.
    #[must_use]
    pub fn list(&self) -> Vec<MediaFile> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %self.dir.display(), error = %e, "media directory not readable");
                return Vec::new();
            },
        };

        let mut files: Vec<MediaFile> = entries
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if !is_video_file(&path) {
                    return None;
                }
                let name = path.file_name()?.to_str()?.to_string();
                let size = entry.metadata().map(|m| m.len()).unwrap_or_default();
                Some(MediaFile { name, size })
            })
            .collect();

        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    /// Lists video filenames, sorted.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.list().into_iter().map(|f| f.name).collect()
    }

    /// Returns the number of video files.
    #[must_use]
    pub fn count(&self) -> usize {
        self.list().len()
    }

    /// Reads one video file's bytes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` naming the file when it does not exist, and
    /// `InvalidInput` when the name contains path components.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(Error::InvalidInput(format!("invalid video filename: {name}")));
        }

        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    kind: "video".to_string(),
                    id: name.to_string(),
                }
            } else {
                Error::OperationFailed {
                    operation: "read_video".to_string(),
                    cause: format!("{}: {e}", path.display()),
                }
            }
        })
    }
}

fn is_video_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
