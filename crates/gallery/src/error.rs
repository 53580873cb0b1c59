//! Error types for the gallery crate.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result alias used across the gallery crate.
pub type Result<T, E = GalleryError> = std::result::Result<T, E>;

/// Gallery error type covering every failure the core can report.
///
/// Errors are never retried inside the core; they propagate to the boundary
/// layer, which turns them into structured failure payloads.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The name is empty or has no allowed extension after sanitizing.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// The declared file name does not carry an allowed extension.
    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),

    /// The uploaded content exceeds the configured limit.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge {
        /// Measured size of the content.
        size: u64,
        /// Configured upload limit.
        limit: u64,
    },

    /// No file part was supplied, or its declared name is empty.
    #[error("no file provided")]
    MissingFile,

    /// A gallery root could not be read.
    #[error("storage unavailable: {}", path.display())]
    StorageUnavailable {
        /// The root that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Writing an upload to the saved root failed.
    #[error("failed to persist {name}")]
    Persist {
        /// The stored name that was being written.
        name: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A requested image does not exist inside its root.
    #[error("image not found: {0}")]
    NotFound(String),
}

/// Machine-readable tag for a [`GalleryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidName,
    UnsupportedType,
    FileTooLarge,
    MissingFile,
    StorageUnavailable,
    Persist,
    NotFound,
}

impl GalleryError {
    /// Returns the tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::MissingFile => ErrorKind::MissingFile,
            Self::StorageUnavailable { .. } => ErrorKind::StorageUnavailable,
            Self::Persist { .. } => ErrorKind::Persist,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn persist(name: impl Into<String>, source: io::Error) -> Self {
        Self::Persist {
            name: name.into(),
            source,
        }
    }
}

impl ErrorKind {
    /// Returns the snake_case tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidName => "invalid_name",
            Self::UnsupportedType => "unsupported_type",
            Self::FileTooLarge => "file_too_large",
            Self::MissingFile => "missing_file",
            Self::StorageUnavailable => "storage_unavailable",
            Self::Persist => "persist",
            Self::NotFound => "not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(GalleryError::MissingFile.kind(), ErrorKind::MissingFile);
        assert_eq!(
            GalleryError::FileTooLarge { size: 2, limit: 1 }.kind(),
            ErrorKind::FileTooLarge
        );
        assert_eq!(
            GalleryError::storage("/x", io::Error::other("gone")).kind(),
            ErrorKind::StorageUnavailable
        );
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        for kind in [
            ErrorKind::InvalidName,
            ErrorKind::UnsupportedType,
            ErrorKind::FileTooLarge,
            ErrorKind::MissingFile,
            ErrorKind::StorageUnavailable,
            ErrorKind::Persist,
            ErrorKind::NotFound,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_display_hides_io_source() {
        let err = GalleryError::persist("x.png", io::Error::other("disk on fire"));
        let message = err.to_string();
        assert_eq!(message, "failed to persist x.png");
        assert!(!message.contains("disk on fire"));
    }

    #[test]
    fn test_file_too_large_message() {
        let err = GalleryError::FileTooLarge {
            size: 17,
            limit: 16,
        };
        assert_eq!(
            err.to_string(),
            "file too large: 17 bytes exceeds limit of 16 bytes"
        );
    }
}
