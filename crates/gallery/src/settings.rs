//! Immutable gallery configuration.
//!
//! A [`GallerySettings`] value is built once at startup and handed to every
//! component that needs it. Nothing here is mutated afterwards.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Extensions accepted when no explicit list is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Default upload limit (16 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 16 * 1024 * 1024;

/// Default number of images per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Which gallery directory a path is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalleryRoot {
    /// The original coloring book images.
    Source,
    /// User-uploaded images.
    Saved,
}

/// Case-insensitive set of allowed file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedExtensions {
    extensions: BTreeSet<String>,
}

impl AllowedExtensions {
    /// Create a set from the given extensions (without leading dots).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Check whether `name` ends in an allowed extension.
    ///
    /// The extension is the text after the last `.`; a name without a dot
    /// never matches.
    pub fn matches(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((_, ext)) => self.contains(ext),
            None => false,
        }
    }

    /// Check whether a bare extension is allowed.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(&extension.to_ascii_lowercase())
    }

    /// Iterate the allowed extensions in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for AllowedExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS)
    }
}

/// Configuration for the gallery core.
#[derive(Debug, Clone)]
pub struct GallerySettings {
    /// Directory holding the source images.
    pub source_root: PathBuf,
    /// Directory receiving uploads.
    pub saved_root: PathBuf,
    /// Extension allow-list applied to listings and uploads.
    pub extensions: AllowedExtensions,
    /// Maximum accepted upload size in bytes.
    pub max_upload_size: u64,
    /// Number of images per page.
    pub page_size: NonZeroUsize,
}

impl GallerySettings {
    /// Create settings for the given roots with default limits.
    pub fn new(source_root: impl Into<PathBuf>, saved_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            saved_root: saved_root.into(),
            extensions: AllowedExtensions::default(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn with_extensions(mut self, extensions: AllowedExtensions) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_max_upload_size(mut self, max_upload_size: u64) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The directory for the given root.
    pub fn root(&self, root: GalleryRoot) -> &Path {
        match root {
            GalleryRoot::Source => &self.source_root,
            GalleryRoot::Saved => &self.saved_root,
        }
    }
}
