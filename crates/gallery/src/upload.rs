//! Upload validation and persistence.
//!
//! An upload moves through a fixed sequence of checks before anything is
//! written: presence, extension, measured size, then name sanitizing. The
//! bytes are written to a hidden temporary file inside the saved root and
//! moved into place with a rename that refuses to replace an existing file,
//! so a failed upload never leaves a file under its final name.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{GalleryError, Result};
use crate::sanitize::{sanitize, stored_name};
use crate::settings::{AllowedExtensions, GallerySettings};

const TEMP_PREFIX: &str = ".upload-";
const TEMP_SUFFIX: &str = ".part";

/// A file received from a client.
#[derive(Debug)]
pub struct IncomingFile<R> {
    /// Name the client declared for the file.
    pub declared_name: String,
    /// File content. Its length is measured by seeking, never trusted from
    /// client-supplied headers.
    pub stream: R,
}

impl<R> IncomingFile<R> {
    pub fn new(declared_name: impl Into<String>, stream: R) -> Self {
        Self {
            declared_name: declared_name.into(),
            stream,
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Name the file is stored under, relative to the saved root.
    pub stored_name: String,
    /// Absolute path of the stored file.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

/// Validates uploads and writes them to the saved root.
#[derive(Debug, Clone)]
pub struct UploadHandler {
    saved_root: PathBuf,
    extensions: AllowedExtensions,
    size_limit: u64,
}

impl UploadHandler {
    /// Create a handler writing into `saved_root`.
    pub fn new(saved_root: impl Into<PathBuf>, extensions: AllowedExtensions, size_limit: u64) -> Self {
        Self {
            saved_root: saved_root.into(),
            extensions,
            size_limit,
        }
    }

    /// Create a handler from gallery settings.
    pub fn from_settings(settings: &GallerySettings) -> Self {
        Self::new(
            settings.saved_root.clone(),
            settings.extensions.clone(),
            settings.max_upload_size,
        )
    }

    /// Accept an upload, stamping it with the current time.
    pub fn accept<R: Read + Seek>(&self, file: Option<IncomingFile<R>>) -> Result<StoredUpload> {
        self.accept_at(file, Utc::now())
    }

    /// Accept an upload, stamping it with `now`.
    pub fn accept_at<R: Read + Seek>(
        &self,
        file: Option<IncomingFile<R>>,
        now: DateTime<Utc>,
    ) -> Result<StoredUpload> {
        let Some(IncomingFile {
            declared_name,
            mut stream,
        }) = file
        else {
            return Err(GalleryError::MissingFile);
        };

        if declared_name.is_empty() {
            return Err(GalleryError::MissingFile);
        }

        if !self.extensions.matches(&declared_name) {
            return Err(GalleryError::UnsupportedType(declared_name));
        }

        let size = measure(&mut stream).map_err(|e| GalleryError::persist(&declared_name, e))?;
        if size > self.size_limit {
            return Err(GalleryError::FileTooLarge {
                size,
                limit: self.size_limit,
            });
        }

        let safe_name = sanitize(&declared_name, &self.extensions)?;
        let name = stored_name(now, &safe_name);

        let written = self.persist(&name, stream)?;

        info!(stored_name = %name, size = written, "Image saved");

        Ok(StoredUpload {
            path: self.saved_root.join(&name),
            stored_name: name,
            size: written,
        })
    }

    fn persist<R: Read>(&self, name: &str, stream: R) -> Result<u64> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.saved_root)
            .map_err(|e| GalleryError::persist(name, e))?;

        // Bounded copy: a stream that grows after measuring is still capped.
        let mut limited = stream.take(self.size_limit.saturating_add(1));
        let written =
            io::copy(&mut limited, temp.as_file_mut()).map_err(|e| GalleryError::persist(name, e))?;

        if written > self.size_limit {
            return Err(GalleryError::FileTooLarge {
                size: written,
                limit: self.size_limit,
            });
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| GalleryError::persist(name, e))?;

        let destination = self.saved_root.join(name);
        temp.persist_noclobber(&destination)
            .map_err(|e| GalleryError::persist(name, e.error))?;

        debug!(path = %destination.display(), "Upload moved into place");
        Ok(written)
    }
}

/// Measure a stream by seeking to its end and back to the start.
fn measure<S: Seek>(stream: &mut S) -> io::Result<u64> {
    let size = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(0))?;
    Ok(size)
}
