//! Filename sanitizing and stored-name generation.
//!
//! User-supplied names are reduced to a single, portable path component:
//! accented letters decompose to their ASCII base, directory parts collapse
//! into the name itself, anything outside `[A-Za-z0-9._-]` is dropped, and the result must still end in an allowed
//! extension.

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use crate::error::{GalleryError, Result};
use crate::settings::AllowedExtensions;

/// Longest sanitized name kept, leaving room for the timestamp prefix.
pub const MAX_SANITIZED_LEN: usize = 200;

/// `strftime` pattern for the stored-name prefix (20 digits, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Device names Windows refuses to use as file names.
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce an arbitrary user-supplied name to a safe base name.
///
/// Fails with [`GalleryError::InvalidName`] when nothing usable is left or
/// the result lacks an allowed extension.
pub fn sanitize(original: &str, extensions: &AllowedExtensions) -> Result<String> {
    // NFKD splits "é" into "e" plus a combining mark, which the ASCII filter drops.
    let spaced: String = original
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    let mut name = filtered.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = name.split('.').next().unwrap_or_default();
    if WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
    {
        name.insert(0, '_');
    }

    let name = truncate_keeping_extension(name);

    if name.is_empty() || !extensions.matches(&name) {
        return Err(GalleryError::InvalidName(original.to_string()));
    }

    Ok(name)
}

/// Build the name an upload is stored under.
pub fn stored_name(now: DateTime<Utc>, sanitized: &str) -> String {
    format!("{}_{}", now.format(TIMESTAMP_FORMAT), sanitized)
}

fn truncate_keeping_extension(name: String) -> String {
    if name.len() <= MAX_SANITIZED_LEN {
        return name;
    }

    // Names are ASCII at this point, so byte offsets are char boundaries.
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() + 1 < MAX_SANITIZED_LEN => {
            let keep = MAX_SANITIZED_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => name[..MAX_SANITIZED_LEN].to_string(),
    }
}
