//! Root-relative image references.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// A relative, forward-slash separated path to an image inside a gallery root.
///
/// Values are produced by the scanner, which only yields paths that live
/// inside their root and carry an allowed extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub(crate) fn new(path: String) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Case-insensitive ordering with an exact-match tiebreak.
    pub fn cmp_case_insensitive(&self, other: &Self) -> Ordering {
        self.0
            .to_lowercase()
            .cmp(&other.0.to_lowercase())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_order() {
        let a = ImageRef::new("apple.png".into());
        let b = ImageRef::new("Banana.png".into());
        assert_eq!(a.cmp_case_insensitive(&b), Ordering::Less);
        assert_eq!(b.cmp_case_insensitive(&a), Ordering::Greater);
    }

    #[test]
    fn test_tiebreak_is_deterministic() {
        let upper = ImageRef::new("Cat.png".into());
        let lower = ImageRef::new("cat.png".into());
        assert_eq!(upper.cmp_case_insensitive(&lower), Ordering::Less);
        assert_eq!(lower.cmp_case_insensitive(&upper), Ordering::Greater);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let r = ImageRef::new("animals/cat.png".into());
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"animals/cat.png\"");
    }
}
