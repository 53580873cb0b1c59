//! Recursive image discovery under a gallery root.
//!
//! The scanner walks a root directory and yields every regular file whose
//! extension is allowed, as a forward-slash path relative to the root.
//! Symlinks are never descended into; a symlink to a file is listed only
//! when its canonical target stays inside the root.

use std::fs;
use std::io;
use std::path::{Component, Path};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{GalleryError, Result};
use crate::image_ref::ImageRef;
use crate::settings::AllowedExtensions;

/// Scan `root` for images with an allowed extension.
///
/// Ordering is unspecified; callers sort. Entries that cannot be read are
/// skipped. A root that is missing, not a directory, or unreadable fails the
/// whole scan with [`GalleryError::StorageUnavailable`].
pub fn scan(root: &Path, extensions: &AllowedExtensions) -> Result<Vec<ImageRef>> {
    let canonical_root = canonical_dir(root)?;

    let mut results = Vec::new();

    for entry_result in WalkDir::new(&canonical_root).follow_links(false).min_depth(1) {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let file_type = entry.file_type();
        let is_listable = if file_type.is_file() {
            true
        } else if file_type.is_symlink() {
            symlink_stays_inside(entry.path(), &canonical_root)
        } else {
            false
        };

        if !is_listable {
            continue;
        }

        let Some(relative) = relative_slash_path(entry.path(), &canonical_root) else {
            debug!(path = %entry.path().display(), "Skipping non UTF-8 path");
            continue;
        };

        if extensions.matches(&relative) {
            results.push(ImageRef::new(relative));
        }
    }

    // A root removed mid-walk must not produce a partial listing.
    if let Err(e) = fs::metadata(&canonical_root) {
        return Err(GalleryError::storage(root, e));
    }

    Ok(results)
}

/// Canonicalize a root and check it is a readable directory.
pub(crate) fn canonical_dir(root: &Path) -> Result<std::path::PathBuf> {
    let canonical = fs::canonicalize(root).map_err(|e| GalleryError::storage(root, e))?;

    let metadata = fs::metadata(&canonical).map_err(|e| GalleryError::storage(root, e))?;
    if !metadata.is_dir() {
        return Err(GalleryError::storage(
            root,
            io::Error::new(io::ErrorKind::NotADirectory, "gallery root is not a directory"),
        ));
    }

    // read_dir surfaces permission problems that metadata does not.
    fs::read_dir(&canonical).map_err(|e| GalleryError::storage(root, e))?;

    Ok(canonical)
}

fn symlink_stays_inside(link: &Path, canonical_root: &Path) -> bool {
    match fs::canonicalize(link) {
        Ok(target) => {
            let inside = target.starts_with(canonical_root);
            if !inside {
                debug!(link = %link.display(), "Ignoring symlink that leaves the root");
            }
            inside && target.is_file()
        }
        Err(_) => false,
    }
}

fn relative_slash_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(refs: Vec<ImageRef>) -> Vec<String> {
        let mut names: Vec<String> = refs.into_iter().map(ImageRef::into_string).collect();
        names.sort();
        names
    }

    fn create_test_structure(dir: &Path) {
        fs::create_dir_all(dir.join("animals/cats")).unwrap();
        fs::create_dir_all(dir.join("empty")).unwrap();

        fs::write(dir.join("house.png"), b"png").unwrap();
        fs::write(dir.join("Tree.JPG"), b"jpg").unwrap();
        fs::write(dir.join("notes.txt"), b"txt").unwrap();
        fs::write(dir.join("noextension"), b"x").unwrap();
        fs::write(dir.join("animals/dog.gif"), b"gif").unwrap();
        fs::write(dir.join("animals/cats/tabby.jpeg"), b"jpeg").unwrap();
        fs::write(dir.join("animals/cats/readme.md"), b"md").unwrap();
    }

    #[test]
    fn test_scan_recursive() {
        let temp_dir = TempDir::new().unwrap();
        create_test_structure(temp_dir.path());

        let found = scan(temp_dir.path(), &AllowedExtensions::default()).unwrap();

        assert_eq!(
            names(found),
            vec![
                "Tree.JPG",
                "animals/cats/tabby.jpeg",
                "animals/dog.gif",
                "house.png",
            ]
        );
    }

    #[test]
    fn test_scan_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        let found = scan(temp_dir.path(), &AllowedExtensions::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_ignores_directories_named_like_images() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("folder.png")).unwrap();

        let found = scan(temp_dir.path(), &AllowedExtensions::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");

        let result = scan(&missing, &AllowedExtensions::default());
        assert!(matches!(
            result,
            Err(GalleryError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_scan_root_is_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.png");
        fs::write(&file, b"png").unwrap();

        let result = scan(&file, &AllowedExtensions::default());
        assert!(matches!(
            result,
            Err(GalleryError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_scan_respects_custom_extensions() {
        let temp_dir = TempDir::new().unwrap();
        create_test_structure(temp_dir.path());

        let found = scan(temp_dir.path(), &AllowedExtensions::new(["txt"])).unwrap();
        assert_eq!(names(found), vec!["notes.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_listed() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        create_test_structure(temp_dir.path());
        symlink(
            temp_dir.path().join("house.png"),
            temp_dir.path().join("alias.png"),
        )
        .unwrap();

        let found = names(scan(temp_dir.path(), &AllowedExtensions::default()).unwrap());
        assert!(found.contains(&"alias.png".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_omitted() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let other_dir = TempDir::new().unwrap();
        fs::write(other_dir.path().join("secret.png"), b"secret").unwrap();
        fs::create_dir_all(other_dir.path().join("private")).unwrap();
        fs::write(other_dir.path().join("private/deep.png"), b"deep").unwrap();

        symlink(
            other_dir.path().join("secret.png"),
            temp_dir.path().join("sneaky.png"),
        )
        .unwrap();
        symlink(
            other_dir.path().join("private"),
            temp_dir.path().join("linked_dir"),
        )
        .unwrap();

        let found = scan(temp_dir.path(), &AllowedExtensions::default()).unwrap();
        assert!(found.is_empty(), "{found:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_omitted() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        symlink(
            temp_dir.path().join("missing.png"),
            temp_dir.path().join("dangling.png"),
        )
        .unwrap();

        let found = scan(temp_dir.path(), &AllowedExtensions::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/gallery");
        assert_eq!(
            relative_slash_path(&root.join("a").join("b.png"), root).as_deref(),
            Some("a/b.png")
        );
        assert_eq!(relative_slash_path(root, root), None);
        assert_eq!(relative_slash_path(Path::new("/elsewhere/x.png"), root), None);
    }
}
