//! Gallery listings and safe path resolution.
//!
//! [`Gallery`] composes the scanner, the sort policy and the pager. It keeps
//! no listing state between calls: every request walks the disk again, so a
//! listing is a point-in-time snapshot that may miss or repeat files written
//! concurrently by uploads.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::error::{GalleryError, Result};
use crate::image_ref::ImageRef;
use crate::pager::{paginate, Page};
use crate::scanner::{canonical_dir, scan};
use crate::settings::{GalleryRoot, GallerySettings};
use crate::upload::{IncomingFile, StoredUpload, UploadHandler};

/// Sort direction applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl GalleryRoot {
    /// Sort order used when listing this root.
    ///
    /// Saved images are listed newest-first by relying on the timestamp
    /// prefix of stored names; files without that prefix sort wherever
    /// their name lands.
    pub fn sort_order(self) -> SortOrder {
        match self {
            GalleryRoot::Source => SortOrder::Ascending,
            GalleryRoot::Saved => SortOrder::Descending,
        }
    }
}

/// The gallery service.
///
/// Cheap to clone: clones share one allocation holding the settings and the
/// upload handler built from them.
#[derive(Debug, Clone)]
pub struct Gallery {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    settings: GallerySettings,
    uploads: UploadHandler,
}

impl Gallery {
    /// Open a gallery, creating both roots if they are missing.
    pub fn open(settings: GallerySettings) -> Result<Self> {
        for root in [&settings.source_root, &settings.saved_root] {
            fs::create_dir_all(root).map_err(|e| GalleryError::storage(root.as_path(), e))?;
        }

        debug!(
            source = %settings.source_root.display(),
            saved = %settings.saved_root.display(),
            "Gallery roots ready"
        );

        Ok(Self::new(settings))
    }

    /// Create a gallery without touching the filesystem.
    pub fn new(settings: GallerySettings) -> Self {
        let uploads = UploadHandler::from_settings(&settings);
        Self {
            shared: Arc::new(Shared { settings, uploads }),
        }
    }

    pub fn settings(&self) -> &GallerySettings {
        &self.shared.settings
    }

    /// List source images, ascending by case-insensitive path.
    pub fn list_source(&self, page: i64) -> Result<Page<ImageRef>> {
        self.list(GalleryRoot::Source, page)
    }

    /// List saved images, descending by case-insensitive path.
    pub fn list_saved(&self, page: i64) -> Result<Page<ImageRef>> {
        self.list(GalleryRoot::Saved, page)
    }

    /// List one page of the given root using its sort order.
    pub fn list(&self, root: GalleryRoot, page: i64) -> Result<Page<ImageRef>> {
        let items = self.sorted(root)?;
        Ok(paginate(items, page, self.settings().page_size))
    }

    /// Every image in the given root, sorted by the root's order.
    pub fn sorted(&self, root: GalleryRoot) -> Result<Vec<ImageRef>> {
        let settings = self.settings();
        let mut items = scan(settings.root(root), &settings.extensions)?;
        sort_refs(&mut items, root.sort_order());
        Ok(items)
    }

    /// Accept an uploaded file into the saved root.
    pub fn accept_upload<R: Read + Seek>(
        &self,
        file: Option<IncomingFile<R>>,
    ) -> Result<StoredUpload> {
        self.shared.uploads.accept(file)
    }

    /// Resolve a client-supplied relative path to a servable file.
    ///
    /// Any path that is absolute, climbs with `..`, leaves the root through a
    /// symlink, lacks an allowed extension, or does not name an existing
    /// file is reported as [`GalleryError::NotFound`].
    pub fn resolve_servable(&self, root: GalleryRoot, relative: &str) -> Result<PathBuf> {
        let not_found = || GalleryError::NotFound(relative.to_string());

        if relative.is_empty() || relative.contains('\0') || relative.contains('\\') {
            return Err(not_found());
        }

        let requested = Path::new(relative);
        if !requested
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(not_found());
        }

        let settings = self.settings();
        if !settings.extensions.matches(relative) {
            return Err(not_found());
        }

        let base = canonical_dir(settings.root(root)).map_err(|_| not_found())?;
        let resolved = fs::canonicalize(base.join(requested)).map_err(|_| not_found())?;

        if !resolved.starts_with(&base) || !resolved.is_file() {
            debug!(path = relative, "Rejected path outside gallery root");
            return Err(not_found());
        }

        Ok(resolved)
    }
}

/// Sort image references case-insensitively in the given direction.
pub fn sort_refs(items: &mut [ImageRef], order: SortOrder) {
    match order {
        SortOrder::Ascending => items.sort_by(|a, b| a.cmp_case_insensitive(b)),
        SortOrder::Descending => items.sort_by(|a, b| b.cmp_case_insensitive(a)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use tempfile::TempDir;

    fn test_gallery() -> (Gallery, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let settings = GallerySettings::new(
            temp_dir.path().join("images"),
            temp_dir.path().join("saved"),
        );
        (Gallery::open(settings).unwrap(), temp_dir)
    }

    fn write(path: PathBuf) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"img").unwrap();
    }

    fn item_names(page: &Page<ImageRef>) -> Vec<&str> {
        page.items.iter().map(ImageRef::as_str).collect()
    }

    #[test]
    fn test_open_creates_roots() {
        let (gallery, _temp_dir) = test_gallery();
        assert!(gallery.settings().source_root.is_dir());
        assert!(gallery.settings().saved_root.is_dir());
    }

    #[test]
    fn test_clones_share_state() {
        let (gallery, _temp_dir) = test_gallery();
        let clone = gallery.clone();

        assert!(Arc::ptr_eq(&gallery.shared, &clone.shared));
        assert!(std::ptr::eq(gallery.settings(), clone.settings()));
        assert_eq!(Arc::strong_count(&gallery.shared), 2);
    }

    #[test]
    fn test_list_source_empty() {
        let (gallery, _temp_dir) = test_gallery();
        let page = gallery.list_source(1).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_list_source_sorted_case_insensitive() {
        let (gallery, _temp_dir) = test_gallery();
        let root = gallery.settings().source_root.clone();
        for name in ["zebra.png", "Apple.png", "banana.jpg", "animals/Cat.gif", "notes.txt"] {
            write(root.join(name));
        }

        let page = gallery.list_source(1).unwrap();
        assert_eq!(
            item_names(&page),
            vec!["animals/Cat.gif", "Apple.png", "banana.jpg", "zebra.png"]
        );
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_list_saved_newest_first() {
        let (gallery, _temp_dir) = test_gallery();
        let root = gallery.settings().saved_root.clone();
        let t1 = "20240101000000000001_cat.png";
        let t2 = "20240101000000000002_Dog.png";
        let t3 = "20240102000000000000_ant.png";
        for name in [t2, t3, t1] {
            write(root.join(name));
        }

        let page = gallery.list_saved(1).unwrap();
        assert_eq!(item_names(&page), vec![t3, t2, t1]);
    }

    #[test]
    fn test_list_paginates_by_ten() {
        let (gallery, _temp_dir) = test_gallery();
        let root = gallery.settings().source_root.clone();
        for i in 0..23 {
            write(root.join(format!("page{i:02}.png")));
        }

        let first = gallery.list_source(1).unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items[0].as_str(), "page00.png");

        let third = gallery.list_source(3).unwrap();
        assert_eq!(item_names(&third), vec!["page20.png", "page21.png", "page22.png"]);

        let clamped = gallery.list_source(-5).unwrap();
        assert_eq!(clamped, first);

        let beyond = gallery.list_source(9).unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_pages, 3);
    }

    #[test]
    fn test_list_missing_root_is_storage_unavailable() {
        let (gallery, _temp_dir) = test_gallery();
        fs::remove_dir_all(&gallery.settings().saved_root).unwrap();

        let result = gallery.list_saved(1);
        assert!(matches!(
            result,
            Err(GalleryError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_upload_then_listed() {
        let (gallery, _temp_dir) = test_gallery();

        let stored = gallery
            .accept_upload(Some(IncomingFile::new("cat.png", Cursor::new(b"x".to_vec()))))
            .unwrap();

        let page = gallery.list_saved(1).unwrap();
        assert_eq!(item_names(&page), vec![stored.stored_name.as_str()]);
    }

    #[test]
    fn test_upload_temp_files_not_listed() {
        let (gallery, _temp_dir) = test_gallery();
        write(gallery.settings().saved_root.join(".upload-abc123.part"));

        let page = gallery.list_saved(1).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_resolve_servable() {
        let (gallery, _temp_dir) = test_gallery();
        let root = gallery.settings().source_root.clone();
        write(root.join("animals/cat.png"));

        let resolved = gallery
            .resolve_servable(GalleryRoot::Source, "animals/cat.png")
            .unwrap();
        assert!(resolved.ends_with("animals/cat.png"));

        let resolved = gallery
            .resolve_servable(GalleryRoot::Source, "./animals/cat.png")
            .unwrap();
        assert!(resolved.ends_with("animals/cat.png"));
    }

    #[test]
    fn test_resolve_servable_rejects_escapes() {
        let (gallery, temp_dir) = test_gallery();
        write(temp_dir.path().join("outside.png"));
        write(gallery.settings().source_root.join("inside.png"));

        for bad in [
            "../outside.png",
            "animals/../../outside.png",
            "/etc/passwd.png",
            "",
            "inside.png\0",
            "..\\outside.png",
            "inside.txt",
            "missing.png",
            ".",
        ] {
            let result = gallery.resolve_servable(GalleryRoot::Source, bad);
            assert!(
                matches!(result, Err(GalleryError::NotFound(_))),
                "{bad:?} resolved to {result:?}"
            );
        }
    }

    #[test]
    fn test_resolve_servable_roots_are_separate() {
        let (gallery, _temp_dir) = test_gallery();
        write(gallery.settings().saved_root.join("mine.png"));

        assert!(gallery.resolve_servable(GalleryRoot::Saved, "mine.png").is_ok());
        assert!(matches!(
            gallery.resolve_servable(GalleryRoot::Source, "mine.png"),
            Err(GalleryError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_servable_rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let (gallery, temp_dir) = test_gallery();
        write(temp_dir.path().join("secret.png"));
        symlink(
            temp_dir.path().join("secret.png"),
            gallery.settings().source_root.join("link.png"),
        )
        .unwrap();

        assert!(matches!(
            gallery.resolve_servable(GalleryRoot::Source, "link.png"),
            Err(GalleryError::NotFound(_))
        ));
    }

    #[test]
    fn test_sort_refs_descending() {
        let mut items: Vec<ImageRef> = ["b.png", "A.png", "c.png"]
            .into_iter()
            .map(|s| ImageRef::new(s.to_string()))
            .collect();
        sort_refs(&mut items, SortOrder::Descending);
        let names: Vec<&str> = items.iter().map(ImageRef::as_str).collect();
        assert_eq!(names, vec!["c.png", "b.png", "A.png"]);
    }
}
