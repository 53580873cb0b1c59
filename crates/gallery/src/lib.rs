//! # Coloring Gallery Core
//!
//! This crate provides the file-backed gallery and upload subsystem of the
//! Coloring Gallery service.
//!
//! ## Overview
//!
//! The filesystem is the only source of truth. Every listing is re-derived
//! from disk, and every upload is a new file under a collision-resistant
//! name. The crate provides:
//!
//! - **Filename Sanitizer**: strips unsafe path elements and enforces the
//!   extension allow-list
//! - **Storage Scanner**: recursive, symlink-aware directory walk
//! - **Pager**: pure sort-then-slice pagination
//! - **Gallery Service**: source and saved listings plus safe path resolution
//! - **Upload Handler**: validation and atomic persistence of uploads
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │  Upload Handler  │────▶│  Sanitizer  │────▶│   saved root     │
//! └──────────────────┘     └─────────────┘     └────────┬─────────┘
//!                                                       │
//! ┌──────────────────┐     ┌─────────────┐     ┌────────▼─────────┐
//! │ Gallery Service  │────▶│    Pager    │◀────│     Scanner      │
//! └──────────────────┘     └─────────────┘     └──────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gallery::{Gallery, GallerySettings};
//!
//! let settings = GallerySettings::new("static/images", "static/saved");
//! let gallery = Gallery::open(settings).unwrap();
//!
//! let page = gallery.list_saved(1).unwrap();
//! for image in &page.items {
//!     println!("{image}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`settings`]: Immutable configuration shared by every component
//! - [`sanitize`]: Filename sanitizing and stored-name generation
//! - [`scanner`]: Recursive image discovery
//! - [`pager`]: Pagination
//! - [`service`]: Listing and path resolution
//! - [`upload`]: Upload validation and persistence
//! - [`error`]: Error types

pub mod error;
pub mod image_ref;
pub mod pager;
pub mod sanitize;
pub mod scanner;
pub mod service;
pub mod settings;
pub mod upload;

pub use error::{ErrorKind, GalleryError, Result};
pub use image_ref::ImageRef;
pub use pager::{paginate, Page};
pub use sanitize::{sanitize, stored_name};
pub use scanner::scan;
pub use service::Gallery;
pub use settings::{
    AllowedExtensions, GalleryRoot, GallerySettings, DEFAULT_ALLOWED_EXTENSIONS,
    DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PAGE_SIZE,
};
pub use upload::{IncomingFile, StoredUpload, UploadHandler};
