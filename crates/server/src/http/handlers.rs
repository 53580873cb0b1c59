//! Route handlers.
//!
//! Every call into the gallery core touches the filesystem synchronously, so
//! handlers hop onto the blocking pool before calling it.

use std::io::{self, Write};
use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gallery::{GalleryRoot, ImageRef, IncomingFile, Page};
use serde::{Deserialize, Serialize};
use tempfile::SpooledTempFile;
use tracing::{debug, warn};

use super::error::ApiError;
use super::AppState;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "image";

/// Upload bytes kept in memory before spooling to a temporary file.
pub const SPOOL_THRESHOLD: usize = 1024 * 1024;

/// `?page=` query. Missing or non-numeric values mean page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Index payload: the full source listing plus one page of saved images.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub images: Vec<ImageRef>,
    pub saved_images: Vec<ImageRef>,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct SourceImagesResponse {
    pub source_images: Vec<ImageRef>,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct SavedImagesResponse {
    pub saved_images: Vec<ImageRef>,
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub filename: String,
}

/// Run a gallery call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> gallery::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!(error = %e, "Blocking task failed");
            Err(ApiError::internal())
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<IndexResponse>, ApiError> {
    let gallery = state.gallery.clone();
    let page = query.page();

    let (images, saved): (Vec<ImageRef>, Page<ImageRef>) = blocking(move || {
        let images = gallery.sorted(GalleryRoot::Source)?;
        let saved = gallery.list_saved(page)?;
        Ok((images, saved))
    })
    .await?;

    Ok(Json(IndexResponse {
        images,
        saved_images: saved.items,
        page: saved.page,
        total_pages: saved.total_pages,
    }))
}

pub async fn source_images(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SourceImagesResponse>, ApiError> {
    let gallery = state.gallery.clone();
    let page = query.page();

    let listing = blocking(move || gallery.list_source(page)).await?;

    Ok(Json(SourceImagesResponse {
        source_images: listing.items,
        page: listing.page,
        total_pages: listing.total_pages,
    }))
}

pub async fn saved_images(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SavedImagesResponse>, ApiError> {
    let gallery = state.gallery.clone();
    let page = query.page();

    let listing = blocking(move || gallery.list_saved(page)).await?;

    Ok(Json(SavedImagesResponse {
        saved_images: listing.items,
        page: listing.page,
        total_pages: listing.total_pages,
    }))
}

pub async fn serve_source_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    serve_image(state, GalleryRoot::Source, path)
        .await
        .map_err(|e| e.with_message("Image not found."))
}

pub async fn serve_saved_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    serve_image(state, GalleryRoot::Saved, path)
        .await
        .map_err(|e| e.with_message("Saved image not found."))
}

async fn serve_image(state: AppState, root: GalleryRoot, path: String) -> Result<Response, ApiError> {
    let gallery = state.gallery.clone();
    let requested = path.clone();

    let resolved = blocking(move || gallery.resolve_servable(root, &requested)).await?;

    let bytes = tokio::fs::read(&resolved).await.map_err(|e| {
        debug!(path = %path, error = %e, "Resolved image vanished before read");
        ApiError::from(gallery::GalleryError::NotFound(path.clone()))
    })?;

    Ok(([(header::CONTENT_TYPE, content_type(&resolved))], bytes).into_response())
}

pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let limit = state.gallery.settings().max_upload_size;
    let mut incoming = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let declared_name = field.file_name().unwrap_or_default().to_string();

        // Keep at most limit + 1 bytes; the core decides whether that is too much.
        let cap = limit.saturating_add(1);
        let mut spool = SpooledTempFile::new(SPOOL_THRESHOLD);
        let mut received: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(ApiError::from_multipart)? {
            let room = cap.saturating_sub(received);
            if room == 0 {
                break;
            }
            let take = usize::try_from(room).unwrap_or(usize::MAX).min(chunk.len());
            spool.write_all(&chunk[..take]).map_err(spool_failed)?;
            received += take as u64;
        }

        incoming = Some(IncomingFile::new(declared_name, spool));
        break;
    }

    if incoming.is_none() {
        warn!("No image part in the request.");
        return Err(ApiError::from(gallery::GalleryError::MissingFile)
            .with_message("No image part in the request."));
    }

    let gallery = state.gallery.clone();
    let stored = blocking(move || gallery.accept_upload(incoming)).await?;

    Ok(Json(UploadResponse {
        status: "success",
        message: "Image saved successfully.",
        filename: stored.stored_name,
    }))
}

fn spool_failed(err: io::Error) -> ApiError {
    tracing::error!(error = %err, "Failed to buffer upload");
    ApiError::internal()
}

pub async fn not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Content type for an image path, from its extension.
pub fn content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
