//! HTTP boundary for the gallery.
//!
//! Routes:
//! - `GET /` - full source listing plus a page of saved images
//! - `GET /source-images?page=N` - a page of source images
//! - `GET /saved-images?page=N` - a page of saved images, newest first
//! - `GET /images/{*path}` and `GET /saved/{*path}` - image bytes
//! - `POST /upload-image` - multipart upload, field `image`

pub mod error;
pub mod handlers;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use gallery::Gallery;
use tokio::net::TcpListener;

pub use error::ApiError;

/// Room left in a request body for multipart framing and other fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gallery: Gallery,
}

/// Build the application router.
pub fn router(gallery: Gallery) -> Router {
    let body_limit = usize::try_from(gallery.settings().max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::index))
        .route("/source-images", get(handlers::source_images))
        .route("/saved-images", get(handlers::saved_images))
        .route("/images/{*path}", get(handlers::serve_source_image))
        .route("/saved/{*path}", get(handlers::serve_saved_image))
        .route("/upload-image", post(handlers::upload_image))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(AppState { gallery })
}

/// Serve the gallery on `addr` until Ctrl-C.
pub async fn serve(gallery: Gallery, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let local = listener.local_addr().unwrap_or(addr);
    tracing::info!("Gallery listening on http://{}", local);

    axum::serve(listener, router(gallery))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Gallery stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
