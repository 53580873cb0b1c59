//! # Coloring Gallery Server
//!
//! This crate provides the service around the gallery core: configuration,
//! the HTTP boundary, and the offline test page generator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP Router (axum)                 │
//! ├─────────────────────────────────────────────────────┤
//! │   listings  │  image serving  │  multipart upload   │
//! ├─────────────────────────────────────────────────────┤
//! │            gallery::Gallery (blocking pool)         │
//! ├─────────────────────────────────────────────────────┤
//! │         source root          │      saved root      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gallery::Gallery;
//! use server::config::{default_config_path, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(default_config_path())?;
//!     config.validate()?;
//!
//!     let gallery = Gallery::open(config.to_settings()?)?;
//!     server::http::serve(gallery, config.bind_addr()?).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`http`]: Router, handlers and failure responses
//! - [`testimage`]: Procedural coloring page generation

pub mod config;
pub mod http;
pub mod testimage;

// Re-export the core for convenience
pub use gallery;

pub use config::{Config, ConfigError, EnvOverride};
pub use http::{router, serve, ApiError, AppState};
