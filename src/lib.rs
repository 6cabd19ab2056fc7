//! cnvs-preview: renders track preview cards through a canvas backend.
//!
//! Requests for a track's card go through a single-flight render cache:
//! the first request renders, concurrent requests for the same track wait
//! for that render, and later requests are served from memory until the
//! periodic sweep clears the cache.
//!
//! # Modules
//!
//! - [`types`]: Track metadata and the render request payload
//! - [`metadata`]: Track metadata resolution (MetadataResolver)
//! - [`render`]: Card template and the canvas backend client
//! - [`cache`]: Render store and the dedup coordinator
//! - [`http`]: axum routes and server loop
//! - [`config`]: Runtime configuration (ServerConfig)
//! - [`error`]: Error types and codes (PreviewError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cnvs_preview::{
//!     cache::{RenderCoordinator, DEFAULT_RENDER_TIMEOUT},
//!     metadata::SpotifyEmbedResolver,
//!     render::{CanvasClient, PreviewTemplate},
//! };
//!
//! let resolver = Arc::new(SpotifyEmbedResolver::new(
//!     "https://open.spotify.com/embed/track",
//!     DEFAULT_RENDER_TIMEOUT,
//! )?);
//! let backend = Arc::new(CanvasClient::new(
//!     "https://canvas.example",
//!     "secret",
//!     DEFAULT_RENDER_TIMEOUT,
//! )?);
//! let renders = RenderCoordinator::new(
//!     resolver,
//!     backend,
//!     PreviewTemplate::embedded("unknown"),
//!     DEFAULT_RENDER_TIMEOUT,
//! );
//!
//! let png = renders.get("4uLU6hMCjMI75M1A2tKUQC").await?;
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod metadata;
pub mod render;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use cache::RenderCoordinator;
pub use config::ServerConfig;
pub use error::{ErrorCode, PreviewError, Result};
pub use types::{Artist, CoverArt, RenderRequest, TrackPreview};
