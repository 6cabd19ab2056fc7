//! Canvas rendering.
//!
//! - [`template`]: turns a [`TrackPreview`](crate::types::TrackPreview) into a render request
//! - [`client`]: submits render requests to the canvas backend

pub mod client;
pub mod template;

pub use client::{CanvasClient, RenderBackend};
pub use template::{quote_literal, PreviewTemplate, DEFAULT_ARTIST_FALLBACK};
