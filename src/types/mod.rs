//! Core types for cnvs-preview.
//!
//! - [`TrackPreview`]: Resolved metadata for a track
//! - [`RenderRequest`]: The job submitted to the canvas backend

mod payload;
mod preview;

pub use payload::{Asset, CanvasSize, RenderRequest, ScriptFile};
pub use preview::{join_artist_names, Artist, CoverArt, TrackPreview};
