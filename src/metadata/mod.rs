//! Metadata resolution for track IDs.
//!
//! The render pipeline only depends on [`MetadataResolver`]; the shipped
//! implementation reads the public Spotify embed page.

pub mod spotify;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::TrackPreview;

pub use spotify::{SpotifyEmbedResolver, DEFAULT_EMBED_BASE_URL};

/// Resolves a track ID into a [`TrackPreview`].
///
/// Implementations fail with `ErrorCode::MetadataUnavailable` for unknown
/// tracks or upstream trouble.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, track_id: &str) -> Result<TrackPreview>;
}
