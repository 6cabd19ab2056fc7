//! TrackPreview type describing a resolved track.
//!
//! A TrackPreview is what the metadata resolver hands back for a track ID.
//! It is also served verbatim as JSON from the `/{trackID}/info` route.

use serde::{Deserialize, Serialize};

/// A single credited artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Display name. May be empty when the upstream record is incomplete.
    pub name: String,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Cover art URLs in three sizes.
///
/// Any of these may equal the others when upstream only offers one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverArt {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// Metadata for one track, as resolved from upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPreview {
    /// Track title.
    pub track_name: String,

    /// Credited artists in upstream order.
    pub artists: Vec<Artist>,

    /// Artwork URLs.
    pub cover_art: CoverArt,

    /// Accent color, passed to the render template verbatim.
    /// Example: "#1e3264"
    pub background_color: String,

    /// URL of a short audio preview. Empty when upstream has none.
    pub audio_url: String,
}

impl TrackPreview {
    /// Joins the non-empty artist names with ", ".
    ///
    /// Returns `fallback` when no artist has a name.
    pub fn artist_line(&self, fallback: &str) -> String {
        join_artist_names(&self.artists, fallback)
    }
}

/// Joins non-empty artist names with ", ", or returns `fallback` if none remain.
pub fn join_artist_names(artists: &[Artist], fallback: &str) -> String {
    let names: Vec<&str> = artists
        .iter()
        .map(|a| a.name.as_str())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        fallback.to_string()
    } else {
        names.join(", ")
    }
}
