//! Builds canvas render requests from track previews.
//!
//! The card script is embedded at compile time and can be replaced from a
//! file at startup. Asset order is fixed so payloads are reproducible.

use std::path::Path;

use crate::error::{ErrorCode, PreviewError, Result};
use crate::types::{Asset, CanvasSize, RenderRequest, ScriptFile, TrackPreview};

/// Name under which the script is submitted.
pub const SCRIPT_NAME: &str = "preview.ql";

/// Embedded card script.
pub const EMBEDDED_SCRIPT: &str = include_str!("../../assets/preview.ql");

/// SVG path data for the logo drawn in the card corner.
const LOGO_PATH: &str = include_str!("../../assets/spotify_logo.txt");

/// Default placeholder when a track lists no named artist.
pub const DEFAULT_ARTIST_FALLBACK: &str = "unknown";

/// A card template: canvas size, script, and the artist placeholder.
#[derive(Debug, Clone)]
pub struct PreviewTemplate {
    size: CanvasSize,
    script: ScriptFile,
    artist_fallback: String,
}

impl PreviewTemplate {
    /// Uses the embedded script on the default 512x670 canvas.
    pub fn embedded(artist_fallback: impl Into<String>) -> Self {
        Self::with_script(EMBEDDED_SCRIPT.to_string(), artist_fallback)
    }

    /// Uses the given script text on the default canvas.
    pub fn with_script(code: String, artist_fallback: impl Into<String>) -> Self {
        Self {
            size: CanvasSize::default(),
            script: ScriptFile {
                name: SCRIPT_NAME.to_string(),
                code,
            },
            artist_fallback: artist_fallback.into(),
        }
    }

    /// Loads the script from disk.
    pub fn from_file(path: &Path, artist_fallback: impl Into<String>) -> Result<Self> {
        let code = std::fs::read_to_string(path).map_err(|e| {
            PreviewError::with_source(
                ErrorCode::InvalidConfig,
                format!("Failed to read template {}", path.display()),
                e,
            )
        })?;
        Ok(Self::with_script(code, artist_fallback))
    }

    pub fn artist_fallback(&self) -> &str {
        &self.artist_fallback
    }

    /// Assembles the render request for one track.
    ///
    /// Assets, in order: `art`, `track_name`, `artist_name`, `color`,
    /// `spotify_logo`. The color is passed verbatim, text values are quoted.
    pub fn build(&self, preview: &TrackPreview) -> RenderRequest {
        let assets = vec![
            Asset::image("art", preview.cover_art.small.as_str()),
            Asset::literal("track_name", quote_literal(&preview.track_name)),
            Asset::literal(
                "artist_name",
                quote_literal(&preview.artist_line(&self.artist_fallback)),
            ),
            Asset::literal("color", preview.background_color.as_str()),
            Asset::literal("spotify_logo", quote_literal(LOGO_PATH.trim())),
        ];

        RenderRequest::new(self.size, self.script.clone(), assets)
    }
}

/// Wraps a value in double quotes for use as a script string literal.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
