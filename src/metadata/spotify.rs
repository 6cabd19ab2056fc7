//! Metadata resolver backed by the Spotify embed page.
//!
//! The embed page for a track ships its full state as a JSON document in a
//! `__NEXT_DATA__` script tag. Only the fields needed for a preview card are
//! read; everything else is ignored so upstream additions do not break us.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ErrorCode, PreviewError, Result};
use crate::types::{Artist, CoverArt, TrackPreview};

use super::MetadataResolver;

/// Default location of the per-track embed pages.
pub const DEFAULT_EMBED_BASE_URL: &str = "https://open.spotify.com/embed/track";

/// Color used when the page carries no accent color.
const DEFAULT_BACKGROUND_COLOR: &str = "#121212";

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; cnvs-preview/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Resolves tracks by scraping `<base_url>/<track_id>`.
#[derive(Debug, Clone)]
pub struct SpotifyEmbedResolver {
    client: reqwest::Client,
    base_url: String,
}

impl SpotifyEmbedResolver {
    /// Creates a resolver with its own HTTP client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                PreviewError::with_source(
                    ErrorCode::InvalidConfig,
                    "Failed to create metadata HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, track_id: &str) -> String {
        format!("{}/{}", self.base_url, track_id)
    }
}

#[async_trait]
impl MetadataResolver for SpotifyEmbedResolver {
    async fn resolve(&self, track_id: &str) -> Result<TrackPreview> {
        if !is_valid_track_id(track_id) {
            return Err(PreviewError::metadata_unavailable(
                track_id,
                "track IDs are ASCII alphanumeric",
            ));
        }

        let unavailable = |e: reqwest::Error| {
            PreviewError::with_source(
                ErrorCode::MetadataUnavailable,
                format!("Failed to fetch embed page for {}", track_id),
                e,
            )
        };

        let response = self
            .client
            .get(self.page_url(track_id))
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(PreviewError::metadata_unavailable(
                track_id,
                format!("embed page returned {}", response.status()),
            ));
        }

        let html = response.text().await.map_err(unavailable)?;
        parse_embed_page(track_id, &html)
    }
}

/// Returns true for IDs that are safe to splice into the embed URL.
pub fn is_valid_track_id(track_id: &str) -> bool {
    !track_id.is_empty() && track_id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Extracts a [`TrackPreview`] from an embed page.
pub fn parse_embed_page(track_id: &str, html: &str) -> Result<TrackPreview> {
    let json = extract_next_data(html)
        .ok_or_else(|| PreviewError::metadata_unavailable(track_id, "no __NEXT_DATA__ script"))?;

    let next: NextData = serde_json::from_str(json).map_err(|e| {
        PreviewError::with_source(
            ErrorCode::MetadataUnavailable,
            format!("Malformed embed data for {}", track_id),
            e,
        )
    })?;

    let entity = next
        .props
        .page_props
        .state
        .map(|s| s.data.entity)
        .ok_or_else(|| PreviewError::metadata_unavailable(track_id, "embed page has no entity"))?;

    entity.into_preview(track_id)
}

fn extract_next_data(html: &str) -> Option<&str> {
    let marker = html.find("id=\"__NEXT_DATA__\"")?;
    let open_end = marker + html[marker..].find('>')? + 1;
    let close = open_end + html[open_end..].find("</script>")?;
    Some(html[open_end..close].trim())
}

#[derive(Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Deserialize)]
struct PageProps {
    #[serde(default)]
    state: Option<PageState>,
}

#[derive(Deserialize)]
struct PageState {
    data: PageData,
}

#[derive(Deserialize)]
struct PageData {
    entity: Entity,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artists: Vec<EntityArtist>,
    #[serde(default)]
    audio_preview: Option<AudioPreview>,
    #[serde(default)]
    visual_identity: Option<VisualIdentity>,
    #[serde(default)]
    cover_art: Option<EntityCoverArt>,
}

#[derive(Deserialize)]
struct EntityArtist {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct AudioPreview {
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisualIdentity {
    #[serde(default)]
    background_base: Option<Rgb>,
    #[serde(default)]
    image: Vec<VisualImage>,
}

#[derive(Deserialize)]
struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisualImage {
    url: String,
    #[serde(default)]
    max_width: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityCoverArt {
    #[serde(default)]
    extracted_colors: Option<ExtractedColors>,
    #[serde(default)]
    sources: Vec<ImageSource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractedColors {
    #[serde(default)]
    color_dark: Option<HexColor>,
}

#[derive(Deserialize)]
struct HexColor {
    hex: String,
}

#[derive(Deserialize)]
struct ImageSource {
    url: String,
    #[serde(default)]
    width: u32,
}

impl Entity {
    fn into_preview(self, track_id: &str) -> Result<TrackPreview> {
        let track_name = if self.name.is_empty() { self.title } else { self.name };
        if track_name.is_empty() {
            return Err(PreviewError::metadata_unavailable(track_id, "track has no name"));
        }

        // (url, width) from whichever image list upstream filled in
        let mut images: Vec<(String, u32)> = match &self.cover_art {
            Some(art) if !art.sources.is_empty() => {
                art.sources.iter().map(|s| (s.url.clone(), s.width)).collect()
            }
            _ => self
                .visual_identity
                .iter()
                .flat_map(|v| v.image.iter())
                .map(|i| (i.url.clone(), i.max_width))
                .collect(),
        };
        images.sort_by_key(|(_, width)| *width);

        let cover_art = match (images.first(), images.last()) {
            (Some(small), Some(large)) => CoverArt {
                small: small.0.clone(),
                medium: images[images.len() / 2].0.clone(),
                large: large.0.clone(),
            },
            _ => {
                return Err(PreviewError::metadata_unavailable(track_id, "track has no cover art"))
            }
        };

        let background_color = self
            .visual_identity
            .as_ref()
            .and_then(|v| v.background_base.as_ref())
            .map(|c| format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue))
            .or_else(|| {
                self.cover_art
                    .as_ref()
                    .and_then(|a| a.extracted_colors.as_ref())
                    .and_then(|c| c.color_dark.as_ref())
                    .map(|c| c.hex.to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.to_string());

        Ok(TrackPreview {
            track_name,
            artists: self.artists.into_iter().map(|a| Artist::new(a.name)).collect(),
            cover_art,
            background_color,
            audio_url: self.audio_preview.map(|a| a.url).unwrap_or_default(),
        })
    }
}
