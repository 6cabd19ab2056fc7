//! HTTP handlers for the preview routes.
//!
//! - `track_image` serves the rendered card for `/{trackID}`
//! - `track_info` serves resolved metadata for `/{trackID}/info`
//! - `track_audio` redirects `/{trackID}/audio` to the audio preview
//!
//! CORS headers are added by the router's `CorsLayer`, not here. Every
//! internal failure becomes a plain 500; the cause only goes to the log.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use sha2::{Digest, Sha256};

use super::server::AppState;

/// Images never change for a given track, so clients may keep them for a year.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Serves the rendered card for a track.
pub async fn track_image(
    Path(track_id): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    log::debug!("handle image request: {}", track_id);

    match state.renders.get(&track_id).await {
        Ok(image) => image_response(image, &headers),
        Err(err) => {
            log::warn!(
                "send 500 for image request {}: [{}] {}",
                track_id, err.code, err.message
            );
            error_500("Failed to generate track")
        }
    }
}

/// Serves the resolved metadata for a track as JSON.
pub async fn track_info(Path(track_id): Path<String>, State(state): State<AppState>) -> Response {
    match state.resolver.resolve(&track_id).await {
        Ok(preview) => Json(preview).into_response(),
        Err(err) => {
            log::warn!(
                "send 500 for info request {}: [{}] {}",
                track_id, err.code, err.message
            );
            error_500("Failed to get preview")
        }
    }
}

/// Redirects to the track's audio preview.
pub async fn track_audio(Path(track_id): Path<String>, State(state): State<AppState>) -> Response {
    match state.resolver.resolve(&track_id).await {
        Ok(preview) if preview.audio_url.is_empty() => {
            log::debug!("no audio preview for {}", track_id);
            (StatusCode::NOT_FOUND, "No audio preview").into_response()
        }
        Ok(preview) => (StatusCode::FOUND, [(header::LOCATION, preview.audio_url)]).into_response(),
        Err(err) => {
            log::warn!(
                "send 500 for audio request {}: [{}] {}",
                track_id, err.code, err.message
            );
            error_500("Failed to get preview")
        }
    }
}

// --- small helpers -----------------------------------------------------------

fn image_response(image: Bytes, request_headers: &HeaderMap) -> Response {
    let etag = etag_for(&image);

    if if_none_match(request_headers, &etag) {
        return (
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, etag),
                (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
            ],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET".to_string()),
            (header::ETAG, etag),
        ],
        image,
    )
        .into_response()
}

/// Strong ETag: first 8 bytes of the SHA-256 of the image, hex encoded.
fn etag_for(image: &[u8]) -> String {
    let digest = Sha256::digest(image);
    format!("\"{}\"", hex::encode(&digest[..8]))
}

fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|tag| tag == "*" || tag == etag || tag.strip_prefix("W/") == Some(etag))
}

fn error_500(message: &'static str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}
