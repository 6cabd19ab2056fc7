//! HTTP client for the canvas render backend.
//!
//! A render is a single `POST <base>/run/<secret>` carrying the JSON payload;
//! the response body is the encoded image. No retries happen here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::error::{ErrorCode, PreviewError, Result};
use crate::types::RenderRequest;

/// Maximum number of characters of an error body kept in the error message.
const BODY_EXCERPT_CHARS: usize = 200;

/// Produces image bytes for a render request.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<Bytes>;
}

/// Canvas backend reached over HTTP.
pub struct CanvasClient {
    client: reqwest::Client,
    base_url: String,
    run_url: String,
}

impl CanvasClient {
    /// Creates a client posting to `<base_url>/run/<secret>`.
    ///
    /// `timeout` bounds the whole request, including reading the image.
    pub fn new(base_url: &str, secret: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PreviewError::with_source(
                    ErrorCode::InvalidConfig,
                    "Failed to create canvas HTTP client",
                    e,
                )
            })?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let run_url = format!("{}/run/{}", base_url, secret);

        Ok(Self {
            client,
            base_url,
            run_url,
        })
    }
}

// The run URL embeds the shared secret, keep it out of logs.
impl fmt::Debug for CanvasClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RenderBackend for CanvasClient {
    async fn render(&self, request: &RenderRequest) -> Result<Bytes> {
        let body = serde_json::to_vec(request)?;

        log::debug!(
            "posting render job to {} ({} assets, {} bytes)",
            self.base_url,
            request.assets.len(),
            body.len()
        );

        let response = self
            .client
            .post(&self.run_url)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(PreviewError::backend_status(
                status.as_u16(),
                &body_excerpt(&text),
            ));
        }

        Ok(response.bytes().await?)
    }
}

fn body_excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT_CHARS).collect()
}
