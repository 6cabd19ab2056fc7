//! Error types for cnvs-preview.
//!
//! Every failure the render pipeline can produce carries an [`ErrorCode`] so
//! that logs can tell a missing track apart from a broken canvas backend,
//! even though all of them collapse to a generic 500 at the HTTP boundary.

use std::fmt;
use std::sync::Arc;

/// Error codes for failures in the preview pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The metadata resolver failed or does not know the track.
    /// Trigger: unknown track ID, malformed embed page, resolver transport error.
    MetadataUnavailable,

    /// The canvas backend answered with a non-success status, or the
    /// transfer failed after the connection was established.
    RenderBackendError,

    /// The canvas backend could not be reached or did not answer in time.
    /// Trigger: connection refused, DNS failure, render timeout.
    RenderBackendUnreachable,

    /// The render payload could not be encoded.
    SerializationError,

    /// Startup configuration is missing or invalid.
    InvalidConfig,

    /// The render task died without producing a result.
    Internal,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MetadataUnavailable => "METADATA_UNAVAILABLE",
            ErrorCode::RenderBackendError => "RENDER_BACKEND_ERROR",
            ErrorCode::RenderBackendUnreachable => "RENDER_BACKEND_UNREACHABLE",
            ErrorCode::SerializationError => "SERIALIZATION_ERROR",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::MetadataUnavailable => {
                "Check that the track ID exists and that the embed page is reachable"
            }
            ErrorCode::RenderBackendError => {
                "Inspect the canvas backend logs; the template or an asset URL may be rejected"
            }
            ErrorCode::RenderBackendUnreachable => {
                "Verify CANVAS_BASE_URL and network access, or raise the render timeout"
            }
            ErrorCode::SerializationError => "Check the render template and asset values",
            ErrorCode::InvalidConfig => {
                "Set CANVAS_BASE_URL and CANVAS_SECRET, and check the remaining flags"
            }
            ErrorCode::Internal => "Retry the request; report the issue if it persists",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for preview operations.
///
/// Cloneable so a single failed render can be handed to every request that
/// was waiting on it.
#[derive(Debug, Clone)]
pub struct PreviewError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// HTTP status returned by the canvas backend, if any.
    pub status: Option<u16>,
    /// Optional underlying cause of the error.
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl PreviewError {
    /// Creates a new PreviewError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates a new PreviewError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a METADATA_UNAVAILABLE error.
    pub fn metadata_unavailable(track_id: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MetadataUnavailable,
            format!("No metadata for track {}: {}", track_id, reason.into()),
        )
    }

    /// Creates a RENDER_BACKEND_ERROR for a non-success status.
    pub fn backend_status(status: u16, body_excerpt: &str) -> Self {
        let message = if body_excerpt.is_empty() {
            format!("Canvas backend returned {}", status)
        } else {
            format!("Canvas backend returned {}: {}", status, body_excerpt)
        };
        Self {
            status: Some(status),
            ..Self::new(ErrorCode::RenderBackendError, message)
        }
    }

    /// Creates a RENDER_BACKEND_UNREACHABLE error for an expired render.
    pub fn render_timeout(after: std::time::Duration) -> Self {
        Self::new(
            ErrorCode::RenderBackendUnreachable,
            format!("Render did not finish within {:.1}s", after.as_secs_f32()),
        )
    }

    /// Creates an INVALID_CONFIG error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, reason.into())
    }

    /// Creates an INTERNAL error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, reason.into())
    }
}

impl From<reqwest::Error> for PreviewError {
    /// Classifies a canvas transport failure.
    ///
    /// Connect and timeout failures mean the backend never produced an
    /// answer; everything else happened on an open connection.
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_connect() || err.is_timeout() {
            ErrorCode::RenderBackendUnreachable
        } else {
            ErrorCode::RenderBackendError
        };
        let message = format!("Canvas request failed: {}", err);
        Self::with_source(code, message, err)
    }
}

impl From<serde_json::Error> for PreviewError {
    fn from(err: serde_json::Error) -> Self {
        let message = format!("Failed to encode render payload: {}", err);
        Self::with_source(ErrorCode::SerializationError, message, err)
    }
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for PreviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using PreviewError.
pub type Result<T> = std::result::Result<T, PreviewError>;
