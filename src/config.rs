//! Server configuration module.
//!
//! Contains the runtime configuration for cnvs-preview: where the canvas
//! backend lives, how long renders may take, and how often the cache is
//! cleared.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_RENDER_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
use crate::cli::Cli;
use crate::error::{PreviewError, Result};
use crate::metadata::DEFAULT_EMBED_BASE_URL;
use crate::render::{PreviewTemplate, DEFAULT_ARTIST_FALLBACK};

/// Runtime configuration for the server.
///
/// Built from command-line flags and their environment fallbacks at startup.
#[derive(Clone)]
pub struct ServerConfig {
    /// Base URL of the canvas render backend.
    pub canvas_base_url: String,

    /// Shared secret used as the last path segment of the run URL.
    pub canvas_secret: String,

    /// Address the HTTP server binds to.
    pub listen: SocketAddr,

    /// Time between full cache sweeps.
    pub sweep_interval: Duration,

    /// Upper bound for a single backend render.
    pub render_timeout: Duration,

    /// Artist text for tracks with no named artist.
    pub artist_fallback: String,

    /// Card script on disk. If None, the embedded script is used.
    pub template_path: Option<PathBuf>,

    /// Base URL of the embed pages the metadata resolver reads.
    pub embed_base_url: String,
}

impl ServerConfig {
    /// Creates a config for the given backend with default values elsewhere.
    pub fn new(canvas_base_url: impl Into<String>, canvas_secret: impl Into<String>) -> Self {
        Self {
            canvas_base_url: canvas_base_url.into(),
            canvas_secret: canvas_secret.into(),
            listen: SocketAddr::from(([0, 0, 0, 0], 80)),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            artist_fallback: DEFAULT_ARTIST_FALLBACK.to_string(),
            template_path: None,
            embed_base_url: DEFAULT_EMBED_BASE_URL.to_string(),
        }
    }

    /// Creates a ServerConfig from parsed command-line arguments.
    ///
    /// Fails when the backend URL or secret is absent, or when validation
    /// rejects a value.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let canvas_base_url = required(&cli.canvas_base_url, "CANVAS_BASE_URL")?;
        let canvas_secret = required(&cli.canvas_secret, "CANVAS_SECRET")?;

        let config = Self {
            listen: cli.listen,
            sweep_interval: Duration::from_secs(cli.sweep_interval_secs),
            render_timeout: Duration::from_secs(cli.render_timeout_secs),
            artist_fallback: cli.artist_fallback.clone(),
            template_path: cli.template.clone(),
            embed_base_url: cli.embed_base_url.clone(),
            ..Self::new(canvas_base_url, canvas_secret)
        };

        match config.validate() {
            Some(reason) => Err(PreviewError::invalid_config(reason)),
            None => Ok(config),
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        let url = &self.canvas_base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Some(format!(
                "CANVAS_BASE_URL must be an http(s) URL, got {:?}",
                self.canvas_base_url
            ));
        }

        if self.canvas_secret.contains('/') {
            return Some("CANVAS_SECRET must be a single path segment".to_string());
        }

        if self.sweep_interval.is_zero() {
            return Some("sweep interval must be > 0".to_string());
        }

        if self.render_timeout.is_zero() {
            return Some("render timeout must be > 0".to_string());
        }

        None
    }

    /// Loads the card template this config points at.
    pub fn template(&self) -> Result<PreviewTemplate> {
        match &self.template_path {
            Some(path) => PreviewTemplate::from_file(path, self.artist_fallback.clone()),
            None => Ok(PreviewTemplate::embedded(self.artist_fallback.clone())),
        }
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PreviewError::invalid_config(format!(
            "Environment variable {} is required",
            name
        ))),
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("canvas_base_url", &self.canvas_base_url)
            .field("canvas_secret", &"<redacted>")
            .field("listen", &self.listen)
            .field("sweep_interval", &self.sweep_interval)
            .field("render_timeout", &self.render_timeout)
            .field("artist_fallback", &self.artist_fallback)
            .field("template_path", &self.template_path)
            .field("embed_base_url", &self.embed_base_url)
            .finish()
    }
}
