//! HTTP server setup.
//!
//! Wires the handlers into an axum `Router`, starts the cache sweeper and
//! serves until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::cache::RenderCoordinator;
use crate::config::ServerConfig;
use crate::metadata::{MetadataResolver, SpotifyEmbedResolver};
use crate::render::CanvasClient;

use super::handlers::{track_audio, track_image, track_info};

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Render cache; the only way handlers obtain images.
    pub renders: RenderCoordinator,
    /// Metadata lookups for the info and audio routes.
    pub resolver: Arc<dyn MetadataResolver>,
}

impl AppState {
    pub fn new(renders: RenderCoordinator, resolver: Arc<dyn MetadataResolver>) -> Self {
        Self { renders, resolver }
    }

    /// Builds the production collaborators described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let resolver: Arc<dyn MetadataResolver> = Arc::new(SpotifyEmbedResolver::new(
            config.embed_base_url.as_str(),
            config.render_timeout,
        )?);
        let backend = Arc::new(CanvasClient::new(
            &config.canvas_base_url,
            &config.canvas_secret,
            config.render_timeout,
        )?);
        let template = config.template()?;

        let renders = RenderCoordinator::new(
            Arc::clone(&resolver),
            backend,
            template,
            config.render_timeout,
        );

        Ok(Self::new(renders, resolver))
    }
}

/// Builds the router for `/{trackID}`, `/{trackID}/info` and `/{trackID}/audio`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/{track_id}", get(track_image))
        .route("/{track_id}/info", get(track_info))
        .route("/{track_id}/audio", get(track_audio))
        .layer(cors)
        .with_state(state)
}

/// Runs the HTTP server until Ctrl-C.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let sweeper = state.renders.spawn_sweeper(config.sweep_interval);

    log::info!(
        "cache sweep every {}s, render timeout {}s",
        config.sweep_interval.as_secs(),
        config.render_timeout.as_secs()
    );

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    log::info!("listening on {}", config.listen);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    sweeper.abort();
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("shutdown requested");
}
