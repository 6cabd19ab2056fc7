//! Command-line interface.
//!
//! Every flag can also be supplied through the environment, which is how the
//! server is normally configured in a container.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::metadata::DEFAULT_EMBED_BASE_URL;

/// cnvs-preview: renders track cover cards through a canvas backend
#[derive(Parser, Debug)]
#[command(name = "cnvs-preview")]
#[command(about = "Serves rendered track preview cards over HTTP")]
#[command(version)]
pub struct Cli {
    /// Base URL of the canvas render backend (required)
    #[arg(long, env = "CANVAS_BASE_URL")]
    pub canvas_base_url: Option<String>,

    /// Shared secret appended to the backend run path (required)
    #[arg(long, env = "CANVAS_SECRET", hide_env_values = true)]
    pub canvas_secret: Option<String>,

    /// Address to listen on
    #[arg(short, long, env = "CNVS_LISTEN", default_value = "0.0.0.0:80")]
    pub listen: SocketAddr,

    /// Seconds between full cache sweeps
    #[arg(
        long,
        env = "CNVS_SWEEP_INTERVAL_SECS",
        default_value = "3600",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,

    /// Seconds a single render may take before it is abandoned
    #[arg(
        long,
        env = "CNVS_RENDER_TIMEOUT_SECS",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub render_timeout_secs: u64,

    /// Artist text used when a track lists no named artist
    #[arg(long, env = "CNVS_ARTIST_FALLBACK", default_value = "unknown")]
    pub artist_fallback: String,

    /// Card script to use instead of the embedded one
    #[arg(long, env = "CNVS_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Base URL of the per-track embed pages used for metadata
    #[arg(long, env = "CNVS_EMBED_BASE_URL", default_value = DEFAULT_EMBED_BASE_URL)]
    pub embed_base_url: String,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
