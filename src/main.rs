//! cnvs-preview: cover-art preview server.
//!
//! Reads its configuration from flags or the environment, then serves the
//! preview routes until Ctrl-C.

use anyhow::{Context, Result};

use cnvs_preview::cli::Cli;
use cnvs_preview::config::ServerConfig;
use cnvs_preview::http::run_server;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();

    // Missing backend settings are fatal before anything binds.
    let config = ServerConfig::from_cli(&cli)?;
    log::info!("starting cnvs-preview {}", env!("CARGO_PKG_VERSION"));
    log::debug!("config: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run_server(config))
}

/// Logs at `info` unless `RUST_LOG` says otherwise.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
