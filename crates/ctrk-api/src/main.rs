//! # ctrk-api: Binary Entry Point
//!
//! Parses configuration, builds the state, serves until Ctrl-C or SIGTERM,
//! then writes snapshots if a data directory is configured.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ctrk_api::bootstrap::bootstrap;
use ctrk_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::parse();
    init_tracing(config.log_json);
    tracing::debug!(?config, "configuration loaded");

    let port = config.port;
    let data_dir = config.data_dir.clone();
    let state = bootstrap(config).context("bootstrap failed")?;
    let tracker = state.tracker.clone();

    let app = ctrk_api::app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "compliance tracker API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(dir) = data_dir {
        tracker
            .save_to(&dir)
            .with_context(|| format!("saving snapshots to {}", dir.display()))?;
    }
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
