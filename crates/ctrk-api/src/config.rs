//! # Server Configuration
//!
//! Command-line flags, each with an environment-variable fallback.

use std::path::PathBuf;

use clap::Parser;
use ctrk_state::StatusCoupling;
use ctrk_store::compliance::DEFAULT_UPCOMING_WINDOW_DAYS;

/// Compliance tracker HTTP API.
#[derive(Parser, Debug, Clone)]
#[command(name = "ctrk-api", version, about, long_about = None)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding the JSON snapshots. Loaded on start and written
    /// on shutdown. Without it, state lives in memory only.
    #[arg(long, env = "CTRK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Catalog YAML to load instead of the built-in one.
    #[arg(long, env = "CTRK_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Populate the demo entities if they are not already present.
    #[arg(long, env = "CTRK_SEED_DEMO")]
    pub seed_demo: bool,

    /// How status follows workflow: `independent` or `acknowledged-completes`.
    #[arg(long, env = "CTRK_STATUS_COUPLING", default_value = "independent")]
    pub status_coupling: StatusCoupling,

    /// Default look-ahead for the upcoming-deadlines query.
    #[arg(long, env = "CTRK_UPCOMING_WINDOW_DAYS", default_value_t = DEFAULT_UPCOMING_WINDOW_DAYS)]
    pub upcoming_window_days: u32,

    /// Emit logs as JSON lines.
    #[arg(long, env = "CTRK_LOG_JSON")]
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: None,
            catalog: None,
            seed_demo: false,
            status_coupling: StatusCoupling::default(),
            upcoming_window_days: DEFAULT_UPCOMING_WINDOW_DAYS,
            log_json: false,
        }
    }
}
