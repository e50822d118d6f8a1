//! # Startup
//!
//! Builds the [`AppState`] from configuration:
//!
//! 1. Load the catalog (built-in, or `--catalog`).
//! 2. Assemble the tracker with the configured status coupling.
//! 3. Hydrate from `--data-dir` snapshots, if given.
//! 4. Seed the demo data, if `--seed-demo`.

use std::sync::Arc;

use ctrk_catalog::{Catalog, CatalogError};
use ctrk_core::TrackerError;
use ctrk_store::{SnapshotError, Tracker};

use crate::config::AppConfig;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("seeding demo data: {0}")]
    Seed(#[from] TrackerError),
}

pub fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let catalog = match &config.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    tracing::info!(
        compliance_types = catalog.compliance_types().len(),
        services = catalog.services().len(),
        "catalog ready"
    );

    let tracker = Tracker::new(Arc::new(catalog), config.status_coupling);
    if let Some(dir) = &config.data_dir {
        tracker.load_from(dir)?;
    }
    if config.seed_demo {
        ctrk_store::seed::demo(&tracker)?;
    }

    Ok(AppState::new(tracker, config))
}
