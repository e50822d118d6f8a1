//! # Application State
//!
//! Shared by every handler through axum's `State` extractor. Cloning is
//! cheap: the tracker's stores are `Arc`-backed and the config is behind
//! an `Arc`.

use std::sync::Arc;

use ctrk_store::Tracker;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub tracker: Tracker,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(tracker: Tracker, config: AppConfig) -> Self {
        Self {
            tracker,
            config: Arc::new(config),
        }
    }
}
