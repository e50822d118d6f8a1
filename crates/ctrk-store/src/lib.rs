//! # ctrk-store: Compliance Tracker Stores
//!
//! In-memory, thread-safe stores for every tracker record, built on the
//! generic [`Store`] (`store.rs`):
//!
//! - [`ComplianceInstanceStore`]: compliance lifecycle, history, due-date
//!   queries and statistics.
//! - [`SubscriptionRegistry`]: subscriptions, the subscribed compliance
//!   set, recommendations, per-entity compliance toggles.
//! - [`DocumentTracker`] and [`SubmissionTracker`]: supporting records
//!   linked back into compliance instances.
//! - [`EntityDirectory`]: read-mostly copy of onboarded entities.
//!
//! [`Tracker`] wires one of each together around a shared catalog.
//! Durability is by whole-store JSON snapshots (`snapshot.rs`), and
//! `seed.rs` provides a demo dataset.

pub mod compliance;
pub mod document;
pub mod entity;
pub mod seed;
pub mod snapshot;
pub mod store;
pub mod submission;
pub mod subscription;
pub mod tracker;

pub use compliance::{
    ComplianceInstanceStore, ComplianceStats, WorkflowProgress, DEFAULT_UPCOMING_WINDOW_DAYS,
};
pub use document::DocumentTracker;
pub use entity::EntityDirectory;
pub use snapshot::{JsonFileSnapshot, SnapshotError, SnapshotResult, SnapshotStore};
pub use store::{Record, Store};
pub use submission::SubmissionTracker;
pub use subscription::{ResolvedCompliance, SubscriptionRegistry};
pub use tracker::Tracker;
