//! # ctrk-core: Foundational Types for the Compliance Tracker
//!
//! Every other crate in the workspace depends on `ctrk-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! - **Identifiers** (`identity.rs`): string newtypes for every id namespace.
//!   Ids are opaque at the boundary and generated as full UUID v4 strings.
//! - **Timestamps** (`temporal.rs`): UTC-only, seconds precision, ISO-8601
//!   with `Z` suffix on the wire.
//! - **Entity model** (`entity.rs`): the legal business unit and its
//!   statutory registrations (CIN, GST, PAN).
//! - **Periods** (`period.rs`): the filing period a compliance instance
//!   covers: exactly one of financial year, assessment year, return period.
//! - **Errors** (`error.rs`): `TrackerError`, shared by all stores.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement `Serialize`/`Deserialize`.

pub mod entity;
pub mod error;
pub mod identity;
pub mod period;
pub mod temporal;

pub use entity::{Entity, EntityType, RegistrationKind, Registrations};
pub use error::{TrackerError, TrackerResult};
pub use identity::{
    ComplianceId, ComplianceTypeCode, DocumentId, EntityId, ServiceCode, SubmissionId,
    SubscriptionId, UserId,
};
pub use period::{Frequency, Period};
pub use temporal::Timestamp;
