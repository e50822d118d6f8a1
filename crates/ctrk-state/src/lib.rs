//! # ctrk-state: Tracker Records and Their Transitions
//!
//! Plain record types plus the pure functions that move them between
//! states. Nothing here holds a lock or touches I/O; the stores in
//! `ctrk-store` own the records and call these methods under their write
//! lock, passing in the current instant.
//!
//! ## Lifecycles
//!
//! - **Compliance instance** (`compliance.rs`): status `PENDING` /
//!   `IN_PROGRESS` / `COMPLETED` and a free-form workflow state, both
//!   permissive. Every change appends to an append-only history.
//! - **Subscription** (`subscription.rs`): `ACTIVE` / `CANCELLED` /
//!   `SUSPENDED` / `EXPIRED`, with per-subscription include/exclude
//!   customizations of the service bundle.
//! - **Document** (`document.rs`): `PENDING` / `VERIFIED` / `REJECTED`.
//! - **Submission** (`submission.rs`): `PREPARED` through `ACKNOWLEDGED`
//!   or `REJECTED`, with a merge-only timeline and response log.
//!
//! Mutations arrive as typed patches that name exactly the mutable fields
//! and reject anything else at deserialization.

pub mod compliance;
pub mod document;
pub mod submission;
pub mod subscription;

pub use compliance::{
    ComplianceInstance, ComplianceStatus, HistoryEntry, NewCompliance, StatusCoupling,
    WorkflowChange,
};
pub use document::{Document, DocumentStatus, FileMetadata, NewDocument};
pub use submission::{
    Acknowledgment, NewSubmission, RetryAttempt, Submission, SubmissionPatch, SubmissionStatus,
    Timeline,
};
pub use subscription::{
    BillingCycle, Customizations, NewSubscription, Subscription, SubscriptionPatch,
    SubscriptionStatus,
};
