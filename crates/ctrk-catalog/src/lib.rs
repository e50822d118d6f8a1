//! # ctrk-catalog: Compliance Reference Data
//!
//! Immutable catalog data consumed by every other component, loaded once
//! at process start and never mutated afterwards.
//!
//! - [`ComplianceType`] (`compliance_type.rs`): the classes of statutory
//!   obligation: code, category, frequency, required documents, deadline.
//! - [`ApplicabilityRule`] and [`ApplicabilityEngine`] (`rules.rs`): which
//!   compliance types apply to which entities, and whether they are
//!   mandatory.
//! - [`DueDateCalculation`] (`due_date.rs`): deadline descriptors and their
//!   resolution against an anchor date.
//! - [`WorkflowRegistry`] (`workflow.rs`): the ordered process steps per
//!   compliance type, all ending in the shared `ACKNOWLEDGED` step.
//! - [`Service`] (`service.rs`): sellable bundles of compliance types.
//! - [`Catalog`] (`catalog.rs`): the validated bundle of all of the above,
//!   parsed from YAML. The built-in dataset is embedded in the crate.

pub mod catalog;
pub mod compliance_type;
pub mod due_date;
pub mod error;
pub mod rules;
pub mod service;
pub mod workflow;

pub use catalog::Catalog;
pub use compliance_type::{ComplianceCategory, ComplianceType};
pub use due_date::{DueDateBase, DueDateCalculation};
pub use error::{CatalogError, CatalogResult};
pub use rules::{
    ApplicabilityConditions, ApplicabilityEngine, ApplicabilityRule, ApplicableCompliance,
    RegistrationRequirements, ThresholdCriteria,
};
pub use service::{Pricing, Service, ServiceCategory, SlaDescriptor};
pub use workflow::{StepDirection, WorkflowRegistry, WorkflowSchema, WorkflowStep, TERMINAL_STEP};
