//! # API Route Modules
//!
//! - `catalog`: read-only compliance types, services and workflow schemas.
//! - `entities`: entity directory plus per-entity applicability,
//!   subscription and recommendation views.
//! - `subscriptions`: subscribe, patch, cancel.
//! - `compliances`: the compliance lifecycle and dashboard queries.
//! - `documents` and `submissions`: evidence attached to a compliance.

pub mod catalog;
pub mod compliances;
pub mod documents;
pub mod entities;
pub mod submissions;
pub mod subscriptions;
