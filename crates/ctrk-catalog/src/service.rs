//! Sellable services.
//!
//! A service bundles one or more compliance types under a price. Entities
//! subscribe to services; the subscribed set of compliance types is derived
//! from the service bundles plus per-subscription customizations.

use ctrk_core::{ComplianceTypeCode, EntityType, ServiceCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Corporate,
    Tax,
    Gst,
    Payroll,
    /// Multi-category bundle.
    Bundle,
}

/// Prices in whole rupees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarterly: Option<u64>,
    pub annual: u64,
}

/// A service-level commitment, e.g. "filing" / "3 days before due date".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlaDescriptor {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    pub code: ServiceCode,
    pub name: String,
    pub category: ServiceCategory,
    #[serde(default)]
    pub description: String,
    pub pricing: Pricing,
    pub applicable_entity_types: Vec<EntityType>,
    /// Compliance types covered by the bundle.
    pub compliance_types: Vec<ComplianceTypeCode>,
    #[serde(default)]
    pub sla: Vec<SlaDescriptor>,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub popular: bool,
}

impl Service {
    pub fn applies_to(&self, entity_type: EntityType) -> bool {
        self.applicable_entity_types.contains(&entity_type)
    }

    pub fn covers(&self, code: &ComplianceTypeCode) -> bool {
        self.compliance_types.contains(code)
    }
}
