//! # Compliance Types
//!
//! A compliance type is a class of statutory obligation (the annual return
//! with the Registrar, the monthly GST summary return) independent of any
//! particular entity or period. The catalog holds one per code.

use ctrk_core::{ComplianceTypeCode, EntityType, Frequency};
use serde::{Deserialize, Serialize};

use crate::due_date::DueDateCalculation;

/// Broad regulatory area a compliance type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceCategory {
    /// Company-law filings with the Registrar.
    Corporate,
    /// Direct tax (income tax, TDS).
    Tax,
    /// Goods and Services Tax.
    Gst,
    /// Provident fund, state insurance and other payroll levies.
    Payroll,
}

impl ComplianceCategory {
    /// Return the wire representation of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corporate => "CORPORATE",
            Self::Tax => "TAX",
            Self::Gst => "GST",
            Self::Payroll => "PAYROLL",
        }
    }
}

impl std::fmt::Display for ComplianceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one class of obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceType {
    /// Unique catalog code (e.g., "MCA_ANNUAL_RETURN").
    pub code: ComplianceTypeCode,
    /// Display name.
    pub name: String,
    pub category: ComplianceCategory,
    pub frequency: Frequency,
    /// Authority the return is filed with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    /// Statutory form reference (e.g., "MGT-7").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Entity types this obligation can apply to.
    pub applicable_entity_types: Vec<EntityType>,
    /// Document types that must accompany a filing.
    #[serde(default)]
    pub required_documents: Vec<String>,
    /// Statutory deadline.
    pub deadline: DueDateCalculation,
}

impl ComplianceType {
    /// Whether this obligation can apply to an entity of `entity_type`.
    pub fn applies_to(&self, entity_type: EntityType) -> bool {
        self.applicable_entity_types.contains(&entity_type)
    }
}
