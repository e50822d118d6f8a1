//! # Applicability Rules
//!
//! Determines which compliance types apply to an entity and whether each
//! is mandatory. One rule per compliance type; rules are evaluated in
//! declaration order and the result preserves that order.
//!
//! ## Evaluation
//!
//! A rule applies when all three checks pass. Evaluation short-circuits on
//! the first failure:
//!
//! 1. The entity's type is listed in the rule's applicability conditions.
//! 2. Threshold criteria hold. Today the only criterion is "requires GST
//!    registration", satisfied by a non-blank GST number.
//! 3. Every registration the rule flags (CIN / GST / PAN) is present and
//!    non-blank.
//!
//! Exemptions are descriptive text for the back office; they are emitted
//! verbatim and never evaluated. An entity matching no rule gets an empty
//! list. That is an informational result, not an error.

use ctrk_core::{ComplianceTypeCode, Entity, EntityType, RegistrationKind};
use serde::{Deserialize, Serialize};

use crate::due_date::DueDateCalculation;

/// Entity attributes a rule is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicabilityConditions {
    pub entity_types: Vec<EntityType>,
}

/// Threshold preconditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdCriteria {
    /// The entity must hold a GST registration.
    #[serde(default)]
    pub requires_gst_registration: bool,
}

/// Registrations the entity must hold for the rule to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationRequirements {
    #[serde(default)]
    pub cin: bool,
    #[serde(default)]
    pub gst: bool,
    #[serde(default)]
    pub pan: bool,
}

impl RegistrationRequirements {
    /// The registration kinds flagged as required.
    pub fn required(&self) -> impl Iterator<Item = RegistrationKind> + '_ {
        [
            (self.cin, RegistrationKind::Cin),
            (self.gst, RegistrationKind::Gst),
            (self.pan, RegistrationKind::Pan),
        ]
        .into_iter()
        .filter_map(|(flag, kind)| flag.then_some(kind))
    }
}

/// Maps one compliance type to the entities it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicabilityRule {
    pub compliance_type: ComplianceTypeCode,
    pub applicability_conditions: ApplicabilityConditions,
    /// Whether the obligation is mandatory for matching entities.
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_criteria: Option<ThresholdCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_requirements: Option<RegistrationRequirements>,
    /// Descriptive exemption conditions. Not evaluated.
    #[serde(default)]
    pub exemptions: Vec<String>,
    pub due_date_calculation: DueDateCalculation,
}

/// A compliance type that applies to a given entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicableCompliance {
    pub compliance_type: ComplianceTypeCode,
    pub mandatory: bool,
    pub due_date_calculation: DueDateCalculation,
    pub exemptions: Vec<String>,
}

/// Why a rule did not apply. Used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    EntityType,
    Threshold,
    Registration(RegistrationKind),
}

/// Evaluates applicability rules against entities.
///
/// Stateless apart from the rule list, which is fixed at construction.
/// Given the same entity, the output is always identical.
#[derive(Debug, Clone, Default)]
pub struct ApplicabilityEngine {
    rules: Vec<ApplicabilityRule>,
}

impl ApplicabilityEngine {
    /// Create an engine over `rules`, evaluated in the given order.
    pub fn new(rules: Vec<ApplicabilityRule>) -> Self {
        Self { rules }
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> &[ApplicabilityRule] {
        &self.rules
    }

    /// The rule for a compliance type, if one is declared.
    pub fn rule_for(&self, code: &ComplianceTypeCode) -> Option<&ApplicabilityRule> {
        self.rules.iter().find(|r| &r.compliance_type == code)
    }

    /// Compute the compliance types applicable to `entity`, in rule order.
    pub fn compute_applicable_compliances(&self, entity: &Entity) -> Vec<ApplicableCompliance> {
        let applicable: Vec<ApplicableCompliance> = self
            .rules
            .iter()
            .filter(|rule| match check(rule, entity) {
                Ok(()) => true,
                Err(reason) => {
                    tracing::trace!(
                        entity_id = %entity.id,
                        compliance_type = %rule.compliance_type,
                        ?reason,
                        "applicability rule rejected"
                    );
                    false
                }
            })
            .map(|rule| ApplicableCompliance {
                compliance_type: rule.compliance_type.clone(),
                mandatory: rule.mandatory,
                due_date_calculation: rule.due_date_calculation.clone(),
                exemptions: rule.exemptions.clone(),
            })
            .collect();

        tracing::debug!(
            entity_id = %entity.id,
            entity_type = %entity.entity_type,
            applicable = applicable.len(),
            "computed applicable compliances"
        );
        applicable
    }

    /// Whether a rule applies to `entity`.
    pub fn applies(&self, rule: &ApplicabilityRule, entity: &Entity) -> bool {
        check(rule, entity).is_ok()
    }

    /// Whether `code` is mandatory for `entity`.
    ///
    /// False when no rule for `code` applies to the entity.
    pub fn is_mandatory(&self, entity: &Entity, code: &ComplianceTypeCode) -> bool {
        self.rule_for(code)
            .is_some_and(|rule| rule.mandatory && check(rule, entity).is_ok())
    }
}

fn check(rule: &ApplicabilityRule, entity: &Entity) -> Result<(), Rejection> {
    if !rule
        .applicability_conditions
        .entity_types
        .contains(&entity.entity_type)
    {
        return Err(Rejection::EntityType);
    }

    if let Some(ref threshold) = rule.threshold_criteria {
        if threshold.requires_gst_registration && !entity.has_registration(RegistrationKind::Gst) {
            return Err(Rejection::Threshold);
        }
    }

    if let Some(ref requirements) = rule.registration_requirements {
        if let Some(missing) = requirements
            .required()
            .find(|kind| !entity.has_registration(*kind))
        {
            return Err(Rejection::Registration(missing));
        }
    }

    Ok(())
}
