//! # Workflow Schemas
//!
//! The ordered process steps an instance of a compliance type moves
//! through, keyed by compliance type code. Types without their own schema
//! use the generic default. Every schema ends in [`TERMINAL_STEP`].
//!
//! Schemas are advisory: the instance store accepts any step, in any
//! order, including steps outside the schema. They exist for display, for
//! the initial state of a new instance, and to classify moves as forward
//! or backward.

use std::collections::BTreeMap;

use ctrk_core::ComplianceTypeCode;
use serde::{Deserialize, Serialize};

/// The step every schema ends in.
pub const TERMINAL_STEP: &str = "ACKNOWLEDGED";

/// One process step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowStep {
    /// Machine value stored in the instance's workflow state.
    pub value: String,
    /// Display label.
    pub label: String,
}

/// Classification of a move between two workflow states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepDirection {
    Forward,
    Backward,
    Same,
    /// At least one of the states is not part of the schema.
    Unknown,
}

/// An ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowSchema {
    steps: Vec<WorkflowStep>,
}

impl WorkflowSchema {
    pub fn new(steps: Vec<WorkflowStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The initial step, if the schema has any.
    pub fn first(&self) -> Option<&WorkflowStep> {
        self.steps.first()
    }

    /// Index of `state` within the schema.
    pub fn position(&self, state: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.value == state)
    }

    pub fn contains(&self, state: &str) -> bool {
        self.position(state).is_some()
    }

    /// Whether `state` is the shared terminal step.
    pub fn is_terminal(state: &str) -> bool {
        state == TERMINAL_STEP
    }

    /// Classify a move from `from` to `to`.
    pub fn direction(&self, from: &str, to: &str) -> StepDirection {
        match (self.position(from), self.position(to)) {
            (Some(a), Some(b)) if b > a => StepDirection::Forward,
            (Some(a), Some(b)) if b < a => StepDirection::Backward,
            (Some(_), Some(_)) => StepDirection::Same,
            _ => StepDirection::Unknown,
        }
    }

    /// Structural problems, if any: empty, duplicate values, wrong terminal step.
    pub(crate) fn problem(&self) -> Option<String> {
        let last = match self.steps.last() {
            Some(step) => step,
            None => return Some("schema has no steps".to_string()),
        };
        if last.value != TERMINAL_STEP {
            return Some(format!(
                "last step is {}, expected {TERMINAL_STEP}",
                last.value
            ));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.value.trim().is_empty() {
                return Some(format!("step {i} has an empty value"));
            }
            if self.steps[..i].iter().any(|s| s.value == step.value) {
                return Some(format!("step {} appears twice", step.value));
            }
        }
        None
    }
}

/// Schemas keyed by compliance type, with a generic fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowRegistry {
    pub default: WorkflowSchema,
    #[serde(default)]
    pub schemas: BTreeMap<ComplianceTypeCode, WorkflowSchema>,
}

impl WorkflowRegistry {
    /// The schema for `code`, or the default when none is registered.
    pub fn schema_for(&self, code: &ComplianceTypeCode) -> &WorkflowSchema {
        self.schemas.get(code).unwrap_or(&self.default)
    }

    /// Whether `code` has a dedicated schema.
    pub fn has_dedicated(&self, code: &ComplianceTypeCode) -> bool {
        self.schemas.contains_key(code)
    }
}
