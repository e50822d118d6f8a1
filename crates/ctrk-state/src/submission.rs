//! # Portal Submissions
//!
//! A record of filing one compliance instance with a government portal.
//! The tracker does not talk to portals; it stores what the caller reports:
//! status, per-stage timestamps, portal reference ids, raw responses and
//! the final acknowledgment.
//!
//! Updates merge. Timeline stages are set individually with no ordering
//! check, reference ids merge key by key, and responses and errors only
//! ever grow.

use std::collections::BTreeMap;

use ctrk_core::{
    ComplianceId, DocumentId, EntityId, SubmissionId, Timestamp, TrackerError, TrackerResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Prepared,
    Submitted,
    Processing,
    Acknowledged,
    Rejected,
}

/// When each stage was reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<Timestamp>,
}

impl Timeline {
    /// Overwrite every stage `other` sets; keep the rest.
    pub fn merge(&mut self, other: Timeline) {
        self.prepared = other.prepared.or(self.prepared);
        self.submitted = other.submitted.or(self.submitted);
        self.processed = other.processed.or(self.processed);
        self.acknowledged = other.acknowledged.or(self.acknowledged);
    }
}

/// Portal acknowledgment of a completed filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Acknowledgment {
    pub number: String,
    pub received_at: Timestamp,
    /// Uploaded copy of the acknowledgment receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
}

/// A resubmission attempt. Never written by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryAttempt {
    pub attempted_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSubmission {
    pub entity_id: EntityId,
    pub compliance_id: ComplianceId,
    /// Portal name, e.g. `MCA21` or `GSTN`.
    pub portal: String,
    pub form_type: String,
    #[serde(default)]
    pub reference_ids: BTreeMap<String, String>,
}

/// Mutable submission fields. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmissionPatch {
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub timeline: Option<Timeline>,
    /// Merged into the existing reference ids.
    #[serde(default)]
    pub reference_ids: BTreeMap<String, String>,
    /// Appended to the response log.
    #[serde(default)]
    pub append_responses: Vec<serde_json::Value>,
    #[serde(default)]
    pub acknowledgment: Option<Acknowledgment>,
    /// Appended to the error log.
    #[serde(default)]
    pub append_errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub entity_id: EntityId,
    pub compliance_id: ComplianceId,
    pub portal: String,
    pub form_type: String,
    pub status: SubmissionStatus,
    pub timeline: Timeline,
    #[serde(default)]
    pub reference_ids: BTreeMap<String, String>,
    #[serde(default)]
    pub responses: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgment: Option<Acknowledgment>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub retry_history: Vec<RetryAttempt>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Submission {
    /// Create a `PREPARED` submission stamped with the preparation time.
    pub fn open(cmd: NewSubmission, now: Timestamp) -> TrackerResult<Self> {
        if cmd.portal.trim().is_empty() {
            return Err(TrackerError::validation("portal must not be empty"));
        }
        if cmd.form_type.trim().is_empty() {
            return Err(TrackerError::validation("form_type must not be empty"));
        }
        Ok(Self {
            id: SubmissionId::generate(),
            entity_id: cmd.entity_id,
            compliance_id: cmd.compliance_id,
            portal: cmd.portal,
            form_type: cmd.form_type,
            status: SubmissionStatus::Prepared,
            timeline: Timeline {
                prepared: Some(now),
                ..Timeline::default()
            },
            reference_ids: cmd.reference_ids,
            responses: Vec::new(),
            acknowledgment: None,
            errors: Vec::new(),
            retry_history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, patch: SubmissionPatch, now: Timestamp) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(timeline) = patch.timeline {
            self.timeline.merge(timeline);
        }
        self.reference_ids.extend(patch.reference_ids);
        self.responses.extend(patch.append_responses);
        if let Some(ack) = patch.acknowledgment {
            self.acknowledgment = Some(ack);
        }
        self.errors.extend(patch.append_errors);
        self.updated_at = now;
    }
}
