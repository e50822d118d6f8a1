//! # Compliance Instance Lifecycle
//!
//! One statutory obligation for one entity and one period. An instance
//! carries two independent pieces of state:
//!
//! - a coarse [`ComplianceStatus`] used for dashboards and statistics, and
//! - a fine-grained workflow state naming the current process step.
//!
//! Both are permissive. Any status may follow any status (including
//! itself) and any workflow step may follow any step, in or out of the
//! type's schema. The schema is only used to pick the initial step and to
//! flag moves that go backwards.
//!
//! ## History
//!
//! Every successful change appends one [`HistoryEntry`]. Entries are never
//! rewritten or removed. Status changes and workflow changes share the one
//! log; an entry's `state` holds either a status name or a step value.
//!
//! ## Status Coupling
//!
//! Under [`StatusCoupling::Independent`] the two axes never influence each
//! other. Under [`StatusCoupling::AcknowledgedCompletes`], reaching the
//! terminal `ACKNOWLEDGED` step also sets the status to `COMPLETED`, and
//! that status change gets its own history entry.

use std::collections::BTreeMap;

use ctrk_catalog::{StepDirection, WorkflowSchema, TERMINAL_STEP};
use ctrk_core::{
    ComplianceId, ComplianceTypeCode, DocumentId, EntityId, Frequency, Period, SubmissionId,
    Timestamp, TrackerError, TrackerResult, UserId,
};
use serde::{Deserialize, Serialize};

// ── Status ─────────────────────────────────────────────────────────────

/// Coarse progress of a compliance instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Pending,
    InProgress,
    Completed,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether reaching the terminal workflow step completes the instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCoupling {
    /// Status and workflow state move independently.
    #[default]
    Independent,
    /// Moving to `ACKNOWLEDGED` also sets status `COMPLETED`.
    AcknowledgedCompletes,
}

impl std::str::FromStr for StatusCoupling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "acknowledged-completes" => Ok(Self::AcknowledgedCompletes),
            other => Err(format!(
                "unknown status coupling '{other}' (expected independent or acknowledged-completes)"
            )),
        }
    }
}

// ── History ────────────────────────────────────────────────────────────

/// One entry of an instance's audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Status name or workflow step value.
    pub state: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    /// The move went to an earlier step of the schema.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub backward: bool,
}

impl HistoryEntry {
    fn new(state: impl Into<String>, timestamp: Timestamp, user: Option<UserId>) -> Self {
        Self {
            state: state.into(),
            timestamp,
            user,
            backward: false,
        }
    }
}

// ── Instance ───────────────────────────────────────────────────────────

/// Command to open a new compliance instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCompliance {
    pub entity_id: EntityId,
    pub compliance_type: ComplianceTypeCode,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub due_date: Option<Timestamp>,
    /// Initial step. Defaults to the first step of the type's schema.
    #[serde(default)]
    pub workflow_state: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl NewCompliance {
    pub fn new(entity_id: EntityId, compliance_type: ComplianceTypeCode, due_date: Timestamp) -> Self {
        Self {
            entity_id,
            compliance_type,
            period: None,
            due_date: Some(due_date),
            workflow_state: None,
            assigned_to: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_assignee(mut self, user: UserId) -> Self {
        self.assigned_to = Some(user);
        self
    }

    pub fn with_workflow_state(mut self, state: impl Into<String>) -> Self {
        self.workflow_state = Some(state.into());
        self
    }
}

/// One statutory obligation being tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceInstance {
    pub id: ComplianceId,
    pub entity_id: EntityId,
    pub compliance_type: ComplianceTypeCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    pub due_date: Timestamp,
    pub status: ComplianceStatus,
    pub workflow_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub documents: Vec<DocumentId>,
    #[serde(default)]
    pub submissions: Vec<SubmissionId>,
    pub history: Vec<HistoryEntry>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Outcome of a workflow move, for the caller's logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowChange {
    pub direction: StepDirection,
    /// The move also completed the instance under coupled status.
    pub completed: bool,
}

impl ComplianceInstance {
    /// Open an instance in `PENDING` with a single history entry.
    ///
    /// `frequency` is the catalogued frequency of the type, when known; a
    /// supplied period must be of the form that frequency uses.
    pub fn open(
        cmd: NewCompliance,
        schema: &WorkflowSchema,
        frequency: Option<Frequency>,
        now: Timestamp,
    ) -> TrackerResult<Self> {
        let due_date = cmd.due_date.ok_or_else(|| {
            TrackerError::validation("due_date is required to open a compliance instance")
        })?;

        if let (Some(period), Some(frequency)) = (&cmd.period, frequency) {
            if !period.fits(frequency) {
                return Err(TrackerError::validation(format!(
                    "period {period} does not match {frequency} frequency of {}",
                    cmd.compliance_type
                )));
            }
        }
        if cmd.period.as_ref().is_some_and(|p| p.label().trim().is_empty()) {
            return Err(TrackerError::validation("period label must not be empty"));
        }

        let workflow_state = match cmd.workflow_state {
            Some(state) if state.trim().is_empty() => {
                return Err(TrackerError::validation("workflow_state must not be empty"))
            }
            Some(state) => state,
            None => schema
                .first()
                .map(|step| step.value.clone())
                .unwrap_or_else(|| TERMINAL_STEP.to_string()),
        };

        let history = vec![HistoryEntry::new(
            workflow_state.clone(),
            now,
            cmd.assigned_to.clone(),
        )];

        Ok(Self {
            id: ComplianceId::generate(),
            entity_id: cmd.entity_id,
            compliance_type: cmd.compliance_type,
            period: cmd.period,
            due_date,
            status: ComplianceStatus::Pending,
            workflow_state,
            assigned_to: cmd.assigned_to,
            metadata: cmd.metadata,
            documents: Vec::new(),
            submissions: Vec::new(),
            history,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the status and record it. Any status may follow any status.
    pub fn set_status(&mut self, status: ComplianceStatus, user: Option<UserId>, now: Timestamp) {
        self.status = status;
        self.history
            .push(HistoryEntry::new(status.as_str(), now, user));
        self.updated_at = now;
    }

    /// Replace the workflow state and record it.
    ///
    /// Accepts any non-blank step. Moves to an earlier step of `schema` are
    /// marked `backward` in the history entry but still applied.
    pub fn set_workflow_state(
        &mut self,
        state: &str,
        user: Option<UserId>,
        schema: &WorkflowSchema,
        coupling: StatusCoupling,
        now: Timestamp,
    ) -> TrackerResult<WorkflowChange> {
        let state = state.trim();
        if state.is_empty() {
            return Err(TrackerError::validation("workflow state must not be empty"));
        }

        let direction = schema.direction(&self.workflow_state, state);
        self.workflow_state = state.to_string();
        let mut entry = HistoryEntry::new(state, now, user.clone());
        entry.backward = direction == StepDirection::Backward;
        self.history.push(entry);
        self.updated_at = now;

        let completed = coupling == StatusCoupling::AcknowledgedCompletes
            && WorkflowSchema::is_terminal(state)
            && !self.status.is_completed();
        if completed {
            self.set_status(ComplianceStatus::Completed, user, now);
        }

        Ok(WorkflowChange {
            direction,
            completed,
        })
    }

    /// Not completed and due strictly before `now`.
    pub fn is_overdue_at(&self, now: Timestamp) -> bool {
        !self.status.is_completed() && self.due_date < now
    }

    /// Not completed and due within `[now, until]`.
    pub fn is_upcoming_at(&self, now: Timestamp, until: Timestamp) -> bool {
        !self.status.is_completed() && self.due_date >= now && self.due_date <= until
    }

    /// Record a document back reference. Returns false if already linked.
    pub fn link_document(&mut self, id: DocumentId, now: Timestamp) -> bool {
        if self.documents.contains(&id) {
            return false;
        }
        self.documents.push(id);
        self.updated_at = now;
        true
    }

    /// Record a submission back reference. Returns false if already linked.
    pub fn link_submission(&mut self, id: SubmissionId, now: Timestamp) -> bool {
        if self.submissions.contains(&id) {
            return false;
        }
        self.submissions.push(id);
        self.updated_at = now;
        true
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value, now: Timestamp) {
        self.metadata.insert(key.into(), value);
        self.updated_at = now;
    }
}
