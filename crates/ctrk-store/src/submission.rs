//! Submission tracker.
//!
//! Submissions always belong to an existing compliance instance, which
//! gains a back reference on creation. Retries are not modelled: the
//! retry history field exists on the record but nothing writes it.

use ctrk_core::{ComplianceId, SubmissionId, Timestamp, TrackerError, TrackerResult};
use ctrk_state::{NewSubmission, Submission, SubmissionPatch};

use crate::compliance::ComplianceInstanceStore;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    records: Store<Submission>,
    compliances: ComplianceInstanceStore,
}

impl SubmissionTracker {
    pub fn new(compliances: ComplianceInstanceStore) -> Self {
        Self {
            records: Store::new(),
            compliances,
        }
    }

    /// Record a `PREPARED` submission for an existing compliance instance
    /// of the same entity.
    pub fn create(&self, cmd: NewSubmission) -> TrackerResult<Submission> {
        let submission = Submission::open(cmd, Timestamp::now())?;
        self.compliances
            .link_submission(
                &submission.compliance_id,
                &submission.entity_id,
                submission.id.clone(),
            )?;
        self.records.insert(submission.clone());
        tracing::info!(
            submission_id = %submission.id,
            compliance_id = %submission.compliance_id,
            portal = %submission.portal,
            form_type = %submission.form_type,
            "submission prepared"
        );
        Ok(submission)
    }

    pub fn get(&self, id: &SubmissionId) -> TrackerResult<Submission> {
        self.records
            .get(id)
            .ok_or_else(|| TrackerError::not_found(SubmissionId::KIND, id))
    }

    /// Merge a typed patch.
    pub fn update(&self, id: &SubmissionId, patch: SubmissionPatch) -> TrackerResult<Submission> {
        let now = Timestamp::now();
        let updated = self
            .records
            .update(id, |s| s.apply(patch, now))
            .ok_or_else(|| TrackerError::not_found(SubmissionId::KIND, id))?;
        tracing::info!(submission_id = %id, status = ?updated.status, "submission updated");
        Ok(updated)
    }

    pub fn list_by_compliance(&self, compliance_id: &ComplianceId) -> Vec<Submission> {
        self.records.filter(|s| &s.compliance_id == compliance_id)
    }

    pub fn hydrate(&self, records: Vec<Submission>) {
        self.records.replace_all(records);
    }

    pub fn snapshot(&self) -> Vec<Submission> {
        self.records.list()
    }
}
