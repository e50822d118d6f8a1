//! # Compliance Instance Store
//!
//! Owns every [`ComplianceInstance`] and is the only writer of their
//! status, workflow state and history. Each mutation validates and then
//! applies the whole change (history append included) under the store's
//! write lock, so readers see either the old record or the new one.
//!
//! Workflow schemas come from the catalog, which resolves them once at
//! load time. The store never rejects a step for being out of schema or
//! out of order; a move to an earlier step is logged and flagged in the
//! history entry.

use std::sync::Arc;

use ctrk_catalog::{Catalog, StepDirection, WorkflowSchema};
use ctrk_core::{
    ComplianceId, DocumentId, EntityId, SubmissionId, Timestamp, TrackerError, TrackerResult,
    UserId,
};
use ctrk_state::{ComplianceInstance, ComplianceStatus, NewCompliance, StatusCoupling};
use serde::Serialize;

use crate::store::Store;

/// Default look-ahead for [`ComplianceInstanceStore::upcoming`].
pub const DEFAULT_UPCOMING_WINDOW_DAYS: u32 = 30;

/// Aggregate counts over a set of instances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    /// Not completed and past due.
    pub overdue: usize,
    /// `100 * completed / total`, or 0 when there are no instances.
    pub completion_rate: f64,
}

/// Where an instance stands within its type's workflow schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowProgress {
    pub compliance_id: ComplianceId,
    pub workflow_state: String,
    pub schema: WorkflowSchema,
    /// Index of the current state in the schema, if it is a schema step.
    pub current_index: Option<usize>,
    pub total_steps: usize,
    pub terminal_reached: bool,
}

/// Store of compliance instances.
#[derive(Debug, Clone)]
pub struct ComplianceInstanceStore {
    records: Store<ComplianceInstance>,
    catalog: Arc<Catalog>,
    coupling: StatusCoupling,
}

impl ComplianceInstanceStore {
    pub fn new(catalog: Arc<Catalog>, coupling: StatusCoupling) -> Self {
        Self {
            records: Store::new(),
            catalog,
            coupling,
        }
    }

    pub fn coupling(&self) -> StatusCoupling {
        self.coupling
    }

    /// Open a new instance in `PENDING`.
    ///
    /// Types missing from the catalog are accepted with the default
    /// workflow schema and no period check.
    pub fn create(&self, cmd: NewCompliance) -> TrackerResult<ComplianceInstance> {
        let schema = self.catalog.schema_for(&cmd.compliance_type);
        let frequency = match self.catalog.compliance_type(&cmd.compliance_type) {
            Some(ct) => Some(ct.frequency),
            None => {
                tracing::debug!(
                    compliance_type = %cmd.compliance_type,
                    "compliance type not in catalog, using default workflow"
                );
                None
            }
        };

        let instance = ComplianceInstance::open(cmd, schema, frequency, Timestamp::now())?;
        self.records.insert(instance.clone());

        tracing::info!(
            compliance_id = %instance.id,
            entity_id = %instance.entity_id,
            compliance_type = %instance.compliance_type,
            due_date = %instance.due_date,
            workflow_state = %instance.workflow_state,
            "compliance instance created"
        );
        Ok(instance)
    }

    pub fn get_by_id(&self, id: &ComplianceId) -> TrackerResult<ComplianceInstance> {
        self.records
            .get(id)
            .ok_or_else(|| TrackerError::not_found(ComplianceId::KIND, id))
    }

    pub fn contains(&self, id: &ComplianceId) -> bool {
        self.records.contains(id)
    }

    /// All instances of one entity, in creation order.
    pub fn list_by_entity(&self, entity_id: &EntityId) -> Vec<ComplianceInstance> {
        self.records.filter(|c| &c.entity_id == entity_id)
    }

    pub fn list_all(&self) -> Vec<ComplianceInstance> {
        self.records.list()
    }

    /// Replace the status and append a history entry.
    pub fn update_status(
        &self,
        id: &ComplianceId,
        status: ComplianceStatus,
        user: Option<UserId>,
    ) -> TrackerResult<ComplianceInstance> {
        let now = Timestamp::now();
        let updated = self
            .records
            .update(id, |c| c.set_status(status, user, now))
            .ok_or_else(|| TrackerError::not_found(ComplianceId::KIND, id))?;

        tracing::info!(compliance_id = %id, status = %status, "compliance status updated");
        Ok(updated)
    }

    /// Replace the workflow state and append a history entry.
    pub fn update_workflow_state(
        &self,
        id: &ComplianceId,
        state: &str,
        user: Option<UserId>,
    ) -> TrackerResult<ComplianceInstance> {
        let now = Timestamp::now();
        let catalog = &self.catalog;
        let coupling = self.coupling;
        let (from, change, updated) = self
            .records
            .try_update(id, |c| {
                let from = c.workflow_state.clone();
                let schema = catalog.schema_for(&c.compliance_type);
                let change = c.set_workflow_state(state, user, schema, coupling, now)?;
                Ok::<_, TrackerError>((from, change, c.clone()))
            })
            .ok_or_else(|| TrackerError::not_found(ComplianceId::KIND, id))??;

        if change.direction == StepDirection::Backward {
            tracing::warn!(
                compliance_id = %id,
                from = %from,
                to = %updated.workflow_state,
                "workflow moved to an earlier step"
            );
        }
        tracing::info!(
            compliance_id = %id,
            from = %from,
            to = %updated.workflow_state,
            completed = change.completed,
            "compliance workflow state updated"
        );
        Ok(updated)
    }

    /// Schema position of an instance's current state.
    pub fn workflow_progress(&self, id: &ComplianceId) -> TrackerResult<WorkflowProgress> {
        let instance = self.get_by_id(id)?;
        let schema = self.catalog.schema_for(&instance.compliance_type).clone();
        Ok(WorkflowProgress {
            current_index: schema.position(&instance.workflow_state),
            total_steps: schema.len(),
            terminal_reached: WorkflowSchema::is_terminal(&instance.workflow_state),
            compliance_id: instance.id,
            workflow_state: instance.workflow_state,
            schema,
        })
    }

    /// Record a document back reference.
    pub fn link_document(
        &self,
        id: &ComplianceId,
        owner: &EntityId,
        document: DocumentId,
    ) -> TrackerResult<()> {
        let now = Timestamp::now();
        self.records
            .try_update(id, |c| {
                Self::check_owner(c, owner)?;
                c.link_document(document, now);
                Ok::<_, TrackerError>(())
            })
            .ok_or_else(|| TrackerError::not_found(ComplianceId::KIND, id))?
    }

    /// Record a submission back reference.
    pub fn link_submission(
        &self,
        id: &ComplianceId,
        owner: &EntityId,
        submission: SubmissionId,
    ) -> TrackerResult<()> {
        let now = Timestamp::now();
        self.records
            .try_update(id, |c| {
                Self::check_owner(c, owner)?;
                c.link_submission(submission, now);
                Ok::<_, TrackerError>(())
            })
            .ok_or_else(|| TrackerError::not_found(ComplianceId::KIND, id))?
    }

    fn check_owner(instance: &ComplianceInstance, owner: &EntityId) -> TrackerResult<()> {
        if &instance.entity_id != owner {
            return Err(TrackerError::validation(format!(
                "compliance {} belongs to entity {}, not {owner}",
                instance.id, instance.entity_id
            )));
        }
        Ok(())
    }

    pub fn set_metadata(
        &self,
        id: &ComplianceId,
        key: &str,
        value: serde_json::Value,
    ) -> TrackerResult<ComplianceInstance> {
        let now = Timestamp::now();
        self.records
            .update(id, |c| c.set_metadata(key, value, now))
            .ok_or_else(|| TrackerError::not_found(ComplianceId::KIND, id))
    }

    /// Open instances due within the next `window_days`, soonest first.
    pub fn upcoming(&self, window_days: u32) -> Vec<ComplianceInstance> {
        self.upcoming_at(Timestamp::now(), window_days)
    }

    pub fn upcoming_at(&self, now: Timestamp, window_days: u32) -> Vec<ComplianceInstance> {
        let until = now.plus_days(u64::from(window_days));
        let mut due = self.records.filter(|c| c.is_upcoming_at(now, until));
        due.sort_by_key(|c| c.due_date);
        due
    }

    /// Open instances past their due date, most overdue first.
    pub fn overdue(&self) -> Vec<ComplianceInstance> {
        self.overdue_at(Timestamp::now())
    }

    pub fn overdue_at(&self, now: Timestamp) -> Vec<ComplianceInstance> {
        let mut late = self.records.filter(|c| c.is_overdue_at(now));
        late.sort_by_key(|c| c.due_date);
        late
    }

    /// Counts over one entity's instances, or over all when `entity_id` is `None`.
    pub fn stats(&self, entity_id: Option<&EntityId>) -> ComplianceStats {
        self.stats_at(entity_id, Timestamp::now())
    }

    pub fn stats_at(&self, entity_id: Option<&EntityId>, now: Timestamp) -> ComplianceStats {
        let scope = self
            .records
            .filter(|c| entity_id.map_or(true, |e| &c.entity_id == e));

        let count = |status: ComplianceStatus| scope.iter().filter(|c| c.status == status).count();
        let total = scope.len();
        let completed = count(ComplianceStatus::Completed);
        let completion_rate = if total == 0 {
            0.0
        } else {
            100.0 * completed as f64 / total as f64
        };

        ComplianceStats {
            total,
            completed,
            in_progress: count(ComplianceStatus::InProgress),
            pending: count(ComplianceStatus::Pending),
            overdue: scope.iter().filter(|c| c.is_overdue_at(now)).count(),
            completion_rate,
        }
    }

    /// Replace all records, e.g. from a snapshot.
    pub fn hydrate(&self, records: Vec<ComplianceInstance>) {
        self.records.replace_all(records);
    }

    pub fn snapshot(&self) -> Vec<ComplianceInstance> {
        self.records.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrk_core::{ComplianceTypeCode, Period};

    fn store(coupling: StatusCoupling) -> ComplianceInstanceStore {
        ComplianceInstanceStore::new(Arc::new(Catalog::builtin().unwrap()), coupling)
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn user() -> Option<UserId> {
        Some(UserId::new("user-001").unwrap())
    }

    fn cmd(entity: &str, code: &str, due: &str) -> NewCompliance {
        NewCompliance::new(
            EntityId::new(entity).unwrap(),
            ComplianceTypeCode::new(code).unwrap(),
            ts(due),
        )
    }

    #[test]
    fn create_uses_schema_first_step() {
        let s = store(StatusCoupling::Independent);
        let c = s
            .create(cmd("ent-001", "GST_MONTHLY_RETURN", "2024-07-20"))
            .unwrap();
        assert_eq!(c.workflow_state, "DATA_COLLECTION");
        assert_eq!(c.status, ComplianceStatus::Pending);
        assert_eq!(s.get_by_id(&c.id).unwrap(), c);
    }

    #[test]
    fn create_checks_period_against_catalog_frequency() {
        let s = store(StatusCoupling::Independent);
        let bad = cmd("ent-001", "GST_MONTHLY_RETURN", "2024-07-20")
            .with_period(Period::FinancialYear("2023-24".into()));
        assert!(matches!(s.create(bad), Err(TrackerError::Validation(_))));
        assert!(s.list_all().is_empty());

        let good = cmd("ent-001", "GST_MONTHLY_RETURN", "2024-07-20")
            .with_period(Period::ReturnPeriod("2024-06".into()));
        assert!(s.create(good).is_ok());
    }

    #[test]
    fn uncatalogued_type_uses_default_schema() {
        let s = store(StatusCoupling::Independent);
        let c = s.create(cmd("ent-001", "STATE_PROFESSIONAL_TAX", "2024-07-20")).unwrap();
        assert_eq!(c.workflow_state, "DATA_COLLECTION");
        let progress = s.workflow_progress(&c.id).unwrap();
        assert_eq!(progress.total_steps, 6);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let s = store(StatusCoupling::Independent);
        let missing = ComplianceId::new("nope").unwrap();
        assert!(matches!(
            s.update_status(&missing, ComplianceStatus::Completed, None),
            Err(TrackerError::NotFound { kind: "compliance", .. })
        ));
        assert!(matches!(
            s.update_workflow_state(&missing, "FILED", None),
            Err(TrackerError::NotFound { .. })
        ));
        assert!(s.get_by_id(&missing).is_err());
    }

    #[test]
    fn workflow_then_status_builds_history() {
        let s = store(StatusCoupling::Independent);
        let c = s
            .create(cmd("ent-001", "MCA_ANNUAL_RETURN", "2023-11-29T23:59:59Z"))
            .unwrap();
        s.update_workflow_state(&c.id, "FILED", user()).unwrap();
        let done = s
            .update_status(&c.id, ComplianceStatus::Completed, user())
            .unwrap();
        let states: Vec<_> = done.history.iter().map(|h| h.state.as_str()).collect();
        assert_eq!(states, ["DATA_COLLECTION", "FILED", "COMPLETED"]);
        assert_eq!(done.workflow_state, "FILED");
    }

    #[test]
    fn backward_move_is_applied_and_flagged() {
        let s = store(StatusCoupling::Independent);
        let c = s
            .create(cmd("ent-001", "MCA_ANNUAL_RETURN", "2023-11-29"))
            .unwrap();
        s.update_workflow_state(&c.id, "DSC_SIGNING", None).unwrap();
        let back = s
            .update_workflow_state(&c.id, "INTERNAL_REVIEW", None)
            .unwrap();
        assert_eq!(back.workflow_state, "INTERNAL_REVIEW");
        assert!(back.history.last().unwrap().backward);
    }

    #[test]
    fn coupling_completes_on_acknowledged() {
        let s = store(StatusCoupling::AcknowledgedCompletes);
        let c = s
            .create(cmd("ent-001", "MCA_ANNUAL_RETURN", "2023-11-29"))
            .unwrap();
        let acked = s.update_workflow_state(&c.id, "ACKNOWLEDGED", None).unwrap();
        assert_eq!(acked.status, ComplianceStatus::Completed);
        let progress = s.workflow_progress(&c.id).unwrap();
        assert!(progress.terminal_reached);
        assert_eq!(progress.current_index, Some(6));
    }

    #[test]
    fn upcoming_and_overdue_are_sorted_and_exclude_completed() {
        let s = store(StatusCoupling::Independent);
        let now = ts("2024-07-01");
        let late_b = s.create(cmd("ent-001", "GST_MONTHLY_RETURN", "2024-06-20")).unwrap();
        let late_a = s.create(cmd("ent-001", "TDS_MONTHLY_PAYMENT", "2024-06-07")).unwrap();
        let soon_b = s.create(cmd("ent-001", "GST_OUTWARD_SUPPLIES", "2024-07-11")).unwrap();
        let soon_a = s.create(cmd("ent-001", "TDS_MONTHLY_PAYMENT", "2024-07-07")).unwrap();
        s.create(cmd("ent-001", "INCOME_TAX_RETURN", "2024-10-31")).unwrap();
        let done = s.create(cmd("ent-001", "PF_MONTHLY_RETURN", "2024-06-15")).unwrap();
        s.update_status(&done.id, ComplianceStatus::Completed, None).unwrap();

        let overdue: Vec<_> = s.overdue_at(now).into_iter().map(|c| c.id).collect();
        assert_eq!(overdue, [late_a.id, late_b.id]);

        let upcoming: Vec<_> = s.upcoming_at(now, 30).into_iter().map(|c| c.id).collect();
        assert_eq!(upcoming, [soon_a.id, soon_b.id]);
    }

    #[test]
    fn upcoming_window_is_inclusive() {
        let s = store(StatusCoupling::Independent);
        let now = ts("2024-07-01");
        s.create(cmd("ent-001", "GST_MONTHLY_RETURN", "2024-07-31")).unwrap();
        assert_eq!(s.upcoming_at(now, 30).len(), 1);
        assert!(s.upcoming_at(now, 29).is_empty());
    }

    #[test]
    fn stats_for_empty_entity_is_zero() {
        let s = store(StatusCoupling::Independent);
        let stats = s.stats(Some(&EntityId::new("ent-404").unwrap()));
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn stats_are_scoped_by_entity() {
        let s = store(StatusCoupling::Independent);
        let now = ts("2024-07-01");
        let a = s.create(cmd("ent-001", "GST_MONTHLY_RETURN", "2024-06-20")).unwrap();
        s.create(cmd("ent-001", "TDS_MONTHLY_PAYMENT", "2024-07-07")).unwrap();
        s.create(cmd("ent-002", "LLP_ANNUAL_RETURN", "2024-05-30")).unwrap();
        s.update_status(&a.id, ComplianceStatus::InProgress, None).unwrap();

        let stats = s.stats_at(Some(&EntityId::new("ent-001").unwrap()), now);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.overdue, 1);

        let all = s.stats_at(None, now);
        assert_eq!(all.total, 3);
        assert_eq!(all.overdue, 2);
    }

    #[test]
    fn links_and_metadata() {
        let s = store(StatusCoupling::Independent);
        let c = s.create(cmd("ent-001", "GST_MONTHLY_RETURN", "2024-07-20")).unwrap();
        s.link_document(&c.id, &c.entity_id, DocumentId::new("doc-1").unwrap())
            .unwrap();
        s.link_submission(&c.id, &c.entity_id, SubmissionId::new("sub-1").unwrap())
            .unwrap();
        let updated = s
            .set_metadata(&c.id, "arn", serde_json::json!("AA0707240001234"))
            .unwrap();
        assert_eq!(updated.documents.len(), 1);
        assert_eq!(updated.submissions.len(), 1);
        assert_eq!(updated.metadata["arn"], "AA0707240001234");
        assert_eq!(updated.history.len(), 1);
    }

    #[test]
    fn hydrate_replaces_contents() {
        let s = store(StatusCoupling::Independent);
        let c = s.create(cmd("ent-001", "GST_MONTHLY_RETURN", "2024-07-20")).unwrap();
        let other = store(StatusCoupling::Independent);
        other.hydrate(s.snapshot());
        assert_eq!(other.get_by_id(&c.id).unwrap(), c);
    }
}
