//! The assembled tracker: one instance of every store, sharing a catalog.
//!
//! Built once at startup and handed to whoever needs it. There are no
//! process-wide singletons.

use std::path::Path;
use std::sync::Arc;

use ctrk_catalog::{ApplicableCompliance, Catalog};
use ctrk_core::{Entity, EntityId, SubscriptionId, TrackerResult};
use ctrk_state::{
    ComplianceInstance, Document, NewSubscription, StatusCoupling, Submission, Subscription,
    SubscriptionPatch,
};

use crate::compliance::ComplianceInstanceStore;
use crate::document::DocumentTracker;
use crate::entity::EntityDirectory;
use crate::snapshot::{JsonFileSnapshot, SnapshotResult, SnapshotStore};
use crate::submission::SubmissionTracker;
use crate::subscription::SubscriptionRegistry;

#[derive(Debug, Clone)]
pub struct Tracker {
    pub catalog: Arc<Catalog>,
    pub entities: EntityDirectory,
    pub subscriptions: SubscriptionRegistry,
    pub compliances: ComplianceInstanceStore,
    pub documents: DocumentTracker,
    pub submissions: SubmissionTracker,
}

impl Tracker {
    pub fn new(catalog: Arc<Catalog>, coupling: StatusCoupling) -> Self {
        let compliances = ComplianceInstanceStore::new(Arc::clone(&catalog), coupling);
        Self {
            entities: EntityDirectory::new(),
            subscriptions: SubscriptionRegistry::new(Arc::clone(&catalog)),
            documents: DocumentTracker::new(compliances.clone()),
            submissions: SubmissionTracker::new(compliances.clone()),
            compliances,
            catalog,
        }
    }

    /// Look up an entity in the directory.
    pub fn entity(&self, id: &EntityId) -> TrackerResult<Entity> {
        self.entities.get(id)
    }

    /// Run the applicability engine for a registered entity.
    pub fn applicable_compliances(&self, id: &EntityId) -> TrackerResult<Vec<ApplicableCompliance>> {
        let entity = self.entities.get(id)?;
        Ok(self
            .catalog
            .applicability()
            .compute_applicable_compliances(&entity))
    }

    /// Subscribe a registered entity. Initial exclusions may not name a
    /// type that is mandatory for it.
    pub fn subscribe(&self, cmd: NewSubscription) -> TrackerResult<Subscription> {
        let entity = self.entities.get(&cmd.entity_id)?;
        self.subscriptions
            .refuse_mandatory(&entity, &cmd.customizations.excluded_compliances)?;
        self.subscriptions.subscribe_to_service(cmd)
    }

    /// Patch a subscription on behalf of its registered entity.
    pub fn update_subscription(
        &self,
        id: &SubscriptionId,
        patch: SubscriptionPatch,
    ) -> TrackerResult<Subscription> {
        let owner = self.entities.get(&self.subscriptions.get(id)?.entity_id)?;
        self.subscriptions.update_subscription(id, patch, &owner)
    }

    /// Replace every store's contents with the snapshots in `dir`.
    ///
    /// All files are read before any store changes, so a bad file leaves
    /// the tracker as it was.
    pub fn load_from(&self, dir: &Path) -> SnapshotResult<()> {
        let entities = JsonFileSnapshot::<Entity>::in_dir(dir, "entities").load_all()?;
        let subscriptions =
            JsonFileSnapshot::<Subscription>::in_dir(dir, "subscriptions").load_all()?;
        let compliances =
            JsonFileSnapshot::<ComplianceInstance>::in_dir(dir, "compliances").load_all()?;
        let documents = JsonFileSnapshot::<Document>::in_dir(dir, "documents").load_all()?;
        let submissions = JsonFileSnapshot::<Submission>::in_dir(dir, "submissions").load_all()?;

        self.entities.hydrate(entities);
        self.subscriptions.hydrate(subscriptions);
        self.compliances.hydrate(compliances);
        self.documents.hydrate(documents);
        self.submissions.hydrate(submissions);
        tracing::info!(
            dir = %dir.display(),
            entities = self.entities.list().len(),
            compliances = self.compliances.list_all().len(),
            "tracker state loaded"
        );
        Ok(())
    }

    /// Write every store to `dir`, one file each.
    pub fn save_to(&self, dir: &Path) -> SnapshotResult<()> {
        JsonFileSnapshot::<Entity>::in_dir(dir, "entities").save_all(&self.entities.snapshot())?;
        JsonFileSnapshot::<Subscription>::in_dir(dir, "subscriptions").save_all(&self.subscriptions.snapshot())?;
        JsonFileSnapshot::<ComplianceInstance>::in_dir(dir, "compliances").save_all(&self.compliances.snapshot())?;
        JsonFileSnapshot::<Document>::in_dir(dir, "documents").save_all(&self.documents.snapshot())?;
        JsonFileSnapshot::<Submission>::in_dir(dir, "submissions").save_all(&self.submissions.snapshot())?;
        tracing::info!(dir = %dir.display(), "tracker state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn tracker() -> Tracker {
        Tracker::new(Arc::new(Catalog::builtin().unwrap()), StatusCoupling::Independent)
    }

    #[test]
    fn save_and_load_round_trip_all_stores() {
        let dir = tempfile::tempdir().unwrap();
        let original = tracker();
        seed::demo(&original).unwrap();
        original.save_to(dir.path()).unwrap();

        let restored = tracker();
        restored.load_from(dir.path()).unwrap();
        assert_eq!(restored.entities.list(), original.entities.list());
        assert_eq!(restored.subscriptions.snapshot(), original.subscriptions.snapshot());
        assert_eq!(restored.compliances.list_all(), original.compliances.list_all());
        assert_eq!(restored.documents.snapshot(), original.documents.snapshot());
        assert_eq!(restored.submissions.snapshot(), original.submissions.snapshot());
    }

    #[test]
    fn load_from_empty_dir_yields_empty_stores() {
        let dir = tempfile::tempdir().unwrap();
        let t = tracker();
        t.load_from(dir.path()).unwrap();
        assert!(t.entities.list().is_empty());
    }

    #[test]
    fn corrupt_snapshot_leaves_every_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let seeded = tracker();
        seed::demo(&seeded).unwrap();
        seeded.save_to(dir.path()).unwrap();
        std::fs::write(dir.path().join("submissions.json"), "{ not json").unwrap();

        let t = tracker();
        t.entities
            .register(Entity::new(
                EntityId::new("ent-keep").unwrap(),
                "Kept Ltd",
                ctrk_core::EntityType::PrivateLimited,
            ))
            .unwrap();
        assert!(t.load_from(dir.path()).is_err());
        let ids: Vec<_> = t.entities.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, [EntityId::new("ent-keep").unwrap()]);
        assert!(t.subscriptions.snapshot().is_empty());
        assert!(t.compliances.list_all().is_empty());
    }

    #[test]
    fn subscription_commands_respect_mandatory_types() {
        let t = tracker();
        seed::demo(&t).unwrap();
        let acme = EntityId::new("ent-001").unwrap();
        let gst = ctrk_core::ComplianceTypeCode::new("GST_MONTHLY_RETURN").unwrap();
        let mut customizations = ctrk_state::Customizations::default();
        customizations.disable(&gst);

        let subscribe = t.subscribe(
            NewSubscription::new(
                acme.clone(),
                ctrk_core::ServiceCode::new("GST_FILING_SERVICE").unwrap(),
            )
            .with_customizations(customizations.clone()),
        );
        assert!(matches!(subscribe, Err(ctrk_core::TrackerError::IllegalOperation(_))));

        let existing = t.subscriptions.get_active_subscriptions(&acme)[0].clone();
        let patch = t.update_subscription(
            &existing.id,
            SubscriptionPatch {
                customizations: Some(customizations),
                ..Default::default()
            },
        );
        assert!(matches!(patch, Err(ctrk_core::TrackerError::IllegalOperation(_))));
        assert_eq!(t.subscriptions.get(&existing.id).unwrap(), existing);
        assert!(t.subscriptions.get_subscribed_compliance_types(&acme).contains(&gst));
    }

    #[test]
    fn subscribe_requires_registered_entity() {
        let t = tracker();
        let result = t.subscribe(NewSubscription::new(
            EntityId::new("ent-404").unwrap(),
            ctrk_core::ServiceCode::new("TDS_SERVICE").unwrap(),
        ));
        assert!(matches!(result, Err(ctrk_core::TrackerError::NotFound { .. })));
    }

    #[test]
    fn applicable_compliances_requires_registered_entity() {
        let t = tracker();
        assert!(t
            .applicable_compliances(&EntityId::new("ent-404").unwrap())
            .is_err());
    }
}
