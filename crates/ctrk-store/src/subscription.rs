//! # Subscription Registry
//!
//! Entity subscriptions to catalog services, and the derived view of which
//! compliance types an entity is signed up for.
//!
//! The subscribed set is computed per active subscription as
//! `service bundle − excluded ∪ additional` and unioned across
//! subscriptions, so a type covered twice appears once.
//!
//! Toggling a compliance type for an entity rewrites the customizations of
//! all of its active subscriptions under one write lock. Mandatory types
//! (per the applicability engine) cannot be disabled.

use std::collections::BTreeSet;
use std::sync::Arc;

use ctrk_catalog::{ApplicableCompliance, Catalog, DueDateCalculation, Service};
use ctrk_core::{
    ComplianceTypeCode, Entity, EntityId, ServiceCode, SubscriptionId, Timestamp, TrackerError,
    TrackerResult,
};
use ctrk_state::{NewSubscription, Subscription, SubscriptionPatch};
use serde::Serialize;

use crate::store::Store;

/// One line of an entity's compliance resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCompliance {
    pub compliance_type: ComplianceTypeCode,
    /// A rule makes this type applicable to the entity.
    pub applicable: bool,
    pub mandatory: bool,
    /// Covered by an active subscription.
    pub subscribed: bool,
    /// Tracked for the entity: mandatory or subscribed.
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date_calculation: Option<DueDateCalculation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exemptions: Vec<String>,
}

/// Registry of subscriptions.
#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    records: Store<Subscription>,
    catalog: Arc<Catalog>,
}

impl SubscriptionRegistry {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            records: Store::new(),
            catalog,
        }
    }

    pub fn get(&self, id: &SubscriptionId) -> TrackerResult<Subscription> {
        self.records
            .get(id)
            .ok_or_else(|| TrackerError::not_found(SubscriptionId::KIND, id))
    }

    /// Every subscription of an entity, any status.
    pub fn list_for_entity(&self, entity_id: &EntityId) -> Vec<Subscription> {
        self.records.filter(|s| &s.entity_id == entity_id)
    }

    pub fn get_active_subscriptions(&self, entity_id: &EntityId) -> Vec<Subscription> {
        self.records
            .filter(|s| &s.entity_id == entity_id && s.is_active())
    }

    pub fn has_service_subscription(&self, entity_id: &EntityId, service: &ServiceCode) -> bool {
        self.records
            .any(|s| &s.entity_id == entity_id && &s.service_code == service && s.is_active())
    }

    /// Union of compliance types covered by the entity's active subscriptions.
    pub fn get_subscribed_compliance_types(
        &self,
        entity_id: &EntityId,
    ) -> BTreeSet<ComplianceTypeCode> {
        let mut types = BTreeSet::new();
        for sub in self.get_active_subscriptions(entity_id) {
            let service = self.catalog.service(&sub.service_code);
            if service.is_none() {
                tracing::warn!(
                    subscription_id = %sub.id,
                    service_code = %sub.service_code,
                    "subscription references unknown service; only additions apply"
                );
            }
            types.extend(sub.compliance_types(service));
        }
        types
    }

    /// Create an `ACTIVE` subscription. The entity and service are not
    /// checked for existence.
    pub fn subscribe_to_service(&self, cmd: NewSubscription) -> TrackerResult<Subscription> {
        let sub = Subscription::open(cmd, Timestamp::now())?;
        self.records.insert(sub.clone());
        tracing::info!(
            subscription_id = %sub.id,
            entity_id = %sub.entity_id,
            service_code = %sub.service_code,
            "subscription created"
        );
        Ok(sub)
    }

    /// Merge a typed patch. Last writer wins.
    ///
    /// `owner` is the subscription's entity. Replacement customizations
    /// may not exclude a type that is mandatory for it.
    pub fn update_subscription(
        &self,
        id: &SubscriptionId,
        patch: SubscriptionPatch,
        owner: &Entity,
    ) -> TrackerResult<Subscription> {
        let now = Timestamp::now();
        let updated = self
            .records
            .try_update(id, |s| {
                if s.entity_id != owner.id {
                    return Err(TrackerError::validation(format!(
                        "subscription {id} does not belong to entity {}",
                        owner.id
                    )));
                }
                if let Some(ref customizations) = patch.customizations {
                    self.refuse_mandatory(owner, &customizations.excluded_compliances)?;
                }
                s.apply(patch, now)?;
                Ok::<_, TrackerError>(s.clone())
            })
            .ok_or_else(|| TrackerError::not_found(SubscriptionId::KIND, id))??;
        tracing::info!(subscription_id = %id, status = %updated.status, "subscription updated");
        Ok(updated)
    }

    /// Cancel with a reason. The record is kept.
    pub fn cancel_subscription(
        &self,
        id: &SubscriptionId,
        reason: &str,
    ) -> TrackerResult<Subscription> {
        let now = Timestamp::now();
        let cancelled = self
            .records
            .try_update(id, |s| {
                s.cancel(reason, now)?;
                Ok::<_, TrackerError>(s.clone())
            })
            .ok_or_else(|| TrackerError::not_found(SubscriptionId::KIND, id))??;
        tracing::info!(subscription_id = %id, reason, "subscription cancelled");
        Ok(cancelled)
    }

    /// Fail with `IllegalOperation` if any of `excluded` is mandatory for
    /// `entity`.
    pub fn refuse_mandatory<'a>(
        &self,
        entity: &Entity,
        excluded: impl IntoIterator<Item = &'a ComplianceTypeCode>,
    ) -> TrackerResult<()> {
        let engine = self.catalog.applicability();
        match excluded.into_iter().find(|code| engine.is_mandatory(entity, code)) {
            Some(code) => {
                tracing::warn!(
                    entity_id = %entity.id,
                    compliance_type = %code,
                    "refused to disable mandatory compliance type"
                );
                Err(TrackerError::illegal(format!(
                    "{code} is mandatory for entity {} and cannot be disabled",
                    entity.id
                )))
            }
            None => Ok(()),
        }
    }

    /// Services for the entity's type it is not already actively
    /// subscribed to, recommended first, then popular, then cheapest.
    pub fn get_service_recommendations(&self, entity: &Entity) -> Vec<Service> {
        let mut candidates: Vec<Service> = self
            .catalog
            .services()
            .iter()
            .filter(|s| s.applies_to(entity.entity_type))
            .filter(|s| !self.has_service_subscription(&entity.id, &s.code))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            b.recommended
                .cmp(&a.recommended)
                .then(b.popular.cmp(&a.popular))
                .then(a.pricing.annual.cmp(&b.pricing.annual))
        });
        candidates
    }

    /// Enable or disable a compliance type across all of the entity's
    /// active subscriptions.
    ///
    /// Disabling a type that is mandatory for the entity fails with
    /// `IllegalOperation` and changes nothing. Repeating a call is a no-op.
    /// Returns the updated subscriptions.
    pub fn set_compliance_type_enabled(
        &self,
        entity: &Entity,
        code: &ComplianceTypeCode,
        enabled: bool,
    ) -> TrackerResult<Vec<Subscription>> {
        if !enabled {
            self.refuse_mandatory(entity, [code])?;
        }

        let now = Timestamp::now();
        let updated = self.records.update_where(
            |s| s.entity_id == entity.id && s.is_active(),
            |s| {
                let changed = if enabled {
                    s.customizations.enable(code)
                } else {
                    s.customizations.disable(code)
                };
                if changed {
                    s.updated_at = now;
                }
            },
        );

        if updated.is_empty() {
            tracing::debug!(
                entity_id = %entity.id,
                compliance_type = %code,
                "no active subscriptions to toggle"
            );
        } else {
            tracing::info!(
                entity_id = %entity.id,
                compliance_type = %code,
                enabled,
                subscriptions = updated.len(),
                "compliance type toggled"
            );
        }
        Ok(updated)
    }

    /// The entity's tracked compliance view.
    ///
    /// Every applicable type in rule order, marked active when mandatory or
    /// subscribed; then subscribed types no rule makes applicable.
    pub fn resolve_compliances(&self, entity: &Entity) -> Vec<ResolvedCompliance> {
        let applicable = self
            .catalog
            .applicability()
            .compute_applicable_compliances(entity);
        let mut subscribed = self.get_subscribed_compliance_types(&entity.id);

        let mut resolved: Vec<ResolvedCompliance> = applicable
            .into_iter()
            .map(|a: ApplicableCompliance| {
                let is_subscribed = subscribed.remove(&a.compliance_type);
                ResolvedCompliance {
                    active: a.mandatory || is_subscribed,
                    applicable: true,
                    mandatory: a.mandatory,
                    subscribed: is_subscribed,
                    due_date_calculation: Some(a.due_date_calculation),
                    exemptions: a.exemptions,
                    compliance_type: a.compliance_type,
                }
            })
            .collect();

        resolved.extend(subscribed.into_iter().map(|code| ResolvedCompliance {
            due_date_calculation: self
                .catalog
                .compliance_type(&code)
                .map(|ct| ct.deadline.clone()),
            compliance_type: code,
            applicable: false,
            mandatory: false,
            subscribed: true,
            active: true,
            exemptions: Vec::new(),
        }));
        resolved
    }

    pub fn hydrate(&self, records: Vec<Subscription>) {
        self.records.replace_all(records);
    }

    pub fn snapshot(&self) -> Vec<Subscription> {
        self.records.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrk_core::{EntityType, RegistrationKind};
    use ctrk_state::{Customizations, SubscriptionStatus};

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(Arc::new(Catalog::builtin().unwrap()))
    }

    fn code(s: &str) -> ComplianceTypeCode {
        ComplianceTypeCode::new(s).unwrap()
    }

    fn service(s: &str) -> ServiceCode {
        ServiceCode::new(s).unwrap()
    }

    fn company() -> Entity {
        Entity::new(
            EntityId::new("ent-001").unwrap(),
            "Acme Technologies Pvt Ltd",
            EntityType::PrivateLimited,
        )
        .with_registration(RegistrationKind::Cin, "U72900KA2019PTC123456")
        .with_registration(RegistrationKind::Gst, "29AABCA1234C1Z5")
        .with_registration(RegistrationKind::Pan, "AABCA1234C")
    }

    fn subscribe(r: &SubscriptionRegistry, entity: &Entity, svc: &str) -> Subscription {
        r.subscribe_to_service(NewSubscription::new(entity.id.clone(), service(svc)))
            .unwrap()
    }

    #[test]
    fn subscribed_types_follow_active_subscriptions() {
        let r = registry();
        let e = company();
        let gst = subscribe(&r, &e, "GST_FILING_SERVICE");
        subscribe(&r, &e, "INCOME_TAX_SERVICE");

        let types = r.get_subscribed_compliance_types(&e.id);
        assert!(types.contains(&code("GST_MONTHLY_RETURN")));
        assert!(types.contains(&code("INCOME_TAX_RETURN")));
        assert!(r.has_service_subscription(&e.id, &service("GST_FILING_SERVICE")));

        r.cancel_subscription(&gst.id, "moved in-house").unwrap();
        let types = r.get_subscribed_compliance_types(&e.id);
        assert!(!types.contains(&code("GST_MONTHLY_RETURN")));
        assert!(!r.has_service_subscription(&e.id, &service("GST_FILING_SERVICE")));
        assert_eq!(r.list_for_entity(&e.id).len(), 2);
        assert_eq!(r.get_active_subscriptions(&e.id).len(), 1);
    }

    #[test]
    fn overlapping_bundles_are_deduplicated() {
        let r = registry();
        let e = company();
        subscribe(&r, &e, "MCA_COMPLIANCE_PACKAGE");
        subscribe(&r, &e, "COMPLETE_COMPLIANCE_BUNDLE");
        let types = r.get_subscribed_compliance_types(&e.id);
        assert_eq!(types.len(), 8);
    }

    #[test]
    fn unknown_service_contributes_additions_only() {
        let r = registry();
        let e = company();
        let mut customizations = Customizations::default();
        customizations.enable(&code("PF_MONTHLY_RETURN"));
        r.subscribe_to_service(
            NewSubscription::new(e.id.clone(), service("LEGACY_PLAN"))
                .with_customizations(customizations),
        )
        .unwrap();
        let types = r.get_subscribed_compliance_types(&e.id);
        assert_eq!(types.into_iter().collect::<Vec<_>>(), [code("PF_MONTHLY_RETURN")]);
    }

    #[test]
    fn update_merges_and_refuses_cancel() {
        let r = registry();
        let e = company();
        let s = subscribe(&r, &e, "TDS_SERVICE");
        let updated = r
            .update_subscription(
                &s.id,
                SubscriptionPatch {
                    status: Some(SubscriptionStatus::Suspended),
                    ..Default::default()
                },
                &e,
            )
            .unwrap();
        assert_eq!(updated.status, SubscriptionStatus::Suspended);

        let err = r
            .update_subscription(
                &s.id,
                SubscriptionPatch {
                    status: Some(SubscriptionStatus::Cancelled),
                    ..Default::default()
                },
                &e,
            )
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert_eq!(r.get(&s.id).unwrap().status, SubscriptionStatus::Suspended);

        let missing = SubscriptionId::new("missing").unwrap();
        assert!(matches!(
            r.update_subscription(&missing, SubscriptionPatch::default(), &e),
            Err(TrackerError::NotFound { .. })
        ));
    }

    #[test]
    fn recommendations_rank_and_skip_subscribed() {
        let r = registry();
        let e = company();
        subscribe(&r, &e, "MCA_COMPLIANCE_PACKAGE");
        let codes: Vec<_> = r
            .get_service_recommendations(&e)
            .into_iter()
            .map(|s| s.code.to_string())
            .collect();
        assert!(!codes.contains(&"MCA_COMPLIANCE_PACKAGE".to_string()));
        assert!(!codes.contains(&"LLP_COMPLIANCE_PACKAGE".to_string()));
        assert_eq!(codes[0], "COMPLETE_COMPLIANCE_BUNDLE");
        // Popular, not recommended: cheaper first.
        assert_eq!(codes[1], "INCOME_TAX_SERVICE");
        assert_eq!(codes[2], "GST_FILING_SERVICE");
    }

    #[test]
    fn toggle_rewrites_every_active_subscription() {
        let r = registry();
        let e = company();
        let a = subscribe(&r, &e, "PAYROLL_COMPLIANCE_SERVICE");
        let b = subscribe(&r, &e, "INCOME_TAX_SERVICE");

        let updated = r
            .set_compliance_type_enabled(&e, &code("ESI_MONTHLY_RETURN"), false)
            .unwrap();
        assert_eq!(updated.len(), 2);
        for id in [&a.id, &b.id] {
            let s = r.get(id).unwrap();
            assert!(s.customizations.excluded_compliances.contains(&code("ESI_MONTHLY_RETURN")));
        }
        let types = r.get_subscribed_compliance_types(&e.id);
        assert!(!types.contains(&code("ESI_MONTHLY_RETURN")));
        assert!(types.contains(&code("PF_MONTHLY_RETURN")));

        r.set_compliance_type_enabled(&e, &code("ESI_MONTHLY_RETURN"), true)
            .unwrap();
        let types = r.get_subscribed_compliance_types(&e.id);
        assert!(types.contains(&code("ESI_MONTHLY_RETURN")));
    }

    #[test]
    fn mandatory_type_cannot_be_disabled() {
        let r = registry();
        let e = company();
        let s = subscribe(&r, &e, "GST_FILING_SERVICE");
        let err = r
            .set_compliance_type_enabled(&e, &code("GST_MONTHLY_RETURN"), false)
            .unwrap_err();
        assert!(matches!(err, TrackerError::IllegalOperation(_)));
        assert_eq!(r.get(&s.id).unwrap(), s);
    }

    #[test]
    fn patch_cannot_exclude_mandatory_type() {
        let r = registry();
        let e = company();
        let s = subscribe(&r, &e, "GST_FILING_SERVICE");
        let mut customizations = Customizations::default();
        customizations.disable(&code("GST_MONTHLY_RETURN"));

        let err = r
            .update_subscription(
                &s.id,
                SubscriptionPatch {
                    customizations: Some(customizations),
                    ..Default::default()
                },
                &e,
            )
            .unwrap_err();
        assert!(matches!(err, TrackerError::IllegalOperation(_)));
        assert_eq!(r.get(&s.id).unwrap(), s);
        assert!(r
            .get_subscribed_compliance_types(&e.id)
            .contains(&code("GST_MONTHLY_RETURN")));
    }

    #[test]
    fn patch_may_exclude_optional_type() {
        let r = registry();
        let e = company();
        let s = subscribe(&r, &e, "COMPLETE_COMPLIANCE_BUNDLE");
        let mut customizations = Customizations::default();
        customizations.disable(&code("GST_ANNUAL_RETURN"));

        let updated = r
            .update_subscription(
                &s.id,
                SubscriptionPatch {
                    customizations: Some(customizations),
                    ..Default::default()
                },
                &e,
            )
            .unwrap();
        assert!(updated
            .customizations
            .excluded_compliances
            .contains(&code("GST_ANNUAL_RETURN")));
        assert!(!r
            .get_subscribed_compliance_types(&e.id)
            .contains(&code("GST_ANNUAL_RETURN")));
    }

    #[test]
    fn patch_checks_owner() {
        let r = registry();
        let s = subscribe(&r, &company(), "TDS_SERVICE");
        let stranger = Entity::new(
            EntityId::new("ent-999").unwrap(),
            "Someone Else",
            EntityType::Llp,
        );
        let err = r
            .update_subscription(&s.id, SubscriptionPatch::default(), &stranger)
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[test]
    fn cancelled_subscription_stays_cancelled() {
        let r = registry();
        let e = company();
        let s = subscribe(&r, &e, "GST_FILING_SERVICE");
        let first = r.cancel_subscription(&s.id, "moved").unwrap();

        let reopen = r.update_subscription(
            &s.id,
            SubscriptionPatch {
                status: Some(SubscriptionStatus::Active),
                ..Default::default()
            },
            &e,
        );
        assert!(matches!(reopen, Err(TrackerError::Validation(_))));
        assert!(matches!(
            r.cancel_subscription(&s.id, "again"),
            Err(TrackerError::Validation(_))
        ));

        assert_eq!(r.get(&s.id).unwrap(), first);
        assert!(r.get_active_subscriptions(&e.id).is_empty());
        assert!(!r
            .get_subscribed_compliance_types(&e.id)
            .contains(&code("GST_OUTWARD_SUPPLIES")));
    }

    #[test]
    fn resolution_marks_active_and_appends_extras() {
        let r = registry();
        let shop = Entity::new(
            EntityId::new("ent-003").unwrap(),
            "Sharma Traders",
            EntityType::Proprietorship,
        )
        .with_registration(RegistrationKind::Pan, "ABCPS1234D");
        let mut customizations = Customizations::default();
        customizations.enable(&code("GST_MONTHLY_RETURN"));
        r.subscribe_to_service(
            NewSubscription::new(shop.id.clone(), service("PAYROLL_COMPLIANCE_SERVICE"))
                .with_customizations(customizations),
        )
        .unwrap();

        let resolved = r.resolve_compliances(&shop);
        let itr = resolved
            .iter()
            .find(|c| c.compliance_type == code("INCOME_TAX_RETURN"))
            .unwrap();
        assert!(itr.mandatory && itr.active && !itr.subscribed);

        let pf = resolved
            .iter()
            .find(|c| c.compliance_type == code("PF_MONTHLY_RETURN"))
            .unwrap();
        assert!(!pf.mandatory && pf.subscribed && pf.active);

        let last = resolved.last().unwrap();
        assert_eq!(last.compliance_type, code("GST_MONTHLY_RETURN"));
        assert!(!last.applicable && last.active);
        assert!(last.due_date_calculation.is_some());
    }
}
