//! # Subscriptions
//!
//! An entity's subscription to one catalog service. The compliance types a
//! subscription covers are the service bundle, minus the subscription's
//! exclusions, plus its additions.
//!
//! Only `ACTIVE` subscriptions count towards an entity's subscribed set.
//! Cancelled subscriptions are kept with their reason and time.

use std::collections::BTreeSet;

use ctrk_catalog::Service;
use ctrk_core::{
    ComplianceTypeCode, EntityId, ServiceCode, SubscriptionId, Timestamp, TrackerError,
    TrackerResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Suspended,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Suspended => "SUSPENDED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    #[default]
    Annual,
}

/// Per-subscription adjustments to the service bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Customizations {
    #[serde(default)]
    pub excluded_compliances: BTreeSet<ComplianceTypeCode>,
    #[serde(default)]
    pub additional_compliances: BTreeSet<ComplianceTypeCode>,
}

impl Customizations {
    /// Turn `code` on: drop it from the exclusions and add it to the
    /// additions. Returns whether anything changed.
    pub fn enable(&mut self, code: &ComplianceTypeCode) -> bool {
        let removed = self.excluded_compliances.remove(code);
        let added = self.additional_compliances.insert(code.clone());
        removed || added
    }

    /// Turn `code` off: add it to the exclusions and drop it from the
    /// additions. Returns whether anything changed.
    pub fn disable(&mut self, code: &ComplianceTypeCode) -> bool {
        let added = self.excluded_compliances.insert(code.clone());
        let removed = self.additional_compliances.remove(code);
        added || removed
    }

    /// Apply to a bundle: `bundle − excluded ∪ additional`.
    pub fn apply<'a>(
        &self,
        bundle: impl IntoIterator<Item = &'a ComplianceTypeCode>,
    ) -> BTreeSet<ComplianceTypeCode> {
        bundle
            .into_iter()
            .filter(|code| !self.excluded_compliances.contains(*code))
            .cloned()
            .chain(self.additional_compliances.iter().cloned())
            .collect()
    }
}

/// Command to subscribe an entity to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSubscription {
    pub entity_id: EntityId,
    pub service_code: ServiceCode,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    /// Defaults to the creation instant.
    #[serde(default)]
    pub start_date: Option<Timestamp>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default = "default_auto_renew")]
    pub auto_renew: bool,
    #[serde(default)]
    pub customizations: Customizations,
}

fn default_auto_renew() -> bool {
    true
}

impl NewSubscription {
    pub fn new(entity_id: EntityId, service_code: ServiceCode) -> Self {
        Self {
            entity_id,
            service_code,
            billing_cycle: BillingCycle::default(),
            start_date: None,
            end_date: None,
            auto_renew: true,
            customizations: Customizations::default(),
        }
    }

    pub fn with_customizations(mut self, customizations: Customizations) -> Self {
        self.customizations = customizations;
        self
    }
}

/// Mutable subscription fields. Absent fields are left unchanged.
///
/// Cancellation is not a patch: use the registry's cancel operation so
/// the reason and time are recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionPatch {
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default)]
    pub end_date: Option<Timestamp>,
    #[serde(default)]
    pub auto_renew: Option<bool>,
    /// Replaces the customizations wholesale.
    #[serde(default)]
    pub customizations: Option<Customizations>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub entity_id: EntityId,
    pub service_code: ServiceCode,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    pub start_date: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    pub auto_renew: bool,
    #[serde(default)]
    pub customizations: Customizations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Create an `ACTIVE` subscription.
    pub fn open(cmd: NewSubscription, now: Timestamp) -> TrackerResult<Self> {
        let start_date = cmd.start_date.unwrap_or(now);
        if cmd.end_date.is_some_and(|end| end < start_date) {
            return Err(TrackerError::validation("end_date precedes start_date"));
        }
        Ok(Self {
            id: SubscriptionId::generate(),
            entity_id: cmd.entity_id,
            service_code: cmd.service_code,
            status: SubscriptionStatus::Active,
            billing_cycle: cmd.billing_cycle,
            start_date,
            end_date: cmd.end_date,
            auto_renew: cmd.auto_renew,
            customizations: cmd.customizations,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Compliance types this subscription covers.
    ///
    /// With no service (unknown code) only the additions remain.
    pub fn compliance_types(&self, service: Option<&Service>) -> BTreeSet<ComplianceTypeCode> {
        let bundle = service.map(|s| s.compliance_types.as_slice()).unwrap_or(&[]);
        self.customizations.apply(bundle)
    }

    /// Merge a patch. Validates before touching any field.
    ///
    /// A cancelled subscription is final and accepts no patch.
    pub fn apply(&mut self, patch: SubscriptionPatch, now: Timestamp) -> TrackerResult<()> {
        if self.status == SubscriptionStatus::Cancelled {
            return Err(TrackerError::validation(format!(
                "subscription {} is cancelled",
                self.id
            )));
        }
        if patch.status == Some(SubscriptionStatus::Cancelled) {
            return Err(TrackerError::validation(
                "status CANCELLED cannot be set by update; cancel the subscription instead",
            ));
        }
        if patch.end_date.is_some_and(|end| end < self.start_date) {
            return Err(TrackerError::validation("end_date precedes start_date"));
        }

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(cycle) = patch.billing_cycle {
            self.billing_cycle = cycle;
        }
        if let Some(end) = patch.end_date {
            self.end_date = Some(end);
        }
        if let Some(auto_renew) = patch.auto_renew {
            self.auto_renew = auto_renew;
        }
        if let Some(customizations) = patch.customizations {
            self.customizations = customizations;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Mark cancelled with a reason. The record is retained.
    ///
    /// Cancelling twice fails and keeps the first reason and time.
    pub fn cancel(&mut self, reason: impl Into<String>, now: Timestamp) -> TrackerResult<()> {
        if self.status == SubscriptionStatus::Cancelled {
            return Err(TrackerError::validation(format!(
                "subscription {} is already cancelled",
                self.id
            )));
        }
        self.status = SubscriptionStatus::Cancelled;
        self.cancellation_reason = Some(reason.into());
        self.cancelled_at = Some(now);
        self.auto_renew = false;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ComplianceTypeCode {
        ComplianceTypeCode::new(s).unwrap()
    }

    fn codes(list: &[&str]) -> BTreeSet<ComplianceTypeCode> {
        list.iter().map(|s| code(s)).collect()
    }

    fn subscription() -> Subscription {
        Subscription::open(
            NewSubscription::new(
                EntityId::new("ent-002").unwrap(),
                ServiceCode::new("LLP_COMPLIANCE_PACKAGE").unwrap(),
            ),
            Timestamp::parse("2024-04-01").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn open_forces_active_and_defaults_start() {
        let s = subscription();
        assert!(s.is_active());
        assert_eq!(s.start_date, s.created_at);
        assert!(s.auto_renew);
        assert_eq!(s.billing_cycle, BillingCycle::Annual);
    }

    #[test]
    fn customizations_subtract_then_add() {
        let c = Customizations {
            excluded_compliances: codes(&["B"]),
            additional_compliances: codes(&["C"]),
        };
        let bundle = [code("A"), code("B")];
        assert_eq!(c.apply(&bundle), codes(&["A", "C"]));
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut c = Customizations::default();
        let a = code("A");
        assert!(c.disable(&a));
        assert!(!c.disable(&a));
        assert_eq!(c.excluded_compliances, codes(&["A"]));

        assert!(c.enable(&a));
        assert!(!c.enable(&a));
        assert!(c.excluded_compliances.is_empty());
        assert_eq!(c.additional_compliances, codes(&["A"]));
    }

    #[test]
    fn unknown_service_contributes_only_additions() {
        let mut s = subscription();
        s.customizations.enable(&code("GST_MONTHLY_RETURN"));
        assert_eq!(s.compliance_types(None), codes(&["GST_MONTHLY_RETURN"]));
    }

    #[test]
    fn patch_merges_present_fields() {
        let mut s = subscription();
        let later = Timestamp::parse("2024-05-01").unwrap();
        s.apply(
            SubscriptionPatch {
                billing_cycle: Some(BillingCycle::Quarterly),
                auto_renew: Some(false),
                ..Default::default()
            },
            later,
        )
        .unwrap();
        assert_eq!(s.billing_cycle, BillingCycle::Quarterly);
        assert!(!s.auto_renew);
        assert!(s.is_active());
        assert_eq!(s.updated_at, later);
    }

    #[test]
    fn patch_cannot_cancel() {
        let mut s = subscription();
        let before = s.clone();
        let err = s
            .apply(
                SubscriptionPatch {
                    status: Some(SubscriptionStatus::Cancelled),
                    auto_renew: Some(false),
                    ..Default::default()
                },
                Timestamp::now(),
            )
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert_eq!(s, before);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<SubscriptionPatch, _> =
            serde_json::from_str(r#"{"entity_id": "ent-999"}"#);
        assert!(result.is_err());
        let patch: SubscriptionPatch = serde_json::from_str(r#"{"status": "SUSPENDED"}"#).unwrap();
        assert_eq!(patch.status, Some(SubscriptionStatus::Suspended));
    }

    #[test]
    fn cancel_records_reason_and_time() {
        let mut s = subscription();
        let at = Timestamp::parse("2024-06-01").unwrap();
        s.cancel("switched provider", at).unwrap();
        assert_eq!(s.status, SubscriptionStatus::Cancelled);
        assert_eq!(s.cancellation_reason.as_deref(), Some("switched provider"));
        assert_eq!(s.cancelled_at, Some(at));
        assert!(!s.is_active());
    }

    #[test]
    fn cancelled_is_final() {
        let mut s = subscription();
        s.cancel("moved", Timestamp::parse("2024-06-01").unwrap())
            .unwrap();
        let cancelled = s.clone();

        let reopen = s.apply(
            SubscriptionPatch {
                status: Some(SubscriptionStatus::Active),
                ..Default::default()
            },
            Timestamp::parse("2024-07-01").unwrap(),
        );
        assert!(matches!(reopen, Err(TrackerError::Validation(_))));

        let again = s.cancel("second thoughts", Timestamp::parse("2024-08-01").unwrap());
        assert!(matches!(again, Err(TrackerError::Validation(_))));
        assert_eq!(s, cancelled);
        assert_eq!(s.cancellation_reason.as_deref(), Some("moved"));
    }
}
