//! Demo data.
//!
//! Three entities with subscriptions and a spread of compliance instances
//! (upcoming, overdue, in progress, completed) so every dashboard query has
//! something to show. Due dates are relative to the time of seeding.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ctrk_core::{
    ComplianceId, ComplianceTypeCode, Entity, EntityId, EntityType, Period, RegistrationKind,
    ServiceCode, Timestamp, TrackerResult, UserId,
};
use ctrk_state::{
    Acknowledgment, ComplianceStatus, DocumentStatus, FileMetadata, NewCompliance, NewDocument,
    NewSubmission, NewSubscription, SubmissionPatch, SubmissionStatus, Timeline,
};

use crate::tracker::Tracker;

/// Populate `tracker` with the demo dataset.
///
/// Does nothing if `ent-001` is already registered, so it is safe to call
/// after loading a snapshot.
pub fn demo(tracker: &Tracker) -> TrackerResult<()> {
    let acme_id = EntityId::new("ent-001")?;
    if tracker.entities.get(&acme_id).is_ok() {
        tracing::info!("demo data already present, skipping seed");
        return Ok(());
    }

    let now = Timestamp::now();
    let staff = UserId::new("user-001")?;
    let reviewer = UserId::new("user-002")?;

    let acme = tracker.entities.register(
        Entity::new(acme_id, "Acme Technologies Pvt Ltd", EntityType::PrivateLimited)
            .with_registration(RegistrationKind::Cin, "U72900KA2019PTC123456")
            .with_registration(RegistrationKind::Gst, "29AABCA1234C1Z5")
            .with_registration(RegistrationKind::Pan, "AABCA1234C")
            .with_incorporation_date(ymd(2019, 4, 15)),
    )?;
    let verma = tracker.entities.register(
        Entity::new(
            EntityId::new("ent-002")?,
            "Verma & Associates LLP",
            EntityType::Llp,
        )
        .with_registration(RegistrationKind::Gst, "07AAKFV5678M1Z2")
        .with_registration(RegistrationKind::Pan, "AAKFV5678M")
        .with_incorporation_date(ymd(2020, 8, 1)),
    )?;
    let sharma = tracker.entities.register(
        Entity::new(
            EntityId::new("ent-003")?,
            "Sharma Traders",
            EntityType::Proprietorship,
        )
        .with_registration(RegistrationKind::Pan, "ABCPS1234D"),
    )?;

    for (entity, service) in [
        (&acme, "COMPLETE_COMPLIANCE_BUNDLE"),
        (&verma, "LLP_COMPLIANCE_PACKAGE"),
        (&verma, "GST_FILING_SERVICE"),
        (&sharma, "INCOME_TAX_SERVICE"),
    ] {
        tracker.subscribe(NewSubscription::new(
            entity.id.clone(),
            ServiceCode::new(service)?,
        ))?;
    }

    let open = |entity: &Entity, code: &str, due: Timestamp, period: Period| -> TrackerResult<ComplianceId> {
        let cmd = NewCompliance::new(entity.id.clone(), ComplianceTypeCode::new(code)?, due)
            .with_period(period)
            .with_assignee(staff.clone());
        Ok(tracker.compliances.create(cmd)?.id)
    };

    let annual_return = open(
        &acme,
        "MCA_ANNUAL_RETURN",
        now.plus_days(20),
        Period::FinancialYear("2023-24".into()),
    )?;
    tracker
        .compliances
        .update_workflow_state(&annual_return, "INTERNAL_REVIEW", Some(staff.clone()))?;
    tracker.compliances.update_status(
        &annual_return,
        ComplianceStatus::InProgress,
        Some(staff.clone()),
    )?;

    open(
        &acme,
        "GST_MONTHLY_RETURN",
        now.plus_days(5),
        Period::ReturnPeriod("2024-06".into()),
    )?;
    open(
        &acme,
        "TDS_MONTHLY_PAYMENT",
        now.minus_days(3),
        Period::ReturnPeriod("2024-06".into()),
    )?;

    let income_tax = open(
        &acme,
        "INCOME_TAX_RETURN",
        now.minus_days(40),
        Period::AssessmentYear("2024-25".into()),
    )?;
    tracker
        .compliances
        .update_workflow_state(&income_tax, "ACKNOWLEDGED", Some(staff.clone()))?;
    tracker
        .compliances
        .update_status(&income_tax, ComplianceStatus::Completed, Some(staff.clone()))?;

    open(
        &verma,
        "LLP_ANNUAL_RETURN",
        now.plus_days(45),
        Period::FinancialYear("2023-24".into()),
    )?;
    let llp_gst = open(
        &verma,
        "GST_MONTHLY_RETURN",
        now.plus_days(5),
        Period::ReturnPeriod("2024-06".into()),
    )?;
    tracker
        .compliances
        .update_status(&llp_gst, ComplianceStatus::InProgress, Some(staff.clone()))?;

    open(
        &sharma,
        "INCOME_TAX_RETURN",
        now.plus_days(60),
        Period::AssessmentYear("2024-25".into()),
    )?;

    let resolution = tracker.documents.add(NewDocument {
        entity_id: acme.id.clone(),
        compliance_id: Some(annual_return),
        document_type: "BOARD_RESOLUTION".into(),
        file: FileMetadata {
            file_name: "board-resolution-2024.pdf".into(),
            size_bytes: 245_760,
            mime_type: "application/pdf".into(),
        },
        uploaded_by: Some(staff.clone()),
    })?;
    tracker.documents.update_status(
        &resolution.id,
        DocumentStatus::Verified,
        Some(reviewer),
        Some("Signed by both directors".into()),
    )?;

    let filing = tracker.submissions.create(NewSubmission {
        entity_id: acme.id.clone(),
        compliance_id: income_tax,
        portal: "INCOME_TAX_EFILING".into(),
        form_type: "ITR-6".into(),
        reference_ids: BTreeMap::new(),
    })?;
    let acknowledged_at = now.minus_days(42);
    tracker.submissions.update(
        &filing.id,
        SubmissionPatch {
            status: Some(SubmissionStatus::Acknowledged),
            timeline: Some(Timeline {
                submitted: Some(now.minus_days(43)),
                acknowledged: Some(acknowledged_at),
                ..Timeline::default()
            }),
            acknowledgment: Some(Acknowledgment {
                number: "274512345678901".into(),
                received_at: acknowledged_at,
                document_id: None,
            }),
            ..SubmissionPatch::default()
        },
    )?;

    tracing::info!(
        entities = tracker.entities.list().len(),
        compliances = tracker.compliances.list_all().len(),
        "demo data seeded"
    );
    Ok(())
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
