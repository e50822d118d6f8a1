//! # Catalog
//!
//! - `GET /v1/catalog/compliance-types`
//! - `GET /v1/catalog/services`
//! - `GET /v1/catalog/workflows/{code}`

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use ctrk_catalog::{ComplianceType, Service, WorkflowSchema};
use ctrk_core::ComplianceTypeCode;
use serde::Serialize;

use crate::error::AppError;
use crate::extractors::extract_path;
use crate::state::AppState;

/// The schema an instance of `compliance_type` follows.
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub compliance_type: ComplianceTypeCode,
    /// False when the type falls back to the default schema.
    pub dedicated: bool,
    pub steps: WorkflowSchema,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/catalog/compliance-types", get(list_compliance_types))
        .route("/v1/catalog/services", get(list_services))
        .route("/v1/catalog/workflows/{code}", get(get_workflow))
}

async fn list_compliance_types(State(state): State<AppState>) -> Json<Vec<ComplianceType>> {
    Json(state.tracker.catalog.compliance_types().to_vec())
}

async fn list_services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.tracker.catalog.services().to_vec())
}

async fn get_workflow(
    State(state): State<AppState>,
    code: Result<Path<ComplianceTypeCode>, PathRejection>,
) -> Result<Json<WorkflowResponse>, AppError> {
    let code = extract_path(code)?;
    let catalog = &state.tracker.catalog;
    Ok(Json(WorkflowResponse {
        dedicated: catalog.workflows().has_dedicated(&code),
        steps: catalog.schema_for(&code).clone(),
        compliance_type: code,
    }))
}
