//! # Documents
//!
//! Metadata only; file bytes never pass through the API.
//!
//! - `POST /v1/documents`
//! - `PUT /v1/documents/{id}/status`
//! - `GET /v1/compliances/{id}/documents`

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use ctrk_core::{ComplianceId, DocumentId, UserId};
use ctrk_state::{Document, DocumentStatus, NewDocument};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentStatusRequest {
    pub status: DocumentStatus,
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default)]
    pub comment: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/documents", post(add_document))
        .route("/v1/documents/{id}/status", put(update_status))
        .route("/v1/compliances/{id}/documents", get(list_for_compliance))
}

async fn add_document(
    State(state): State<AppState>,
    body: Result<Json<NewDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let cmd = extract_json(body)?;
    state.tracker.entity(&cmd.entity_id)?;
    let document = state.tracker.documents.add(cmd)?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<DocumentId>, PathRejection>,
    body: Result<Json<DocumentStatusRequest>, JsonRejection>,
) -> Result<Json<Document>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    Ok(Json(state.tracker.documents.update_status(
        &id,
        req.status,
        req.user,
        req.comment,
    )?))
}

async fn list_for_compliance(
    State(state): State<AppState>,
    id: Result<Path<ComplianceId>, PathRejection>,
) -> Result<Json<Vec<Document>>, AppError> {
    let id = extract_path(id)?;
    state.tracker.compliances.get_by_id(&id)?;
    Ok(Json(state.tracker.documents.list_by_compliance(&id)))
}
