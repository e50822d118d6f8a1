//! # Submissions
//!
//! Filing records. Nothing here talks to a real portal; clients report
//! portal responses through the patch.
//!
//! - `POST /v1/submissions`
//! - `PATCH /v1/submissions/{id}`
//! - `GET /v1/compliances/{id}/submissions`

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use ctrk_core::{ComplianceId, SubmissionId};
use ctrk_state::{NewSubmission, Submission, SubmissionPatch};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/submissions", post(create_submission))
        .route("/v1/submissions/{id}", patch(update_submission))
        .route("/v1/compliances/{id}/submissions", get(list_for_compliance))
}

async fn create_submission(
    State(state): State<AppState>,
    body: Result<Json<NewSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let cmd = extract_json(body)?;
    state.tracker.entity(&cmd.entity_id)?;
    let submission = state.tracker.submissions.create(cmd)?;
    Ok((StatusCode::CREATED, Json(submission)))
}

async fn update_submission(
    State(state): State<AppState>,
    id: Result<Path<SubmissionId>, PathRejection>,
    body: Result<Json<SubmissionPatch>, JsonRejection>,
) -> Result<Json<Submission>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(state.tracker.submissions.update(&id, patch)?))
}

async fn list_for_compliance(
    State(state): State<AppState>,
    id: Result<Path<ComplianceId>, PathRejection>,
) -> Result<Json<Vec<Submission>>, AppError> {
    let id = extract_path(id)?;
    state.tracker.compliances.get_by_id(&id)?;
    Ok(Json(state.tracker.submissions.list_by_compliance(&id)))
}
