//! # Compliance Lifecycle
//!
//! ## Endpoints
//!
//! - `POST /v1/compliances`: open an instance
//! - `GET /v1/compliances?entity_id=`: list, optionally for one entity
//! - `GET /v1/compliances/{id}`
//! - `PUT /v1/compliances/{id}/status`
//! - `PUT /v1/compliances/{id}/workflow-state`
//! - `GET /v1/compliances/{id}/workflow`: position within the schema
//! - `GET /v1/compliances/upcoming?window_days=`
//! - `GET /v1/compliances/overdue`
//! - `GET /v1/compliances/stats?entity_id=`

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use ctrk_core::{ComplianceId, EntityId, UserId};
use ctrk_state::{ComplianceInstance, ComplianceStatus, NewCompliance};
use ctrk_store::{ComplianceStats, WorkflowProgress};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query, extract_validated_json, Validate};
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusRequest {
    pub status: ComplianceStatus,
    #[serde(default)]
    pub user: Option<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowStateRequest {
    pub workflow_state: String,
    #[serde(default)]
    pub user: Option<UserId>,
}

impl Validate for WorkflowStateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.workflow_state.trim().is_empty() {
            return Err("workflow_state must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EntityFilter {
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default)]
    pub window_days: Option<u32>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/compliances",
            get(list_compliances).post(create_compliance),
        )
        .route("/v1/compliances/upcoming", get(upcoming))
        .route("/v1/compliances/overdue", get(overdue))
        .route("/v1/compliances/stats", get(stats))
        .route("/v1/compliances/{id}", get(get_compliance))
        .route("/v1/compliances/{id}/status", put(update_status))
        .route("/v1/compliances/{id}/workflow-state", put(update_workflow_state))
        .route("/v1/compliances/{id}/workflow", get(workflow_progress))
}

// ── Handlers ────────────────────────────────────────────────────────

async fn create_compliance(
    State(state): State<AppState>,
    body: Result<Json<NewCompliance>, JsonRejection>,
) -> Result<(StatusCode, Json<ComplianceInstance>), AppError> {
    let cmd = extract_json(body)?;
    state.tracker.entity(&cmd.entity_id)?;
    let instance = state.tracker.compliances.create(cmd)?;
    Ok((StatusCode::CREATED, Json(instance)))
}

async fn list_compliances(
    State(state): State<AppState>,
    query: Result<Query<EntityFilter>, QueryRejection>,
) -> Result<Json<Vec<ComplianceInstance>>, AppError> {
    let filter = extract_query(query)?;
    let compliances = &state.tracker.compliances;
    Ok(Json(match filter.entity_id {
        Some(entity_id) => compliances.list_by_entity(&entity_id),
        None => compliances.list_all(),
    }))
}

async fn get_compliance(
    State(state): State<AppState>,
    id: Result<Path<ComplianceId>, PathRejection>,
) -> Result<Json<ComplianceInstance>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(state.tracker.compliances.get_by_id(&id)?))
}

async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<ComplianceId>, PathRejection>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<ComplianceInstance>, AppError> {
    let id = extract_path(id)?;
    let req = extract_json(body)?;
    Ok(Json(
        state
            .tracker
            .compliances
            .update_status(&id, req.status, req.user)?,
    ))
}

async fn update_workflow_state(
    State(state): State<AppState>,
    id: Result<Path<ComplianceId>, PathRejection>,
    body: Result<Json<WorkflowStateRequest>, JsonRejection>,
) -> Result<Json<ComplianceInstance>, AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;
    Ok(Json(state.tracker.compliances.update_workflow_state(
        &id,
        &req.workflow_state,
        req.user,
    )?))
}

async fn workflow_progress(
    State(state): State<AppState>,
    id: Result<Path<ComplianceId>, PathRejection>,
) -> Result<Json<WorkflowProgress>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(state.tracker.compliances.workflow_progress(&id)?))
}

async fn upcoming(
    State(state): State<AppState>,
    query: Result<Query<UpcomingQuery>, QueryRejection>,
) -> Result<Json<Vec<ComplianceInstance>>, AppError> {
    let query = extract_query(query)?;
    let window = query
        .window_days
        .unwrap_or(state.config.upcoming_window_days);
    Ok(Json(state.tracker.compliances.upcoming(window)))
}

async fn overdue(State(state): State<AppState>) -> Json<Vec<ComplianceInstance>> {
    Json(state.tracker.compliances.overdue())
}

async fn stats(
    State(state): State<AppState>,
    query: Result<Query<EntityFilter>, QueryRejection>,
) -> Result<Json<ComplianceStats>, AppError> {
    let filter = extract_query(query)?;
    Ok(Json(
        state.tracker.compliances.stats(filter.entity_id.as_ref()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{call, expect_status, seeded_state};
    use serde_json::{json, Value};

    fn app() -> Router {
        router().with_state(seeded_state())
    }

    async fn open_gst(app: Router) -> String {
        let resp = call(
            app,
            "POST",
            "/v1/compliances",
            Some(json!({
                "entity_id": "ent-002",
                "compliance_type": "GST_MONTHLY_RETURN",
                "period": { "return_period": "2024-07" },
                "due_date": "2024-08-20T00:00:00Z"
            })),
        )
        .await;
        let body = expect_status(resp, StatusCode::CREATED).await;
        assert_eq!(body["status"], "PENDING");
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_starts_at_first_workflow_step() {
        let app = app();
        let id = open_gst(app.clone()).await;
        let resp = call(app, "GET", &format!("/v1/compliances/{id}/workflow"), None).await;
        let body = expect_status(resp, StatusCode::OK).await;
        assert_eq!(body["current_index"], 0);
        assert_eq!(body["terminal_reached"], false);
    }

    #[tokio::test]
    async fn create_without_due_date_is_validation_error() {
        let resp = call(
            app(),
            "POST",
            "/v1/compliances",
            Some(json!({ "entity_id": "ent-002", "compliance_type": "GST_MONTHLY_RETURN" })),
        )
        .await;
        expect_status(resp, StatusCode::UNPROCESSABLE_ENTITY).await;
    }

    #[tokio::test]
    async fn status_update_appends_history() {
        let app = app();
        let id = open_gst(app.clone()).await;
        let resp = call(
            app,
            "PUT",
            &format!("/v1/compliances/{id}/status"),
            Some(json!({ "status": "IN_PROGRESS", "user": "user-007" })),
        )
        .await;
        let body = expect_status(resp, StatusCode::OK).await;
        assert_eq!(body["status"], "IN_PROGRESS");
        let history = body["history"].as_array().unwrap();
        let last = history.last().unwrap();
        assert_eq!(last["state"], "IN_PROGRESS");
        assert_eq!(last["user"], "user-007");
    }

    #[tokio::test]
    async fn backward_workflow_move_is_accepted_and_flagged() {
        let app = app();
        let id = open_gst(app.clone()).await;
        for step in ["FILED", "DATA_COLLECTION"] {
            let resp = call(
                app.clone(),
                "PUT",
                &format!("/v1/compliances/{id}/workflow-state"),
                Some(json!({ "workflow_state": step })),
            )
            .await;
            expect_status(resp, StatusCode::OK).await;
        }
        let resp = call(app, "GET", &format!("/v1/compliances/{id}"), None).await;
        let body = expect_status(resp, StatusCode::OK).await;
        let last = body["history"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["state"], "DATA_COLLECTION");
        assert_eq!(last["backward"], true);
    }

    #[tokio::test]
    async fn blank_workflow_state_is_rejected() {
        let app = app();
        let id = open_gst(app.clone()).await;
        let resp = call(
            app,
            "PUT",
            &format!("/v1/compliances/{id}/workflow-state"),
            Some(json!({ "workflow_state": "   " })),
        )
        .await;
        expect_status(resp, StatusCode::UNPROCESSABLE_ENTITY).await;
    }

    #[tokio::test]
    async fn unknown_compliance_is_404() {
        let resp = call(
            app(),
            "PUT",
            "/v1/compliances/missing/status",
            Some(json!({ "status": "COMPLETED" })),
        )
        .await;
        expect_status(resp, StatusCode::NOT_FOUND).await;
    }

    #[tokio::test]
    async fn list_filters_by_entity() {
        let resp = call(app(), "GET", "/v1/compliances?entity_id=ent-001", None).await;
        let body = expect_status(resp, StatusCode::OK).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|c| c["entity_id"] == "ent-001"));
    }

    #[tokio::test]
    async fn overdue_and_upcoming_views() {
        let app = app();
        let resp = call(app.clone(), "GET", "/v1/compliances/overdue", None).await;
        let overdue = expect_status(resp, StatusCode::OK).await;
        assert_eq!(overdue.as_array().unwrap().len(), 1);

        // Seeded upcoming: +5, +5, +20 within 30 days; +45 and +60 only within 60.
        let resp = call(app.clone(), "GET", "/v1/compliances/upcoming", None).await;
        let upcoming = expect_status(resp, StatusCode::OK).await;
        assert_eq!(upcoming.as_array().unwrap().len(), 3);

        let resp = call(app, "GET", "/v1/compliances/upcoming?window_days=60", None).await;
        let upcoming = expect_status(resp, StatusCode::OK).await;
        assert_eq!(upcoming.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn stats_for_entity() {
        let resp = call(app(), "GET", "/v1/compliances/stats?entity_id=ent-001", None).await;
        let body: Value = expect_status(resp, StatusCode::OK).await;
        assert_eq!(body["total"], 4);
        assert_eq!(body["completed"], 1);
        assert_eq!(body["overdue"], 1);
        assert_eq!(body["completion_rate"], 25.0);
    }

    #[tokio::test]
    async fn bad_query_is_400() {
        let resp = call(app(), "GET", "/v1/compliances/upcoming?window_days=soon", None).await;
        expect_status(resp, StatusCode::BAD_REQUEST).await;
    }
}
