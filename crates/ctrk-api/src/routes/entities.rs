//! # Entities
//!
//! The entity directory and the per-entity views built on the
//! applicability engine and subscription registry.
//!
//! ## Endpoints
//!
//! - `POST /v1/entities`, `GET /v1/entities`, `GET /v1/entities/{id}`
//! - `GET /v1/entities/{id}/applicable-compliances`
//! - `GET /v1/entities/{id}/compliance-resolution`
//! - `GET /v1/entities/{id}/subscriptions`
//! - `GET /v1/entities/{id}/subscribed-compliance-types`
//! - `GET /v1/entities/{id}/recommendations`
//! - `PUT /v1/entities/{id}/compliance-types/{code}`

use std::collections::BTreeSet;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use ctrk_catalog::{ApplicableCompliance, Service};
use ctrk_core::{ComplianceTypeCode, Entity, EntityId, EntityType, Registrations};
use ctrk_state::Subscription;
use ctrk_store::ResolvedCompliance;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_validated_json, Validate};
use crate::state::AppState;

// ── Request DTOs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEntityRequest {
    /// Caller-chosen id. A UUID is generated when absent.
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub registrations: Registrations,
    #[serde(default)]
    pub incorporation_date: Option<NaiveDate>,
}

impl Validate for CreateEntityRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleComplianceRequest {
    pub enabled: bool,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/entities", get(list_entities).post(create_entity))
        .route("/v1/entities/{id}", get(get_entity))
        .route(
            "/v1/entities/{id}/applicable-compliances",
            get(applicable_compliances),
        )
        .route(
            "/v1/entities/{id}/compliance-resolution",
            get(compliance_resolution),
        )
        .route("/v1/entities/{id}/subscriptions", get(entity_subscriptions))
        .route(
            "/v1/entities/{id}/subscribed-compliance-types",
            get(subscribed_compliance_types),
        )
        .route("/v1/entities/{id}/recommendations", get(recommendations))
        .route(
            "/v1/entities/{id}/compliance-types/{code}",
            put(set_compliance_type_enabled),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

async fn create_entity(
    State(state): State<AppState>,
    body: Result<Json<CreateEntityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entity>), AppError> {
    let req = extract_validated_json(body)?;
    let id = match req.id {
        Some(id) => id,
        None => EntityId::new(Uuid::new_v4().to_string())?,
    };
    let mut entity = Entity::new(id, req.name.trim(), req.entity_type);
    entity.registrations = req.registrations;
    entity.incorporation_date = req.incorporation_date;

    let entity = state.tracker.entities.register(entity)?;
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn list_entities(State(state): State<AppState>) -> Json<Vec<Entity>> {
    Json(state.tracker.entities.list())
}

async fn get_entity(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Entity>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(state.tracker.entity(&id)?))
}

async fn applicable_compliances(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Vec<ApplicableCompliance>>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(state.tracker.applicable_compliances(&id)?))
}

async fn compliance_resolution(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Vec<ResolvedCompliance>>, AppError> {
    let id = extract_path(id)?;
    let entity = state.tracker.entity(&id)?;
    Ok(Json(state.tracker.subscriptions.resolve_compliances(&entity)))
}

async fn entity_subscriptions(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Vec<Subscription>>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(state.tracker.subscriptions.list_for_entity(&id)))
}

async fn subscribed_compliance_types(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<BTreeSet<ComplianceTypeCode>>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(
        state.tracker.subscriptions.get_subscribed_compliance_types(&id),
    ))
}

async fn recommendations(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Vec<Service>>, AppError> {
    let id = extract_path(id)?;
    let entity = state.tracker.entity(&id)?;
    Ok(Json(
        state.tracker.subscriptions.get_service_recommendations(&entity),
    ))
}

async fn set_compliance_type_enabled(
    State(state): State<AppState>,
    path: Result<Path<(EntityId, ComplianceTypeCode)>, PathRejection>,
    body: Result<Json<ToggleComplianceRequest>, JsonRejection>,
) -> Result<Json<Vec<Subscription>>, AppError> {
    let (id, code) = extract_path(path)?;
    let req = extract_json(body)?;
    let entity = state.tracker.entity(&id)?;
    let updated = state
        .tracker
        .subscriptions
        .set_compliance_type_enabled(&entity, &code, req.enabled)?;
    Ok(Json(updated))
}
