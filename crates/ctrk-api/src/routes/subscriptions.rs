//! # Subscriptions
//!
//! - `POST /v1/subscriptions`: subscribe an entity to a catalog service
//! - `PATCH /v1/subscriptions/{id}`: typed partial update
//! - `POST /v1/subscriptions/{id}/cancel`: cancel with a reason

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{patch, post};
use axum::{Json, Router};
use ctrk_core::SubscriptionId;
use ctrk_state::{NewSubscription, Subscription, SubscriptionPatch};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_validated_json, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelRequest {
    pub reason: String,
}

impl Validate for CancelRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/subscriptions", post(subscribe))
        .route("/v1/subscriptions/{id}", patch(update_subscription))
        .route("/v1/subscriptions/{id}/cancel", post(cancel_subscription))
}

/// The registry itself does not check references; the API does, so a
/// client cannot create a subscription that resolves to nothing.
/// The tracker checks the entity and the mandatory lock.
async fn subscribe(
    State(state): State<AppState>,
    body: Result<Json<NewSubscription>, JsonRejection>,
) -> Result<(StatusCode, Json<Subscription>), AppError> {
    let cmd = extract_json(body)?;
    if state.tracker.catalog.service(&cmd.service_code).is_none() {
        return Err(AppError::Validation(format!(
            "unknown service {}",
            cmd.service_code
        )));
    }
    let sub = state.tracker.subscribe(cmd)?;
    Ok((StatusCode::CREATED, Json(sub)))
}

async fn update_subscription(
    State(state): State<AppState>,
    id: Result<Path<SubscriptionId>, PathRejection>,
    body: Result<Json<SubscriptionPatch>, JsonRejection>,
) -> Result<Json<Subscription>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(state.tracker.update_subscription(&id, patch)?))
}

async fn cancel_subscription(
    State(state): State<AppState>,
    id: Result<Path<SubscriptionId>, PathRejection>,
    body: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<Json<Subscription>, AppError> {
    let id = extract_path(id)?;
    let req = extract_validated_json(body)?;
    Ok(Json(
        state
            .tracker
            .subscriptions
            .cancel_subscription(&id, req.reason.trim())?,
    ))
}
