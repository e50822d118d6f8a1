//! # ctrk-api: HTTP Surface for the Compliance Tracker
//!
//! JSON over HTTP. Every handler delegates to the stores held by the
//! [`Tracker`](ctrk_store::Tracker) in [`AppState`]; no business rule
//! lives in this crate beyond checking that referenced entities and
//! services exist.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                     |
//! |------------------------|----------------------------|
//! | `/v1/catalog/*`        | [`routes::catalog`]        |
//! | `/v1/entities/*`       | [`routes::entities`]       |
//! | `/v1/subscriptions/*`  | [`routes::subscriptions`]  |
//! | `/v1/compliances/*`    | [`routes::compliances`]    |
//! | `/v1/documents/*`      | [`routes::documents`]      |
//! | `/v1/submissions/*`    | [`routes::submissions`]    |
//!
//! Timestamps cross the boundary as ISO-8601 UTC strings.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::catalog::router())
        .merge(routes::entities::router())
        .merge(routes::subscriptions::router())
        .merge(routes::compliances::router())
        .merge(routes::documents::router())
        .merge(routes::submissions::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{call, expect_status, seeded_state};
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn health_endpoints_respond() {
        let app = app(seeded_state());
        for (uri, expected) in [("/health/liveness", "ok"), ("/health/readiness", "ready")] {
            let resp = call(app.clone(), "GET", uri, None).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let bytes = resp.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&bytes[..], expected.as_bytes());
        }
    }

    #[tokio::test]
    async fn full_router_serves_every_area() {
        let app = app(seeded_state());
        for uri in [
            "/v1/catalog/services",
            "/v1/entities",
            "/v1/entities/ent-001/compliance-resolution",
            "/v1/compliances",
            "/v1/compliances/stats",
        ] {
            let resp = call(app.clone(), "GET", uri, None).await;
            expect_status(resp, StatusCode::OK).await;
        }
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let resp = call(app(seeded_state()), "GET", "/v1/nothing", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
