use crate::infra::{ApiService, AppState, InMemoryMetricStore};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use forgehub::achievements::{achievement_router, MetricSnapshot, UserId};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_achievement_routes(
    service: Arc<ApiService>,
    metric_store: Arc<InMemoryMetricStore>,
) -> axum::Router {
    achievement_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/users/:user_id/metrics",
            axum::routing::put(upsert_snapshot_endpoint),
        )
        .layer(Extension(metric_store))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Body for the demo snapshot upsert; counters default to zero so partial
/// payloads are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotUpdateRequest {
    #[serde(default)]
    pub(crate) templates_created: u64,
    #[serde(default)]
    pub(crate) copies_received: u64,
    #[serde(default)]
    pub(crate) commands_generated: u64,
    #[serde(default)]
    pub(crate) likes_received: u64,
    #[serde(default)]
    pub(crate) total_views: u64,
}

pub(crate) async fn upsert_snapshot_endpoint(
    Extension(metric_store): Extension<Arc<InMemoryMetricStore>>,
    Path(user_id): Path<String>,
    Json(request): Json<SnapshotUpdateRequest>,
) -> impl IntoResponse {
    let snapshot = MetricSnapshot {
        user_id: UserId(user_id),
        templates_created: request.templates_created,
        copies_received: request.copies_received,
        commands_generated: request.commands_generated,
        likes_received: request.likes_received,
        total_views: request.total_views,
    };
    metric_store.upsert(snapshot.clone());

    (StatusCode::OK, Json(json!({ "user_id": snapshot.user_id })))
}
