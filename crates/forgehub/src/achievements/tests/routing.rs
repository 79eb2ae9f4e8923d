use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::achievements::router::achievement_router;

fn request(method: &str, uri: &str, body: Option<Value>) -> axum::http::Request<axum::body::Body> {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    match body {
        Some(value) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(&value).expect("serialize body"),
            ))
            .expect("request"),
        None => builder
            .body(axum::body::Body::empty())
            .expect("request"),
    }
}

#[tokio::test]
async fn evaluate_route_returns_new_awards() {
    let harness = harness();
    harness.catalog.seed(vec![badge_five_templates()]);
    harness.metrics.put(snapshot_with_templates(5));
    let router = achievement_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/evaluate",
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let payload = read_json_body(response).await;
    let outcomes = payload.as_array().expect("array payload");
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].get("badge_id"),
        Some(&json!("badge-template-artisan"))
    );
    assert_eq!(outcomes[0].get("xp_bonus"), Some(&json!(25)));
}

#[tokio::test]
async fn evaluate_route_is_idempotent() {
    let harness = harness();
    harness.catalog.seed(vec![badge_five_templates()]);
    harness.metrics.put(snapshot_with_templates(5));
    let router = achievement_router(harness.service.clone());

    let first = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/evaluate",
            None,
        ))
        .await
        .expect("first sweep");
    assert_eq!(first.status(), axum::http::StatusCode::OK);

    let second = router
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/evaluate",
            None,
        ))
        .await
        .expect("second sweep");
    let payload = read_json_body(second).await;
    assert_eq!(payload, json!([]));
}

#[tokio::test]
async fn summary_route_defaults_for_unknown_users() {
    let harness = harness();
    harness.catalog.seed(vec![badge_five_templates()]);
    let router = achievement_router(harness.service.clone());

    let response = router
        .oneshot(request("GET", "/api/v1/users/user-ghost/achievements", None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.pointer("/progression/level").and_then(Value::as_u64),
        Some(1)
    );
    assert_eq!(payload.get("earned"), Some(&json!([])));
    assert_eq!(payload.get("completion_percentage"), Some(&json!(0)));
}

#[tokio::test]
async fn progress_route_reports_partial_completion() {
    let harness = harness();
    harness.catalog.seed(vec![badge_five_templates()]);
    harness.metrics.put(snapshot_with_templates(4));
    let router = achievement_router(harness.service.clone());

    let response = router
        .oneshot(request(
            "GET",
            "/api/v1/users/user-42/achievements/progress",
            None,
        ))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    let rows = payload.as_array().expect("array payload");
    assert_eq!(
        rows[0].get("progress_percentage").and_then(Value::as_u64),
        Some(80)
    );
    assert_eq!(rows[0].get("earned"), Some(&json!(false)));
}

#[tokio::test]
async fn direct_award_route_maps_service_errors_to_statuses() {
    let harness = harness();
    harness.catalog.seed(vec![badge_five_templates()]);
    harness.metrics.put(snapshot_with_templates(4));
    let router = achievement_router(harness.service.clone());

    // Criteria not met -> 422.
    let unmet = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/badge-template-artisan",
            Some(json!({ "override_criteria": false })),
        ))
        .await
        .expect("route executes");
    assert_eq!(unmet.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown badge -> 404.
    let missing = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/badge-missing",
            Some(json!({ "override_criteria": true })),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), axum::http::StatusCode::NOT_FOUND);

    // Override -> 201.
    let granted = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/badge-template-artisan",
            Some(json!({ "override_criteria": true, "reason": "launch week" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(granted.status(), axum::http::StatusCode::CREATED);

    // Second grant -> 409.
    let duplicate = router
        .oneshot(request(
            "POST",
            "/api/v1/users/user-42/achievements/badge-template-artisan",
            Some(json!({ "override_criteria": true })),
        ))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_badge_route_validates_definitions() {
    let harness = harness();
    let router = achievement_router(harness.service.clone());

    let valid = serde_json::to_value(badge_five_templates()).expect("serialize definition");
    let created = router
        .clone()
        .oneshot(request("POST", "/api/v1/achievements", Some(valid)))
        .await
        .expect("route executes");
    assert_eq!(created.status(), axum::http::StatusCode::CREATED);

    let mut out_of_band = badge_five_templates();
    out_of_band.id = crate::achievements::domain::BadgeId("badge-expensive".to_string());
    out_of_band.name = "Expensive Commons".to_string();
    out_of_band.points_required = 500;
    let invalid = serde_json::to_value(out_of_band).expect("serialize definition");

    let rejected = router
        .oneshot(request("POST", "/api/v1/achievements", Some(invalid)))
        .await
        .expect("route executes");
    assert_eq!(
        rejected.status(),
        axum::http::StatusCode::UNPROCESSABLE_ENTITY
    );
    let payload = read_json_body(rejected).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("0-200"));
}

#[tokio::test]
async fn progression_route_returns_level_state() {
    let harness = harness();
    harness.catalog.seed(vec![badge_legendary_views()]);
    let mut snapshot = snapshot_with_templates(0);
    snapshot.total_views = 15_000;
    harness.metrics.put(snapshot);
    harness
        .service
        .evaluate_and_award(&user())
        .expect("sweep succeeds");
    let router = achievement_router(harness.service.clone());

    let response = router
        .oneshot(request("GET", "/api/v1/users/user-42/progression", None))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    // 250 XP from level 1: 100 to level 2, then 150 of the 200 needed.
    assert_eq!(payload.get("level").and_then(Value::as_u64), Some(2));
    assert_eq!(payload.get("experience").and_then(Value::as_u64), Some(150));
    assert_eq!(
        payload.get("xp_to_next_level").and_then(Value::as_u64),
        Some(50)
    );
}
