use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BadgeDefinition, BadgeId, UserId};
use super::repository::{
    AwardLedger, BadgeCatalog, NotificationDispatcher, ProgressionLedger, SnapshotProvider,
};
use super::service::{AchievementService, AchievementServiceError};
use super::views::{AwardOutcomeView, ProgressionView};

type Service<S, C, L, P, N> = Arc<AchievementService<S, C, L, P, N>>;

/// Router builder exposing the achievement endpoints.
pub fn achievement_router<S, C, L, P, N>(service: Service<S, C, L, P, N>) -> Router
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/achievements/evaluate",
            post(evaluate_handler::<S, C, L, P, N>),
        )
        .route(
            "/api/v1/users/:user_id/achievements",
            get(summary_handler::<S, C, L, P, N>),
        )
        .route(
            "/api/v1/users/:user_id/achievements/progress",
            get(progress_handler::<S, C, L, P, N>),
        )
        .route(
            "/api/v1/users/:user_id/achievements/:badge_id",
            post(direct_award_handler::<S, C, L, P, N>),
        )
        .route(
            "/api/v1/users/:user_id/progression",
            get(progression_handler::<S, C, L, P, N>),
        )
        .route(
            "/api/v1/achievements",
            post(create_badge_handler::<S, C, L, P, N>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<S, C, L, P, N>(
    State(service): State<Service<S, C, L, P, N>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.evaluate_and_award(&UserId(user_id)) {
        Ok(outcomes) => {
            let views: Vec<AwardOutcomeView> =
                outcomes.iter().map(AwardOutcomeView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<S, C, L, P, N>(
    State(service): State<Service<S, C, L, P, N>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.achievement_summary(&UserId(user_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progress_handler<S, C, L, P, N>(
    State(service): State<Service<S, C, L, P, N>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.progress_report(&UserId(user_id)) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn progression_handler<S, C, L, P, N>(
    State(service): State<Service<S, C, L, P, N>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.progression_state(&UserId(user_id)) {
        Ok(state) => (StatusCode::OK, axum::Json(ProgressionView::from(&state))).into_response(),
        Err(error) => error_response(error),
    }
}

/// Request body for the administrative award endpoint.
#[derive(Debug, Deserialize)]
pub struct DirectAwardRequest {
    #[serde(default)]
    pub override_criteria: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

pub(crate) async fn direct_award_handler<S, C, L, P, N>(
    State(service): State<Service<S, C, L, P, N>>,
    Path((user_id, badge_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<DirectAwardRequest>,
) -> Response
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.award_directly(
        &UserId(user_id),
        &BadgeId(badge_id),
        request.override_criteria,
        request.reason,
    ) {
        Ok(outcome) => {
            let view = AwardOutcomeView::from(&outcome);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_badge_handler<S, C, L, P, N>(
    State(service): State<Service<S, C, L, P, N>>,
    axum::Json(definition): axum::Json<BadgeDefinition>,
) -> Response
where
    S: SnapshotProvider + 'static,
    C: BadgeCatalog + 'static,
    L: AwardLedger + 'static,
    P: ProgressionLedger + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.create_badge(definition) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AchievementServiceError) -> Response {
    let status = match &error {
        AchievementServiceError::Catalog(_)
        | AchievementServiceError::CriteriaNotMet { .. }
        | AchievementServiceError::BadgeInactive(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AchievementServiceError::AlreadyAwarded(_) => StatusCode::CONFLICT,
        AchievementServiceError::UnknownBadge(_) | AchievementServiceError::UnknownUser(_) => {
            StatusCode::NOT_FOUND
        }
        AchievementServiceError::ProgressionUpdate(_) | AchievementServiceError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
