use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::Notification,
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    unread_only: bool,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    skip: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    notifications: Vec<Notification>,
    unread_count: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let repo = &state.service_context.notification_repo;

    let notifications = repo
        .list_for_user(
            current.user.id,
            params.unread_only,
            params.limit.clamp(1, 100),
            params.skip.max(0),
        )
        .await?;
    let unread_count = repo.unread_count(current.user.id).await?;

    Ok(Json(ListResponse {
        notifications,
        unread_count,
    }))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    count: i64,
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UnreadCount>> {
    let count = state.service_context.notification_repo
        .unread_count(current.user.id)
        .await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let updated = state.service_context.notification_repo
        .mark_read(id, current.user.id)
        .await?;

    if !updated {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    updated: u64,
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<MarkAllResponse>> {
    let updated = state.service_context.notification_repo
        .mark_all_read(current.user.id)
        .await?;
    Ok(Json(MarkAllResponse { updated }))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let deleted = state.service_context.notification_repo
        .delete(id, current.user.id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
