use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Badge, UserBadge},
    error::Result,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Badge>>> {
    let badges = state.service_context.badge_service.list().await?;
    Ok(Json(badges))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<UserBadge>>> {
    let badges = state.service_context.badge_repo
        .list_for_user(current.user.id)
        .await?;
    Ok(Json(badges))
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    new_badges: Vec<Badge>,
    count: usize,
}

pub async fn check(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<CheckResponse>> {
    let new_badges = state.service_context.badge_service
        .evaluate_and_notify(current.user.id)
        .await?;

    Ok(Json(CheckResponse {
        count: new_badges.len(),
        new_badges,
    }))
}
