use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::UserLevel,
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct UserStats {
    total_points: i64,
    missions_completed: i64,
    badges_earned: usize,
    active_days: i64,
    team_rank: Option<i64>,
    level: UserLevel,
}

pub async fn my_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserStats>> {
    let ctx = &state.service_context;
    let activity = ctx.badge_service.activity(current.user.id).await?;
    let badges = ctx.badge_repo.list_for_user(current.user.id).await?;

    Ok(Json(UserStats {
        total_points: activity.points,
        missions_completed: activity.approved_missions,
        badges_earned: badges.len(),
        active_days: activity.active_days,
        team_rank: activity.team_rank,
        level: UserLevel::for_points(activity.points),
    }))
}
