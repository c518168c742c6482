use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    domain::{
        LeaderboardEntry, LeaderboardFilters, LeaderboardStats, TeamRankHistory, UserLeaderboardEntry,
        UserLeaderboardFilters, UserRole,
    },
    error::{AppError, Result},
    service::LeaderboardUpdate,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LeaderboardParams {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    limit: usize,
    school_id: Option<Uuid>,
    category_id: Option<Uuid>,
    #[validate(range(min = 1, max = 3650))]
    days: Option<i64>,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    entries: Vec<LeaderboardEntry>,
    total_count: usize,
    last_updated: DateTime<Utc>,
    filters_applied: LeaderboardFilters,
}

pub async fn team_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>> {
    params.validate()?;

    let filters = LeaderboardFilters {
        school_id: params.school_id,
        category_id: params.category_id,
        days: params.days,
    };

    let board = state.service_context.leaderboard_service
        .leaderboard(&filters)
        .await?;

    Ok(Json(LeaderboardResponse {
        entries: board.entries.iter().skip(params.skip).take(params.limit).cloned().collect(),
        total_count: board.entries.len(),
        last_updated: board.last_updated,
        filters_applied: filters,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserLeaderboardParams {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_user_limit")]
    #[validate(range(min = 1, max = 200))]
    limit: usize,
    school_id: Option<Uuid>,
    role: Option<String>,
}

fn default_user_limit() -> usize {
    100
}

#[derive(Debug, Serialize)]
pub struct UserLeaderboardResponse {
    entries: Vec<UserLeaderboardEntry>,
    total_count: usize,
    last_updated: DateTime<Utc>,
}

pub async fn user_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<UserLeaderboardParams>,
) -> Result<Json<UserLeaderboardResponse>> {
    params.validate()?;

    let role = params
        .role
        .as_deref()
        .map(|r| UserRole::from_str(r).ok_or_else(|| AppError::BadRequest(format!("Unknown role: {}", r))))
        .transpose()?;

    let entries = state.service_context.leaderboard_service
        .user_leaderboard(&UserLeaderboardFilters {
            school_id: params.school_id,
            role,
        })
        .await?;

    Ok(Json(UserLeaderboardResponse {
        total_count: entries.len(),
        entries: entries.into_iter().skip(params.skip).take(params.limit).collect(),
        last_updated: Utc::now(),
    }))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<LeaderboardStats>> {
    let stats = state.service_context.leaderboard_service.stats().await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryParams {
    #[serde(default = "default_history_days")]
    #[validate(range(min = 1, max = 365))]
    days: i64,
}

fn default_history_days() -> i64 {
    30
}

pub async fn team_history(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<TeamRankHistory>> {
    params.validate()?;

    let history = state.service_context.leaderboard_service
        .team_history(team_id, params.days)
        .await?;

    Ok(Json(history))
}

fn to_event(update: &LeaderboardUpdate) -> Event {
    Event::default()
        .json_data(update)
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to encode leaderboard update: {}", e);
            Event::default().comment("encoding error")
        })
}

/// Server-sent events: the current top of the board right away, then every
/// broadcast until the client goes away.
pub async fn stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let service = state.service_context.leaderboard_service.clone();
    let broadcaster = service.broadcaster();

    let subscription = broadcaster.subscribe();
    let initial = service.stream_update(broadcaster.top_n()).await?;

    let events = stream::once(async move { to_event(&initial) })
        .chain(subscription.into_stream().map(|update| to_event(&update)))
        .map(Ok);

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
