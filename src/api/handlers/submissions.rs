use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateSubmissionRequest, MissionSubmission, ReviewDecision, SubmissionStatus},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitDto {
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 1024))]
    pub photo_url: Option<String>,
    #[validate(length(max = 1024))]
    pub file_url: Option<String>,
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(mission_id): Path<Uuid>,
    Json(dto): Json<SubmitDto>,
) -> Result<(StatusCode, Json<MissionSubmission>)> {
    dto.validate()?;

    let submission = state.service_context.review_service
        .submit(
            mission_id,
            current.user.id,
            CreateSubmissionRequest {
                description: dto.description,
                photo_url: dto.photo_url,
                file_url: dto.file_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MissionSubmission>>> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            SubmissionStatus::from_str(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown submission status: {}", s)))
        })
        .transpose()?;

    let submissions = state.service_context.review_service
        .list(current.user.id, status, params.limit.clamp(1, 200), params.offset.max(0))
        .await?;

    Ok(Json(submissions))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MissionSubmission>> {
    let submission = state.service_context.review_service.get(id).await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewDto {
    pub status: ReviewDecision,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

pub async fn review(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(dto): Json<ReviewDto>,
) -> Result<Json<MissionSubmission>> {
    dto.validate()?;

    let reviewed = state.service_context.review_service
        .review(id, current.user.id, dto.status, dto.comment)
        .await?;

    Ok(Json(reviewed))
}
