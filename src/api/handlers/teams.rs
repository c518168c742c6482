use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateTeamRequest, Team, TeamMember},
    error::Result,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    team: Team,
    members: Vec<TeamMember>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(dto): Json<CreateTeamDto>,
) -> Result<(StatusCode, Json<TeamResponse>)> {
    dto.validate()?;

    let (team, captain) = state.service_context.team_service
        .create_team(
            current.user.id,
            CreateTeamRequest {
                name: dto.name,
                description: dto.description,
                school_id: dto.school_id.or(current.user.school_id),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TeamResponse { team, members: vec![captain] })))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberDto {
    pub user_id: Uuid,
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(team_id): Path<Uuid>,
    Json(dto): Json<AddMemberDto>,
) -> Result<(StatusCode, Json<TeamMember>)> {
    let member = state.service_context.team_service
        .add_member(current.user.id, team_id, dto.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    state.service_context.team_service
        .remove_member(current.user.id, team_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CaptainDto {
    #[serde(default = "default_captain")]
    pub is_captain: bool,
}

fn default_captain() -> bool {
    true
}

pub async fn set_captain(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    body: Option<Json<CaptainDto>>,
) -> Result<Json<TeamMember>> {
    let is_captain = body.map(|Json(dto)| dto.is_captain).unwrap_or(true);

    let member = state.service_context.team_service
        .set_captain(current.user.id, team_id, user_id, is_captain)
        .await?;

    Ok(Json(member))
}
