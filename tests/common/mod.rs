#![allow(dead_code)]

use nird::{
    config::LeaderboardConfig,
    domain::{
        CreateMissionRequest, CreateSubmissionRequest, CreateTeamRequest, CreateUserRequest, Mission,
        MissionDifficulty, MissionSubmission, ReviewDecision, Team, User, UserRole,
    },
    service::ServiceContext,
};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

pub const PASSWORD: &str = "green-it-2024";

/// Fresh in-memory database with migrations applied. A single connection
/// keeps every query on the same memory database.
pub async fn setup() -> anyhow::Result<ServiceContext> {
    setup_with(&LeaderboardConfig::default()).await
}

pub async fn setup_with(config: &LeaderboardConfig) -> anyhow::Result<ServiceContext> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(ServiceContext::new(pool, config).await)
}

pub async fn user(ctx: &ServiceContext, username: &str, role: UserRole) -> anyhow::Result<User> {
    let user = ctx.user_repo
        .create(CreateUserRequest {
            email: format!("{}@school.test", username),
            username: username.to_string(),
            full_name: None,
            password: PASSWORD.to_string(),
            role,
            school_id: None,
        })
        .await?;
    Ok(user)
}

pub async fn mission(ctx: &ServiceContext, title: &str, points: i64) -> anyhow::Result<Mission> {
    mission_in(ctx, title, points, None).await
}

pub async fn mission_in(
    ctx: &ServiceContext,
    title: &str,
    points: i64,
    category_id: Option<Uuid>,
) -> anyhow::Result<Mission> {
    let mission = ctx.mission_repo
        .create(CreateMissionRequest {
            title: title.to_string(),
            description: format!("{} for the planet", title),
            difficulty: MissionDifficulty::Medium,
            points,
            category_id,
            requires_photo: false,
            requires_description: true,
            requires_file: false,
        })
        .await?;
    Ok(mission)
}

/// A team captained by a new student of the same name.
pub async fn team(ctx: &ServiceContext, name: &str) -> anyhow::Result<(Team, User)> {
    team_in(ctx, name, None).await
}

pub async fn team_in(ctx: &ServiceContext, name: &str, school_id: Option<Uuid>) -> anyhow::Result<(Team, User)> {
    let captain = user(ctx, &format!("{}-captain", name.to_lowercase()), UserRole::Student).await?;
    let (team, _) = ctx.team_service
        .create_team(
            captain.id,
            CreateTeamRequest {
                name: name.to_string(),
                description: None,
                school_id,
            },
        )
        .await?;
    Ok((team, captain))
}

pub fn proof() -> CreateSubmissionRequest {
    CreateSubmissionRequest {
        description: Some("Photos and notes from the workshop".to_string()),
        ..Default::default()
    }
}

/// Submit and approve through the review service, side effects included.
pub async fn approve(
    ctx: &ServiceContext,
    mission: &Mission,
    student: &User,
    reviewer: &User,
) -> anyhow::Result<MissionSubmission> {
    let submission = ctx.review_service.submit(mission.id, student.id, proof()).await?;
    let reviewed = ctx.review_service
        .review(submission.id, reviewer.id, ReviewDecision::Approved, None)
        .await?;
    Ok(reviewed)
}

/// Approve at the repository level only: no badges, no notifications.
pub async fn approve_quietly(
    ctx: &ServiceContext,
    mission: &Mission,
    team: &Team,
    student: &User,
    reviewer: &User,
) -> anyhow::Result<MissionSubmission> {
    let submission = ctx.submission_repo
        .create(mission.id, team.id, student.id, proof())
        .await?;
    let reviewed = ctx.submission_repo
        .apply_review(submission.id, reviewer.id, ReviewDecision::Approved, None)
        .await?;
    Ok(reviewed)
}

/// Sum and count of a team's approved submissions, straight from the source table.
pub async fn approved_totals(ctx: &ServiceContext, team_id: Uuid) -> anyhow::Result<(i64, i64)> {
    let row: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(m.points), 0), COUNT(s.id)
        FROM mission_submissions s
        JOIN missions m ON m.id = s.mission_id
        WHERE s.team_id = ? AND s.status = 'approved'
        "#,
    )
    .bind(team_id.to_string())
    .fetch_one(&ctx.db_pool)
    .await?;
    Ok(row)
}
