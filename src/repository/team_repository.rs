use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateTeamRequest, Team, TeamMember},
    error::{is_unique_violation, AppError, Result},
    repository::{
        util::{parse_id, parse_optional_id, utc},
        TeamRepository,
    },
};

#[derive(FromRow)]
struct TeamRow {
    id: String,
    name: String,
    description: Option<String>,
    school_id: Option<String>,
    total_points: i64,
    missions_completed: i64,
    current_rank: Option<i64>,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct TeamMemberRow {
    id: String,
    team_id: String,
    user_id: String,
    is_captain: i32,
    joined_at: NaiveDateTime,
}

pub struct SqliteTeamRepository {
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_team(row: TeamRow) -> Result<Team> {
        Ok(Team {
            id: parse_id(&row.id)?,
            name: row.name,
            description: row.description,
            school_id: parse_optional_id(row.school_id)?,
            total_points: row.total_points,
            missions_completed: row.missions_completed,
            current_rank: row.current_rank,
            is_active: row.is_active != 0,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }

    fn row_to_member(row: TeamMemberRow) -> Result<TeamMember> {
        Ok(TeamMember {
            id: parse_id(&row.id)?,
            team_id: parse_id(&row.team_id)?,
            user_id: parse_id(&row.user_id)?,
            is_captain: row.is_captain != 0,
            joined_at: utc(row.joined_at),
        })
    }

    async fn find_member(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<TeamMember>> {
        let row = sqlx::query_as::<_, TeamMemberRow>(
            r#"
            SELECT id, team_id, user_id, is_captain, joined_at
            FROM team_members
            WHERE team_id = ? AND user_id = ?
            "#
        )
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_member).transpose()
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn create_with_captain(&self, request: CreateTeamRequest, captain_id: Uuid) -> Result<(Team, TeamMember)> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO teams (
                id, name, description, school_id, total_points, missions_completed,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 0, 0, 1, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.school_id.map(|s| s.to_string()))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        // The UNIQUE(user_id) constraint rolls the team back with the captain.
        sqlx::query(
            r#"
            INSERT INTO team_members (id, team_id, user_id, is_captain, joined_at)
            VALUES (?, ?, ?, 1, ?)
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(id.to_string())
        .bind(captain_id.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You already belong to a team".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        tx.commit().await?;

        let team = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created team".to_string())
        })?;
        let captain = self.find_member(id, captain_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created membership".to_string())
        })?;

        Ok((team, captain))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>> {
        let row = sqlx::query_as::<_, TeamRow>(
            r#"
            SELECT id, name, description, school_id, total_points, missions_completed,
                   current_rank, is_active, created_at, updated_at
            FROM teams
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_team).transpose()
    }

    async fn add_member(&self, team_id: Uuid, user_id: Uuid, is_captain: bool) -> Result<TeamMember> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO team_members (id, team_id, user_id, is_captain, joined_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .bind(if is_captain { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User already belongs to a team".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_member(team_id, user_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created membership".to_string())
        })
    }

    async fn find_membership(&self, user_id: Uuid) -> Result<Option<TeamMember>> {
        let row = sqlx::query_as::<_, TeamMemberRow>(
            r#"
            SELECT id, team_id, user_id, is_captain, joined_at
            FROM team_members
            WHERE user_id = ?
            "#
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_member).transpose()
    }

    async fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>> {
        let rows = sqlx::query_as::<_, TeamMemberRow>(
            r#"
            SELECT id, team_id, user_id, is_captain, joined_at
            FROM team_members
            WHERE team_id = ?
            ORDER BY joined_at ASC
            "#
        )
        .bind(team_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_member).collect()
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let is_captain = sqlx::query_scalar::<_, i32>(
            "SELECT is_captain FROM team_members WHERE team_id = ? AND user_id = ?"
        )
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found in team".to_string()))?;

        if is_captain != 0 {
            let captains = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM team_members WHERE team_id = ? AND is_captain = 1"
            )
            .bind(team_id.to_string())
            .fetch_one(&mut *tx)
            .await?;

            if captains <= 1 {
                return Err(AppError::InvalidState(
                    "Cannot remove the last captain. Assign another captain first.".to_string(),
                ));
            }
        }

        sqlx::query("DELETE FROM team_members WHERE team_id = ? AND user_id = ?")
            .bind(team_id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn set_captain(&self, team_id: Uuid, user_id: Uuid, is_captain: bool) -> Result<TeamMember> {
        let mut tx = self.pool.begin().await?;

        if !is_captain {
            let captains = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*) FROM team_members
                WHERE team_id = ? AND is_captain = 1 AND user_id != ?
                "#
            )
            .bind(team_id.to_string())
            .bind(user_id.to_string())
            .fetch_one(&mut *tx)
            .await?;

            if captains == 0 {
                return Err(AppError::InvalidState(
                    "A team must keep at least one captain".to_string(),
                ));
            }
        }

        let result = sqlx::query(
            "UPDATE team_members SET is_captain = ? WHERE team_id = ? AND user_id = ?"
        )
        .bind(if is_captain { 1i32 } else { 0i32 })
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found in team".to_string()));
        }

        tx.commit().await?;

        self.find_member(team_id, user_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated membership".to_string())
        })
    }
}
