use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        LeaderboardEntry, LeaderboardFilters, LeaderboardSnapshot, TeamTally, UserLeaderboardFilters,
        UserRole, UserTally,
    },
    error::{AppError, Result},
    repository::{
        util::{parse_id, utc},
        GlobalTotals, LeaderboardRepository,
    },
};

#[derive(FromRow)]
struct TeamTallyRow {
    team_id: String,
    team_name: String,
    school_name: Option<String>,
    total_points: i64,
    missions_completed: i64,
}

#[derive(FromRow)]
struct UserTallyRow {
    user_id: String,
    username: String,
    full_name: Option<String>,
    role: String,
    total_points: i64,
    missions_completed: i64,
    badges_earned: i64,
    team_name: Option<String>,
    school_name: Option<String>,
}

#[derive(FromRow)]
struct SnapshotRow {
    id: String,
    team_id: String,
    rank: i64,
    points: i64,
    missions_completed: i64,
    period_type: String,
    snapshot_at: NaiveDateTime,
}

#[derive(FromRow)]
struct TotalsRow {
    total_teams: i64,
    total_points: i64,
    total_missions: i64,
    active_schools: i64,
}

/// Start of a trailing window of `days` days, rejecting spans chrono
/// cannot represent.
fn window_start(days: i64) -> Result<NaiveDateTime> {
    Duration::try_days(days)
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .map(|start| start.naive_utc())
        .ok_or_else(|| AppError::BadRequest(format!("days window of {} is out of range", days)))
}

pub struct SqliteLeaderboardRepository {
    pool: SqlitePool,
}

impl SqliteLeaderboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_snapshot(row: SnapshotRow) -> Result<LeaderboardSnapshot> {
        Ok(LeaderboardSnapshot {
            id: parse_id(&row.id)?,
            team_id: parse_id(&row.team_id)?,
            rank: row.rank,
            points: row.points,
            missions_completed: row.missions_completed,
            period_type: row.period_type,
            snapshot_at: utc(row.snapshot_at),
        })
    }
}

#[async_trait]
impl LeaderboardRepository for SqliteLeaderboardRepository {
    async fn team_tallies(&self, filters: &LeaderboardFilters) -> Result<Vec<TeamTally>> {
        // Teams without a qualifying approved submission do not appear.
        let cutoff = filters.days.map(window_start).transpose()?;
        let school_id = filters.school_id.map(|id| id.to_string());
        let category_id = filters.category_id.map(|id| id.to_string());

        let rows = sqlx::query_as::<_, TeamTallyRow>(
            r#"
            SELECT t.id AS team_id,
                   t.name AS team_name,
                   sc.name AS school_name,
                   COALESCE(SUM(m.points), 0) AS total_points,
                   COUNT(s.id) AS missions_completed
            FROM teams t
            JOIN mission_submissions s ON s.team_id = t.id
            JOIN missions m ON m.id = s.mission_id
            LEFT JOIN schools sc ON sc.id = t.school_id
            WHERE s.status = 'approved'
              AND (?1 IS NULL OR t.school_id = ?1)
              AND (?2 IS NULL OR m.category_id = ?2)
              AND (?3 IS NULL OR s.submitted_at >= ?3)
            GROUP BY t.id, t.name, sc.name
            ORDER BY t.name ASC, t.id ASC
            "#
        )
        .bind(school_id)
        .bind(category_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TeamTally {
                    team_id: parse_id(&row.team_id)?,
                    team_name: row.team_name,
                    school_name: row.school_name,
                    total_points: row.total_points,
                    missions_completed: row.missions_completed,
                })
            })
            .collect()
    }

    async fn user_tallies(&self, filters: &UserLeaderboardFilters) -> Result<Vec<UserTally>> {
        // The approved filter lives in the join so users with no approved
        // work still come back with zero points.
        let rows = sqlx::query_as::<_, UserTallyRow>(
            r#"
            SELECT u.id AS user_id,
                   u.username,
                   u.full_name,
                   u.role,
                   COALESCE(SUM(m.points), 0) AS total_points,
                   COUNT(s.id) AS missions_completed,
                   (SELECT COUNT(*) FROM user_badges ub WHERE ub.user_id = u.id) AS badges_earned,
                   (SELECT t.name FROM team_members tm
                    JOIN teams t ON t.id = tm.team_id
                    WHERE tm.user_id = u.id) AS team_name,
                   sc.name AS school_name
            FROM users u
            LEFT JOIN mission_submissions s
                   ON s.submitted_by = u.id AND s.status = 'approved'
            LEFT JOIN missions m ON m.id = s.mission_id
            LEFT JOIN schools sc ON sc.id = u.school_id
            WHERE u.is_active = 1
              AND (?1 IS NULL OR u.school_id = ?1)
              AND (?2 IS NULL OR u.role = ?2)
            GROUP BY u.id, u.username, u.full_name, u.role, sc.name
            ORDER BY u.username ASC
            "#
        )
        .bind(filters.school_id.map(|id| id.to_string()))
        .bind(filters.role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UserTally {
                    user_id: parse_id(&row.user_id)?,
                    role: UserRole::from_str(&row.role).ok_or_else(|| {
                        AppError::Database(format!("Invalid user role: {}", row.role))
                    })?,
                    username: row.username,
                    full_name: row.full_name,
                    total_points: row.total_points,
                    missions_completed: row.missions_completed,
                    badges_earned: row.badges_earned,
                    team_name: row.team_name,
                    school_name: row.school_name,
                })
            })
            .collect()
    }

    async fn record_snapshots(
        &self,
        entries: &[LeaderboardEntry],
        period_type: &str,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let at = at.naive_utc();
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO leaderboard_snapshots (
                    id, team_id, rank, points, missions_completed, period_type, snapshot_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#
            )
            .bind(Uuid::new_v4().to_string())
            .bind(entry.team_id.to_string())
            .bind(entry.rank)
            .bind(entry.total_points)
            .bind(entry.missions_completed)
            .bind(period_type)
            .bind(at)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE teams SET current_rank = ? WHERE id = ?")
                .bind(entry.rank)
                .bind(entry.team_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(entries.len())
    }

    async fn snapshots_since(&self, team_id: Uuid, since: DateTime<Utc>) -> Result<Vec<LeaderboardSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, team_id, rank, points, missions_completed, period_type, snapshot_at
            FROM leaderboard_snapshots
            WHERE team_id = ? AND snapshot_at >= ?
            ORDER BY snapshot_at DESC
            "#
        )
        .bind(team_id.to_string())
        .bind(since.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_snapshot).collect()
    }

    async fn global_totals(&self) -> Result<GlobalTotals> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM teams) AS total_teams,
                (SELECT COALESCE(SUM(m.points), 0) FROM mission_submissions s
                 JOIN missions m ON m.id = s.mission_id
                 WHERE s.status = 'approved') AS total_points,
                (SELECT COUNT(*) FROM mission_submissions
                 WHERE status = 'approved') AS total_missions,
                (SELECT COUNT(DISTINCT t.school_id) FROM teams t
                 JOIN mission_submissions s ON s.team_id = t.id
                 WHERE s.status = 'approved') AS active_schools
            "#
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GlobalTotals {
            total_teams: row.total_teams,
            total_points: row.total_points,
            total_missions: row.total_missions,
            active_schools: row.active_schools,
        })
    }
}
