use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateMissionRequest, Mission, MissionDifficulty},
    error::{AppError, Result},
    repository::{
        util::{parse_id, parse_optional_id, utc},
        MissionRepository,
    },
};

#[derive(FromRow)]
struct MissionRow {
    id: String,
    title: String,
    description: String,
    difficulty: String,
    points: i64,
    category_id: Option<String>,
    requires_photo: i32,
    requires_description: i32,
    requires_file: i32,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMissionRepository {
    pool: SqlitePool,
}

impl SqliteMissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_mission(row: MissionRow) -> Result<Mission> {
        Ok(Mission {
            id: parse_id(&row.id)?,
            title: row.title,
            description: row.description,
            difficulty: MissionDifficulty::from_str(&row.difficulty).ok_or_else(|| {
                AppError::Database(format!("Invalid mission difficulty: {}", row.difficulty))
            })?,
            points: row.points,
            category_id: parse_optional_id(row.category_id)?,
            requires_photo: row.requires_photo != 0,
            requires_description: row.requires_description != 0,
            requires_file: row.requires_file != 0,
            is_active: row.is_active != 0,
            created_at: utc(row.created_at),
            updated_at: utc(row.updated_at),
        })
    }
}

#[async_trait]
impl MissionRepository for SqliteMissionRepository {
    async fn create(&self, request: CreateMissionRequest) -> Result<Mission> {
        if request.points < 0 {
            return Err(AppError::Validation("Mission points cannot be negative".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let flag = |b: bool| if b { 1i32 } else { 0i32 };

        sqlx::query(
            r#"
            INSERT INTO missions (
                id, title, description, difficulty, points, category_id,
                requires_photo, requires_description, requires_file,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.difficulty.as_str())
        .bind(request.points)
        .bind(request.category_id.map(|c| c.to_string()))
        .bind(flag(request.requires_photo))
        .bind(flag(request.requires_description))
        .bind(flag(request.requires_file))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created mission".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Mission>> {
        let row = sqlx::query_as::<_, MissionRow>(
            r#"
            SELECT id, title, description, difficulty, points, category_id,
                   requires_photo, requires_description, requires_file,
                   is_active, created_at, updated_at
            FROM missions
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_mission).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Mission>> {
        let rows = sqlx::query_as::<_, MissionRow>(
            r#"
            SELECT id, title, description, difficulty, points, category_id,
                   requires_photo, requires_description, requires_file,
                   is_active, created_at, updated_at
            FROM missions
            WHERE is_active = 1
            ORDER BY points ASC, title ASC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_mission).collect()
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Mission> {
        let result = sqlx::query("UPDATE missions SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(if active { 1i32 } else { 0i32 })
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Mission not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated mission".to_string())
        })
    }
}
