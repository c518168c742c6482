use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Badge, BadgeDefinition, BadgeRarity, UserActivity, UserBadge},
    error::{AppError, Result},
    repository::{
        util::{parse_id, utc},
        BadgeRepository,
    },
};

#[derive(FromRow)]
struct BadgeRow {
    id: String,
    slug: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    rarity: String,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct UserBadgeRow {
    user_badge_id: String,
    user_id: String,
    earned_at: NaiveDateTime,
    id: String,
    slug: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    rarity: String,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct ActivityRow {
    approved_missions: i64,
    points: i64,
    active_days: i64,
    published_resources: i64,
    forum_comments: i64,
}

pub struct SqliteBadgeRepository {
    pool: SqlitePool,
}

impl SqliteBadgeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_badge(row: BadgeRow) -> Result<Badge> {
        Ok(Badge {
            id: parse_id(&row.id)?,
            slug: row.slug,
            name: row.name,
            description: row.description,
            icon: row.icon,
            rarity: BadgeRarity::from_str(&row.rarity)
                .ok_or_else(|| AppError::Database(format!("Invalid badge rarity: {}", row.rarity)))?,
            created_at: utc(row.created_at),
        })
    }

    fn row_to_user_badge(row: UserBadgeRow) -> Result<UserBadge> {
        Ok(UserBadge {
            id: parse_id(&row.user_badge_id)?,
            user_id: parse_id(&row.user_id)?,
            earned_at: utc(row.earned_at),
            badge: Self::row_to_badge(BadgeRow {
                id: row.id,
                slug: row.slug,
                name: row.name,
                description: row.description,
                icon: row.icon,
                rarity: row.rarity,
                created_at: row.created_at,
            })?,
        })
    }
}

#[async_trait]
impl BadgeRepository for SqliteBadgeRepository {
    async fn ensure(&self, definition: &BadgeDefinition) -> Result<Badge> {
        sqlx::query(
            r#"
            INSERT INTO badges (id, slug, name, description, icon, rarity, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (slug) DO NOTHING
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(definition.slug)
        .bind(definition.name)
        .bind(definition.description)
        .bind(definition.icon)
        .bind(definition.rarity.as_str())
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, BadgeRow>(
            "SELECT id, slug, name, description, icon, rarity, created_at FROM badges WHERE slug = ?"
        )
        .bind(definition.slug)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_badge(row)
    }

    async fn list(&self) -> Result<Vec<Badge>> {
        let rows = sqlx::query_as::<_, BadgeRow>(
            "SELECT id, slug, name, description, icon, rarity, created_at FROM badges ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_badge).collect()
    }

    async fn earned_badge_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT badge_id FROM user_badges WHERE user_id = ?"
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        ids.iter().map(|id| parse_id(id)).collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserBadge>> {
        let rows = sqlx::query_as::<_, UserBadgeRow>(
            r#"
            SELECT ub.id AS user_badge_id, ub.user_id, ub.earned_at,
                   b.id, b.slug, b.name, b.description, b.icon, b.rarity, b.created_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = ?
            ORDER BY ub.earned_at DESC
            "#
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_user_badge).collect()
    }

    async fn award(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool> {
        // The (user_id, badge_id) unique constraint settles concurrent awards.
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (id, user_id, badge_id, earned_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(badge_id.to_string())
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn user_activity(&self, user_id: Uuid) -> Result<UserActivity> {
        let id = user_id.to_string();
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM mission_submissions
                 WHERE submitted_by = ?1 AND status = 'approved') AS approved_missions,
                (SELECT COALESCE(SUM(m.points), 0) FROM mission_submissions s
                 JOIN missions m ON m.id = s.mission_id
                 WHERE s.submitted_by = ?1 AND s.status = 'approved') AS points,
                (SELECT COUNT(DISTINCT date(submitted_at)) FROM mission_submissions
                 WHERE submitted_by = ?1 AND status = 'approved') AS active_days,
                (SELECT COUNT(*) FROM resources
                 WHERE author_id = ?1 AND is_published = 1) AS published_resources,
                (SELECT COUNT(*) FROM forum_comments
                 WHERE author_id = ?1) AS forum_comments
            "#
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserActivity {
            approved_missions: row.approved_missions,
            points: row.points,
            active_days: row.active_days,
            published_resources: row.published_resources,
            forum_comments: row.forum_comments,
            team_rank: None,
        })
    }
}
