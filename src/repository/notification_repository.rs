use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateNotificationRequest, Notification, NotificationType},
    error::{AppError, Result},
    repository::{
        util::{parse_id, parse_optional_id, utc},
        NotificationRepository,
    },
};

#[derive(FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    notification_type: String,
    title: String,
    message: Option<String>,
    related_id: Option<String>,
    related_type: Option<String>,
    action_url: Option<String>,
    is_read: i32,
    created_at: NaiveDateTime,
    read_at: Option<NaiveDateTime>,
}

const NOTIFICATION_COLUMNS: &str = r#"
    id, user_id, notification_type, title, message, related_id, related_type,
    action_url, is_read, created_at, read_at
"#;

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notification(row: NotificationRow) -> Result<Notification> {
        Ok(Notification {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            notification_type: NotificationType::from_str(&row.notification_type).ok_or_else(|| {
                AppError::Database(format!("Invalid notification type: {}", row.notification_type))
            })?,
            title: row.title,
            message: row.message,
            related_id: parse_optional_id(row.related_id)?,
            related_type: row.related_type,
            action_url: row.action_url,
            is_read: row.is_read != 0,
            created_at: utc(row.created_at),
            read_at: row.read_at.map(utc),
        })
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn create(&self, request: CreateNotificationRequest) -> Result<Notification> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, notification_type, title, message, related_id,
                related_type, action_url, is_read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.user_id.to_string())
        .bind(request.notification_type.as_str())
        .bind(&request.title)
        .bind(&request.message)
        .bind(request.related_id.map(|r| r.to_string()))
        .bind(&request.related_type)
        .bind(&request.action_url)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {} FROM notifications WHERE id = ?", NOTIFICATION_COLUMNS);
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_notification(row)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let sql = format!(
            r#"
            SELECT {} FROM notifications
            WHERE user_id = ? AND (? = 0 OR is_read = 0)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
            NOTIFICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(user_id.to_string())
            .bind(if unread_only { 1i32 } else { 0i32 })
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_notification).collect()
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0"
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = 1, read_at = COALESCE(read_at, ?)
            WHERE id = ? AND user_id = ?
            "#
        )
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ? WHERE user_id = ? AND is_read = 0"
        )
        .bind(Utc::now().naive_utc())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
