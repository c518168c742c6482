use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateSubmissionRequest, MissionSubmission, ReviewDecision, SubmissionStatus},
    error::{is_unique_violation, AppError, Result},
    repository::{
        util::{parse_id, parse_optional_id, utc},
        SubmissionRepository,
    },
};

#[derive(FromRow)]
struct SubmissionRow {
    id: String,
    mission_id: String,
    team_id: String,
    submitted_by: String,
    description: Option<String>,
    photo_url: Option<String>,
    file_url: Option<String>,
    status: String,
    reviewed_by: Option<String>,
    review_comment: Option<String>,
    submitted_at: NaiveDateTime,
    reviewed_at: Option<NaiveDateTime>,
}

const SUBMISSION_COLUMNS: &str = r#"
    id, mission_id, team_id, submitted_by, description, photo_url, file_url,
    status, reviewed_by, review_comment, submitted_at, reviewed_at
"#;

pub struct SqliteSubmissionRepository {
    pool: SqlitePool,
}

impl SqliteSubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_submission(row: SubmissionRow) -> Result<MissionSubmission> {
        Ok(MissionSubmission {
            id: parse_id(&row.id)?,
            mission_id: parse_id(&row.mission_id)?,
            team_id: parse_id(&row.team_id)?,
            submitted_by: parse_id(&row.submitted_by)?,
            description: row.description,
            photo_url: row.photo_url,
            file_url: row.file_url,
            status: SubmissionStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid submission status: {}", row.status))
            })?,
            reviewed_by: parse_optional_id(row.reviewed_by)?,
            review_comment: row.review_comment,
            submitted_at: utc(row.submitted_at),
            reviewed_at: row.reviewed_at.map(utc),
        })
    }
}

#[async_trait]
impl SubmissionRepository for SqliteSubmissionRepository {
    async fn create(
        &self,
        mission_id: Uuid,
        team_id: Uuid,
        submitted_by: Uuid,
        request: CreateSubmissionRequest,
    ) -> Result<MissionSubmission> {
        let id = Uuid::new_v4();

        // The partial unique index on (mission_id, team_id) for live
        // submissions is what rejects concurrent duplicates.
        sqlx::query(
            r#"
            INSERT INTO mission_submissions (
                id, mission_id, team_id, submitted_by, description, photo_url, file_url,
                status, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
            "#
        )
        .bind(id.to_string())
        .bind(mission_id.to_string())
        .bind(team_id.to_string())
        .bind(submitted_by.to_string())
        .bind(&request.description)
        .bind(&request.photo_url)
        .bind(&request.file_url)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::InvalidState(
                    "Team already has a pending or approved submission for this mission".to_string(),
                )
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created submission".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MissionSubmission>> {
        let sql = format!("SELECT {} FROM mission_submissions WHERE id = ?", SUBMISSION_COLUMNS);
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_submission).transpose()
    }

    async fn list(&self, status: Option<SubmissionStatus>, limit: i64, offset: i64) -> Result<Vec<MissionSubmission>> {
        let sql = format!(
            r#"
            SELECT {} FROM mission_submissions
            WHERE (? IS NULL OR status = ?)
            ORDER BY submitted_at ASC
            LIMIT ? OFFSET ?
            "#,
            SUBMISSION_COLUMNS
        );
        let status_str = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(status_str)
            .bind(status_str)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_submission).collect()
    }

    async fn apply_review(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        decision: ReviewDecision,
        comment: Option<String>,
    ) -> Result<MissionSubmission> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        // Guarded on the pending state so a concurrent review of the same
        // submission cannot win twice.
        let updated = sqlx::query(
            r#"
            UPDATE mission_submissions
            SET status = ?, reviewed_by = ?, review_comment = ?, reviewed_at = ?
            WHERE id = ? AND status = 'pending'
            "#
        )
        .bind(decision.status().as_str())
        .bind(reviewer_id.to_string())
        .bind(&comment)
        .bind(Utc::now().naive_utc())
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let current = sqlx::query_scalar::<_, String>(
                "SELECT status FROM mission_submissions WHERE id = ?"
            )
            .bind(&id_str)
            .fetch_optional(&mut *tx)
            .await?;

            return Err(match current {
                Some(status) => AppError::InvalidState(format!("Submission already {}", status)),
                None => AppError::NotFound("Submission not found".to_string()),
            });
        }

        if decision == ReviewDecision::Approved {
            let credited = sqlx::query(
                r#"
                UPDATE teams
                SET total_points = total_points + (
                        SELECT m.points FROM missions m
                        JOIN mission_submissions s ON s.mission_id = m.id
                        WHERE s.id = ?
                    ),
                    missions_completed = missions_completed + 1,
                    updated_at = ?
                WHERE id = (SELECT team_id FROM mission_submissions WHERE id = ?)
                "#
            )
            .bind(&id_str)
            .bind(Utc::now().naive_utc())
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

            if credited.rows_affected() != 1 {
                return Err(AppError::Database(
                    "Owning team missing while crediting approval".to_string(),
                ));
            }
        }

        let sql = format!("SELECT {} FROM mission_submissions WHERE id = ?", SUBMISSION_COLUMNS);
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(&id_str)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::row_to_submission(row)
    }
}
