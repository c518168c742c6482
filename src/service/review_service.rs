use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::authorize,
    domain::{Capability, CreateSubmissionRequest, MissionSubmission, ReviewDecision, SubmissionStatus},
    error::{AppError, Result},
    notifications::NotificationDispatcher,
    repository::{MissionRepository, SubmissionRepository, TeamRepository, UserRepository},
    service::{badge_service::BadgeService, leaderboard_service::LeaderboardService},
};

pub const DEFAULT_REJECTION_FEEDBACK: &str = "No feedback provided";

/// Mission submissions and their one-way review.
pub struct ReviewService {
    user_repo: Arc<dyn UserRepository>,
    team_repo: Arc<dyn TeamRepository>,
    mission_repo: Arc<dyn MissionRepository>,
    submission_repo: Arc<dyn SubmissionRepository>,
    badge_service: Arc<BadgeService>,
    leaderboard_service: Arc<LeaderboardService>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ReviewService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        team_repo: Arc<dyn TeamRepository>,
        mission_repo: Arc<dyn MissionRepository>,
        submission_repo: Arc<dyn SubmissionRepository>,
        badge_service: Arc<BadgeService>,
        leaderboard_service: Arc<LeaderboardService>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            user_repo,
            team_repo,
            mission_repo,
            submission_repo,
            badge_service,
            leaderboard_service,
            dispatcher,
        }
    }

    pub async fn submit(
        &self,
        mission_id: Uuid,
        user_id: Uuid,
        request: CreateSubmissionRequest,
    ) -> Result<MissionSubmission> {
        let user = self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        authorize(&user, Capability::SubmitMissions)?;

        let membership = self.team_repo
            .find_membership(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("You must be part of a team to submit missions".to_string()))?;

        let mission = self.mission_repo
            .find_by_id(mission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Mission not found".to_string()))?;

        if !mission.is_active {
            return Err(AppError::BadRequest("Mission is not active".to_string()));
        }

        request
            .check_requirements(&mission)
            .map_err(|msg| AppError::Validation(msg.to_string()))?;

        let submission = self.submission_repo
            .create(mission_id, membership.team_id, user_id, request)
            .await?;

        tracing::info!(
            "Team {} submitted mission {} ({})",
            membership.team_id,
            mission.title,
            submission.id
        );

        Ok(submission)
    }

    pub async fn get(&self, submission_id: Uuid) -> Result<MissionSubmission> {
        self.submission_repo
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    pub async fn list(
        &self,
        actor_id: Uuid,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MissionSubmission>> {
        let actor = self.user_repo
            .find_by_id(actor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        authorize(&actor, Capability::ReviewSubmissions)?;

        self.submission_repo.list(status, limit, offset).await
    }

    /// Approve or reject a pending submission.
    ///
    /// The status change and the team credit commit together. Badge
    /// evaluation and notifications run after the commit and only log on
    /// failure; they never undo the review.
    pub async fn review(
        &self,
        submission_id: Uuid,
        reviewer_id: Uuid,
        decision: ReviewDecision,
        comment: Option<String>,
    ) -> Result<MissionSubmission> {
        let reviewer = self.user_repo
            .find_by_id(reviewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reviewer not found".to_string()))?;
        authorize(&reviewer, Capability::ReviewSubmissions)?;

        let submission = self.get(submission_id).await?;
        if submission.status != SubmissionStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Submission already {}",
                submission.status.as_str()
            )));
        }

        let mission = self.mission_repo
            .find_by_id(submission.mission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Mission not found".to_string()))?;

        let reviewed = self.submission_repo
            .apply_review(submission_id, reviewer_id, decision, comment)
            .await?;

        tracing::info!(
            "Submission {} {} by {}",
            reviewed.id,
            reviewed.status.as_str(),
            reviewer.username
        );

        match decision {
            ReviewDecision::Approved => {
                self.leaderboard_service.on_points_changed().await;

                self.dispatcher
                    .notify_mission_approved(
                        reviewed.submitted_by,
                        &mission.title,
                        mission.points,
                        mission.id,
                    )
                    .await;

                if let Err(e) = self.badge_service.evaluate_and_notify(reviewed.submitted_by).await {
                    tracing::warn!(
                        "Badge evaluation failed for user {} after approval: {:?}",
                        reviewed.submitted_by,
                        e
                    );
                }
            }
            ReviewDecision::Rejected => {
                let feedback = reviewed
                    .review_comment
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(DEFAULT_REJECTION_FEEDBACK);

                self.dispatcher
                    .notify_mission_rejected(reviewed.submitted_by, &mission.title, feedback, mission.id)
                    .await;
            }
        }

        Ok(reviewed)
    }
}
