use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod badge_repository;
pub mod leaderboard_repository;
pub mod mission_repository;
pub mod notification_repository;
pub mod reference_repository;
pub mod submission_repository;
pub mod team_repository;
pub mod user_repository;

mod util;

pub use badge_repository::SqliteBadgeRepository;
pub use leaderboard_repository::SqliteLeaderboardRepository;
pub use mission_repository::SqliteMissionRepository;
pub use notification_repository::SqliteNotificationRepository;
pub use reference_repository::{ReferenceRepository, SqliteReferenceRepository};
pub use submission_repository::SqliteSubmissionRepository;
pub use team_repository::SqliteTeamRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn record_login(&self, id: Uuid) -> Result<()>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<User>;
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Inserts the team and its captain in one transaction. Fails with
    /// `Conflict` when the captain already belongs to a team.
    async fn create_with_captain(&self, team: CreateTeamRequest, captain_id: Uuid) -> Result<(Team, TeamMember)>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>>;
    /// Fails with `Conflict` when the user already belongs to a team.
    async fn add_member(&self, team_id: Uuid, user_id: Uuid, is_captain: bool) -> Result<TeamMember>;
    async fn find_membership(&self, user_id: Uuid) -> Result<Option<TeamMember>>;
    async fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>>;
    /// Fails with `InvalidState` when the member is the team's last captain.
    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()>;
    async fn set_captain(&self, team_id: Uuid, user_id: Uuid, is_captain: bool) -> Result<TeamMember>;
}

#[async_trait]
pub trait MissionRepository: Send + Sync {
    async fn create(&self, mission: CreateMissionRequest) -> Result<Mission>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Mission>>;
    async fn list_active(&self) -> Result<Vec<Mission>>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Mission>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Fails with `InvalidState` when the team already has a pending or
    /// approved submission for the mission.
    async fn create(
        &self,
        mission_id: Uuid,
        team_id: Uuid,
        submitted_by: Uuid,
        request: CreateSubmissionRequest,
    ) -> Result<MissionSubmission>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MissionSubmission>>;
    async fn list(&self, status: Option<SubmissionStatus>, limit: i64, offset: i64) -> Result<Vec<MissionSubmission>>;
    /// Moves a pending submission to its terminal state and, on approval,
    /// credits the owning team, all in one transaction.
    async fn apply_review(
        &self,
        id: Uuid,
        reviewer_id: Uuid,
        decision: ReviewDecision,
        comment: Option<String>,
    ) -> Result<MissionSubmission>;
}

#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// Returns the stored badge for a catalog entry, creating it if absent.
    async fn ensure(&self, definition: &BadgeDefinition) -> Result<Badge>;
    async fn list(&self) -> Result<Vec<Badge>>;
    async fn earned_badge_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserBadge>>;
    /// Inserts the award unless it already exists. Returns whether this
    /// call created it.
    async fn award(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool>;
    /// Activity counters for badge rules. `team_rank` is left unset.
    async fn user_activity(&self, user_id: Uuid) -> Result<UserActivity>;
}

#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Approved-submission totals per team, ordered by team name then id.
    async fn team_tallies(&self, filters: &LeaderboardFilters) -> Result<Vec<TeamTally>>;
    /// Approved-submission totals per active user, ordered by username.
    async fn user_tallies(&self, filters: &UserLeaderboardFilters) -> Result<Vec<UserTally>>;
    async fn record_snapshots(
        &self,
        entries: &[LeaderboardEntry],
        period_type: &str,
        at: DateTime<Utc>,
    ) -> Result<usize>;
    async fn snapshots_since(&self, team_id: Uuid, since: DateTime<Utc>) -> Result<Vec<LeaderboardSnapshot>>;
    async fn global_totals(&self) -> Result<GlobalTotals>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalTotals {
    pub total_teams: i64,
    pub total_points: i64,
    pub total_missions: i64,
    pub active_schools: i64,
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: CreateNotificationRequest) -> Result<Notification>;
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>>;
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}
