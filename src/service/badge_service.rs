use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{badge_catalog, rank_teams, Badge, LeaderboardFilters, UserActivity},
    error::Result,
    notifications::NotificationDispatcher,
    repository::{BadgeRepository, LeaderboardRepository, TeamRepository},
};

pub struct BadgeService {
    repo: Arc<dyn BadgeRepository>,
    team_repo: Arc<dyn TeamRepository>,
    leaderboard_repo: Arc<dyn LeaderboardRepository>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl BadgeService {
    pub fn new(
        repo: Arc<dyn BadgeRepository>,
        team_repo: Arc<dyn TeamRepository>,
        leaderboard_repo: Arc<dyn LeaderboardRepository>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            repo,
            team_repo,
            leaderboard_repo,
            dispatcher,
        }
    }

    /// Current activity counters for a user, including their team's rank.
    pub async fn activity(&self, user_id: Uuid) -> Result<UserActivity> {
        let mut activity = self.repo.user_activity(user_id).await?;

        if let Some(membership) = self.team_repo.find_membership(user_id).await? {
            let tallies = self.leaderboard_repo
                .team_tallies(&LeaderboardFilters::default())
                .await?;
            activity.team_rank = rank_teams(tallies)
                .into_iter()
                .find(|entry| entry.team_id == membership.team_id)
                .map(|entry| entry.rank);
        }

        Ok(activity)
    }

    /// Check every catalog badge the user does not hold yet and award the
    /// ones whose rule now holds. Returns only the badges awarded by this
    /// call; a badge another evaluation got to first is skipped.
    pub async fn evaluate_and_award(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        let earned = self.repo.earned_badge_ids(user_id).await?;
        let activity = self.activity(user_id).await?;
        let mut awarded = Vec::new();

        for definition in badge_catalog() {
            let badge = self.repo.ensure(definition).await?;

            if earned.contains(&badge.id) || !definition.rule.is_satisfied(&activity) {
                continue;
            }

            if self.repo.award(user_id, badge.id).await? {
                tracing::info!("User {} earned badge {}", user_id, badge.slug);
                awarded.push(badge);
            }
        }

        Ok(awarded)
    }

    /// Evaluate, then send one notification per newly awarded badge.
    pub async fn evaluate_and_notify(&self, user_id: Uuid) -> Result<Vec<Badge>> {
        let awarded = self.evaluate_and_award(user_id).await?;

        for badge in &awarded {
            self.dispatcher
                .notify_badge_earned(user_id, &badge.name, badge.id)
                .await;
        }

        Ok(awarded)
    }

    pub async fn list(&self) -> Result<Vec<Badge>> {
        for definition in badge_catalog() {
            self.repo.ensure(definition).await?;
        }
        self.repo.list().await
    }
}
