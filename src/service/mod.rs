pub mod badge_service;
pub mod leaderboard_cache;
pub mod leaderboard_service;
pub mod leaderboard_stream;
pub mod review_service;
pub mod team_service;

use std::sync::Arc;
use std::time::Duration;
use sqlx::SqlitePool;
use crate::config::LeaderboardConfig;
use crate::notifications::{InAppChannel, NotificationDispatcher};
use crate::repository::*;
use badge_service::BadgeService;
use leaderboard_cache::LeaderboardCache;
use leaderboard_service::LeaderboardService;
use leaderboard_stream::LeaderboardBroadcaster;
use review_service::ReviewService;
use team_service::TeamService;

pub use leaderboard_service::RankedLeaderboard;
pub use leaderboard_stream::{LeaderboardSubscription, LeaderboardUpdate};

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub team_repo: Arc<dyn TeamRepository>,
    pub mission_repo: Arc<dyn MissionRepository>,
    pub submission_repo: Arc<dyn SubmissionRepository>,
    pub badge_repo: Arc<dyn BadgeRepository>,
    pub leaderboard_repo: Arc<dyn LeaderboardRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub reference_repo: Arc<dyn ReferenceRepository>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub badge_service: Arc<BadgeService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub review_service: Arc<ReviewService>,
    pub team_service: Arc<TeamService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub async fn new(db_pool: SqlitePool, leaderboard: &LeaderboardConfig) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let team_repo: Arc<dyn TeamRepository> = Arc::new(SqliteTeamRepository::new(db_pool.clone()));
        let mission_repo: Arc<dyn MissionRepository> = Arc::new(SqliteMissionRepository::new(db_pool.clone()));
        let submission_repo: Arc<dyn SubmissionRepository> =
            Arc::new(SqliteSubmissionRepository::new(db_pool.clone()));
        let badge_repo: Arc<dyn BadgeRepository> = Arc::new(SqliteBadgeRepository::new(db_pool.clone()));
        let leaderboard_repo: Arc<dyn LeaderboardRepository> =
            Arc::new(SqliteLeaderboardRepository::new(db_pool.clone()));
        let notification_repo: Arc<dyn NotificationRepository> =
            Arc::new(SqliteNotificationRepository::new(db_pool.clone()));
        let reference_repo: Arc<dyn ReferenceRepository> =
            Arc::new(SqliteReferenceRepository::new(db_pool.clone()));

        // In-app delivery is always on; other channels register on top.
        let dispatcher = Arc::new(NotificationDispatcher::new());
        dispatcher
            .register(Arc::new(InAppChannel::new(notification_repo.clone())))
            .await;

        let broadcaster = Arc::new(LeaderboardBroadcaster::new(
            Duration::from_secs(leaderboard.stream_interval_seconds.max(1)),
            leaderboard.stream_top_n,
            16,
        ));
        let leaderboard_service = Arc::new(LeaderboardService::new(
            leaderboard_repo.clone(),
            team_repo.clone(),
            LeaderboardCache::new(Duration::from_secs(leaderboard.cache_ttl_seconds)),
            broadcaster,
            dispatcher.clone(),
        ));

        let badge_service = Arc::new(BadgeService::new(
            badge_repo.clone(),
            team_repo.clone(),
            leaderboard_repo.clone(),
            dispatcher.clone(),
        ));

        let review_service = Arc::new(ReviewService::new(
            user_repo.clone(),
            team_repo.clone(),
            mission_repo.clone(),
            submission_repo.clone(),
            badge_service.clone(),
            leaderboard_service.clone(),
            dispatcher.clone(),
        ));

        let team_service = Arc::new(TeamService::new(
            user_repo.clone(),
            team_repo.clone(),
            dispatcher.clone(),
        ));

        Self {
            user_repo,
            team_repo,
            mission_repo,
            submission_repo,
            badge_repo,
            leaderboard_repo,
            notification_repo,
            reference_repo,
            dispatcher,
            badge_service,
            leaderboard_service,
            review_service,
            team_service,
            db_pool,
        }
    }
}
