use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{CreateNotificationRequest, NotificationType};
use crate::error::Result;

pub mod in_app;

pub use in_app::InAppChannel;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    MissionApproved {
        user_id: Uuid,
        mission_id: Uuid,
        mission_title: String,
        points: i64,
    },
    MissionRejected {
        user_id: Uuid,
        mission_id: Uuid,
        mission_title: String,
        feedback: String,
    },
    BadgeEarned {
        user_id: Uuid,
        badge_id: Uuid,
        badge_name: String,
    },
    TeamInvite {
        user_id: Uuid,
        team_id: Uuid,
        team_name: String,
    },
    RankChanged {
        user_id: Uuid,
        team_id: Uuid,
        team_name: String,
        rank: i64,
    },
}

impl NotificationEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            NotificationEvent::MissionApproved { user_id, .. }
            | NotificationEvent::MissionRejected { user_id, .. }
            | NotificationEvent::BadgeEarned { user_id, .. }
            | NotificationEvent::TeamInvite { user_id, .. }
            | NotificationEvent::RankChanged { user_id, .. } => *user_id,
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            NotificationEvent::MissionApproved { .. } => NotificationType::MissionApproved,
            NotificationEvent::MissionRejected { .. } => NotificationType::MissionRejected,
            NotificationEvent::BadgeEarned { .. } => NotificationType::BadgeEarned,
            NotificationEvent::TeamInvite { .. } => NotificationType::TeamInvite,
            NotificationEvent::RankChanged { .. } => NotificationType::RankChanged,
        }
    }

    /// User-facing record for this event.
    pub fn render(&self) -> CreateNotificationRequest {
        let (title, message, related_id, related_type, action_url) = match self {
            NotificationEvent::MissionApproved { mission_id, mission_title, points, .. } => (
                "Mission Approved!".to_string(),
                format!(
                    "Your submission for '{}' was approved. You earned {} points!",
                    mission_title, points
                ),
                Some(*mission_id),
                "mission",
                format!("/missions/{}", mission_id),
            ),
            NotificationEvent::MissionRejected { mission_id, mission_title, feedback, .. } => (
                "Mission Needs Improvement".to_string(),
                format!(
                    "Your submission for '{}' needs revision. Feedback: {}",
                    mission_title, feedback
                ),
                Some(*mission_id),
                "mission",
                format!("/missions/{}", mission_id),
            ),
            NotificationEvent::BadgeEarned { badge_id, badge_name, .. } => (
                format!("New Badge Earned: {}!", badge_name),
                format!("Congratulations! You've earned the '{}' badge.", badge_name),
                Some(*badge_id),
                "badge",
                "/profile/badges".to_string(),
            ),
            NotificationEvent::TeamInvite { team_id, team_name, .. } => (
                "Team Invitation".to_string(),
                format!("You've been invited to join '{}'!", team_name),
                Some(*team_id),
                "team",
                format!("/teams/{}", team_id),
            ),
            NotificationEvent::RankChanged { team_id, team_name, rank, .. } => (
                format!("Your Team is Rank #{}!", rank),
                format!("'{}' has moved to position #{} on the leaderboard!", team_name, rank),
                Some(*team_id),
                "team",
                "/leaderboard".to_string(),
            ),
        };

        CreateNotificationRequest {
            user_id: self.user_id(),
            notification_type: self.notification_type(),
            title,
            message: Some(message),
            related_id,
            related_type: Some(related_type.to_string()),
            action_url: Some(action_url),
        }
    }
}

/// A delivery target for notification events.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, event: &NotificationEvent) -> Result<()>;
}

/// Fans events out to every registered channel. Delivery is best-effort:
/// a failing channel is logged and skipped, and callers never see the error.
pub struct NotificationDispatcher {
    channels: RwLock<Vec<Arc<dyn NotificationChannel>>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(Vec::new()),
        }
    }

    pub async fn register(&self, channel: Arc<dyn NotificationChannel>) {
        tracing::info!("Registered notification channel: {}", channel.name());
        self.channels.write().await.push(channel);
    }

    pub async fn dispatch(&self, event: NotificationEvent) {
        let channels = self.channels.read().await;

        for channel in channels.iter() {
            match channel.deliver(&event).await {
                Ok(_) => {
                    tracing::debug!(
                        "Channel {} delivered {} for user {}",
                        channel.name(),
                        event.notification_type().as_str(),
                        event.user_id()
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "Channel {} failed to deliver {}: {:?}",
                        channel.name(),
                        event.notification_type().as_str(),
                        e
                    );
                }
            }
        }
    }

    pub async fn notify_mission_approved(
        &self,
        user_id: Uuid,
        mission_title: &str,
        points: i64,
        mission_id: Uuid,
    ) {
        self.dispatch(NotificationEvent::MissionApproved {
            user_id,
            mission_id,
            mission_title: mission_title.to_string(),
            points,
        })
        .await
    }

    pub async fn notify_mission_rejected(
        &self,
        user_id: Uuid,
        mission_title: &str,
        feedback: &str,
        mission_id: Uuid,
    ) {
        self.dispatch(NotificationEvent::MissionRejected {
            user_id,
            mission_id,
            mission_title: mission_title.to_string(),
            feedback: feedback.to_string(),
        })
        .await
    }

    pub async fn notify_badge_earned(&self, user_id: Uuid, badge_name: &str, badge_id: Uuid) {
        self.dispatch(NotificationEvent::BadgeEarned {
            user_id,
            badge_id,
            badge_name: badge_name.to_string(),
        })
        .await
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
