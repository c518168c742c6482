use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: Option<String>,
    pub related_id: Option<Uuid>,
    pub related_type: Option<String>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MissionApproved,
    MissionRejected,
    BadgeEarned,
    RankChanged,
    TeamInvite,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::MissionApproved => "mission_approved",
            NotificationType::MissionRejected => "mission_rejected",
            NotificationType::BadgeEarned => "badge_earned",
            NotificationType::RankChanged => "rank_changed",
            NotificationType::TeamInvite => "team_invite",
            NotificationType::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mission_approved" => Some(NotificationType::MissionApproved),
            "mission_rejected" => Some(NotificationType::MissionRejected),
            "badge_earned" => Some(NotificationType::BadgeEarned),
            "rank_changed" => Some(NotificationType::RankChanged),
            "team_invite" => Some(NotificationType::TeamInvite),
            "system" => Some(NotificationType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: Option<String>,
    pub related_id: Option<Uuid>,
    pub related_type: Option<String>,
    pub action_url: Option<String>,
}
