use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub rarity: BadgeRarity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeRarity::Common => "common",
            BadgeRarity::Rare => "rare",
            BadgeRarity::Epic => "epic",
            BadgeRarity::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "common" => Some(BadgeRarity::Common),
            "rare" => Some(BadgeRarity::Rare),
            "epic" => Some(BadgeRarity::Epic),
            "legendary" => Some(BadgeRarity::Legendary),
            _ => None,
        }
    }
}

/// Approved missions that count as one device kept out of e-waste.
pub const MISSIONS_PER_DEVICE: i64 = 3;

/// Aggregate activity of one user, read once per evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserActivity {
    pub approved_missions: i64,
    pub points: i64,
    /// Distinct calendar days with an approved submission.
    pub active_days: i64,
    pub published_resources: i64,
    pub forum_comments: i64,
    /// Rank of the user's team by approved points, if it is ranked at all.
    pub team_rank: Option<i64>,
}

impl UserActivity {
    pub fn devices_saved(&self) -> i64 {
        self.approved_missions / MISSIONS_PER_DEVICE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    FirstMission,
    MissionCount(i64),
    Points(i64),
    /// Distinct active days, not consecutive ones.
    ActiveDays(i64),
    TeamTopRank(i64),
    DevicesSaved(i64),
    ResourcesCreated(i64),
    ForumComments(i64),
}

impl BadgeRule {
    pub fn is_satisfied(&self, activity: &UserActivity) -> bool {
        match *self {
            BadgeRule::FirstMission => activity.approved_missions >= 1,
            BadgeRule::MissionCount(n) => activity.approved_missions >= n,
            BadgeRule::Points(n) => activity.points >= n,
            BadgeRule::ActiveDays(n) => activity.active_days >= n,
            BadgeRule::TeamTopRank(n) => activity.team_rank.map(|r| r <= n).unwrap_or(false),
            BadgeRule::DevicesSaved(n) => activity.devices_saved() >= n,
            BadgeRule::ResourcesCreated(n) => activity.published_resources >= n,
            BadgeRule::ForumComments(n) => activity.forum_comments >= n,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeDefinition {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub rarity: BadgeRarity,
    pub rule: BadgeRule,
}

const CATALOG: &[BadgeDefinition] = &[
    BadgeDefinition {
        slug: "first_mission",
        name: "First Steps",
        description: "Complete your first mission",
        icon: "🎯",
        rarity: BadgeRarity::Common,
        rule: BadgeRule::FirstMission,
    },
    BadgeDefinition {
        slug: "mission_streak_7",
        name: "Week Warrior",
        description: "Complete missions on 7 different days",
        icon: "🔥",
        rarity: BadgeRarity::Rare,
        rule: BadgeRule::ActiveDays(7),
    },
    BadgeDefinition {
        slug: "missions_10",
        name: "Mission Master",
        description: "Complete 10 missions",
        icon: "⭐",
        rarity: BadgeRarity::Rare,
        rule: BadgeRule::MissionCount(10),
    },
    BadgeDefinition {
        slug: "missions_50",
        name: "Mission Legend",
        description: "Complete 50 missions",
        icon: "👑",
        rarity: BadgeRarity::Legendary,
        rule: BadgeRule::MissionCount(50),
    },
    BadgeDefinition {
        slug: "points_100",
        name: "Century Maker",
        description: "Earn 100 points",
        icon: "💯",
        rarity: BadgeRarity::Common,
        rule: BadgeRule::Points(100),
    },
    BadgeDefinition {
        slug: "points_500",
        name: "Point Champion",
        description: "Earn 500 points",
        icon: "🏆",
        rarity: BadgeRarity::Epic,
        rule: BadgeRule::Points(500),
    },
    BadgeDefinition {
        slug: "team_top_3",
        name: "Team Player",
        description: "Help your team reach the top 3",
        icon: "🤝",
        rarity: BadgeRarity::Epic,
        rule: BadgeRule::TeamTopRank(3),
    },
    BadgeDefinition {
        slug: "devices_saved_10",
        name: "Eco Warrior",
        description: "Save 10 devices from e-waste",
        icon: "🌱",
        rarity: BadgeRarity::Epic,
        rule: BadgeRule::DevicesSaved(10),
    },
    BadgeDefinition {
        slug: "resources_created_3",
        name: "Knowledge Sharer",
        description: "Publish 3 resources",
        icon: "📚",
        rarity: BadgeRarity::Rare,
        rule: BadgeRule::ResourcesCreated(3),
    },
    BadgeDefinition {
        slug: "forum_contributor_10",
        name: "Community Helper",
        description: "Post 10 forum comments",
        icon: "💬",
        rarity: BadgeRarity::Rare,
        rule: BadgeRule::ForumComments(10),
    },
];

/// The fixed badge catalog.
pub fn badge_catalog() -> &'static [BadgeDefinition] {
    CATALOG
}
