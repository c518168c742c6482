use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserRole;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardFilters {
    pub school_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub days: Option<i64>,
}

impl LeaderboardFilters {
    pub fn is_empty(&self) -> bool {
        self.school_id.is_none() && self.category_id.is_none() && self.days.is_none()
    }
}

/// Per-team totals over approved submissions, before ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTally {
    pub team_id: Uuid,
    pub team_name: String,
    pub school_name: Option<String>,
    pub total_points: i64,
    pub missions_completed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub team_id: Uuid,
    pub team_name: String,
    pub school_name: Option<String>,
    pub total_points: i64,
    pub missions_completed: i64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLeaderboardFilters {
    pub school_id: Option<Uuid>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTally {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub total_points: i64,
    pub missions_completed: i64,
    pub badges_earned: i64,
    pub team_name: Option<String>,
    pub school_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLeaderboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub total_points: i64,
    pub missions_completed: i64,
    pub badges_earned: i64,
    pub team_name: Option<String>,
    pub school_name: Option<String>,
}

/// Immutable historical rank record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub id: Uuid,
    pub team_id: Uuid,
    pub rank: i64,
    pub points: i64,
    pub missions_completed: i64,
    pub period_type: String,
    pub snapshot_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankSnapshot {
    pub rank: i64,
    pub points: i64,
    pub missions_completed: i64,
    pub snapshot_at: DateTime<Utc>,
    pub period_type: String,
}

impl From<LeaderboardSnapshot> for RankSnapshot {
    fn from(snapshot: LeaderboardSnapshot) -> Self {
        Self {
            rank: snapshot.rank,
            points: snapshot.points,
            missions_completed: snapshot.missions_completed,
            snapshot_at: snapshot.snapshot_at,
            period_type: snapshot.period_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRankHistory {
    pub team_id: Uuid,
    pub team_name: String,
    pub history: Vec<RankSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardStats {
    pub total_teams: i64,
    pub total_points_awarded: i64,
    pub total_missions_completed: i64,
    pub active_schools: i64,
    pub average_team_score: f64,
    pub top_team_points: i64,
    pub top_team: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// Points per completed mission, rounded to two decimals.
pub fn average_score(total_points: i64, missions_completed: i64) -> f64 {
    if missions_completed <= 0 {
        return 0.0;
    }
    round2(total_points as f64 / missions_completed as f64)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rank teams by points, highest first. Equal totals keep their input
/// order (the sort is stable), and repositories return tallies ordered by
/// team name then id, so ties resolve alphabetically. Rank is the 1-based
/// position, never shared.
pub fn rank_teams(mut tallies: Vec<TeamTally>) -> Vec<LeaderboardEntry> {
    tallies.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    tallies
        .into_iter()
        .enumerate()
        .map(|(i, t)| LeaderboardEntry {
            rank: i as i64 + 1,
            average_score: average_score(t.total_points, t.missions_completed),
            team_id: t.team_id,
            team_name: t.team_name,
            school_name: t.school_name,
            total_points: t.total_points,
            missions_completed: t.missions_completed,
        })
        .collect()
}

/// Same ordering rules as [`rank_teams`], applied to individual users.
/// Users without approved work carry zero points and therefore sort last.
pub fn rank_users(mut tallies: Vec<UserTally>) -> Vec<UserLeaderboardEntry> {
    tallies.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    tallies
        .into_iter()
        .enumerate()
        .map(|(i, t)| UserLeaderboardEntry {
            rank: i as i64 + 1,
            user_id: t.user_id,
            username: t.username,
            full_name: t.full_name,
            role: t.role,
            total_points: t.total_points,
            missions_completed: t.missions_completed,
            badges_earned: t.badges_earned,
            team_name: t.team_name,
            school_name: t.school_name,
        })
        .collect()
}
