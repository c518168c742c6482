use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        rank_teams, rank_users, round2, LeaderboardEntry, LeaderboardFilters, LeaderboardStats,
        RankSnapshot, TeamRankHistory, UserLeaderboardEntry, UserLeaderboardFilters,
    },
    error::{AppError, Result},
    notifications::{NotificationDispatcher, NotificationEvent},
    repository::{LeaderboardRepository, TeamRepository},
    service::{
        leaderboard_cache::LeaderboardCache,
        leaderboard_stream::{LeaderboardBroadcaster, LeaderboardUpdate},
    },
};

/// A ranked leaderboard plus the time it was computed.
#[derive(Debug, Clone)]
pub struct RankedLeaderboard {
    pub entries: Arc<Vec<LeaderboardEntry>>,
    pub last_updated: DateTime<Utc>,
    pub cached: bool,
}

pub struct LeaderboardService {
    repo: Arc<dyn LeaderboardRepository>,
    team_repo: Arc<dyn TeamRepository>,
    cache: LeaderboardCache,
    broadcaster: Arc<LeaderboardBroadcaster>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl LeaderboardService {
    pub fn new(
        repo: Arc<dyn LeaderboardRepository>,
        team_repo: Arc<dyn TeamRepository>,
        cache: LeaderboardCache,
        broadcaster: Arc<LeaderboardBroadcaster>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            repo,
            team_repo,
            cache,
            broadcaster,
            dispatcher,
        }
    }

    pub fn broadcaster(&self) -> Arc<LeaderboardBroadcaster> {
        self.broadcaster.clone()
    }

    /// Rank teams by approved points under the given filters. Never cached.
    pub async fn calculate(&self, filters: &LeaderboardFilters) -> Result<Vec<LeaderboardEntry>> {
        let tallies = self.repo.team_tallies(filters).await?;
        Ok(rank_teams(tallies))
    }

    /// Leaderboard for callers. The unfiltered board is served from the
    /// cache while it is fresh; filtered boards are always recomputed.
    pub async fn leaderboard(&self, filters: &LeaderboardFilters) -> Result<RankedLeaderboard> {
        if !filters.is_empty() {
            let entries = self.calculate(filters).await?;
            return Ok(RankedLeaderboard {
                entries: Arc::new(entries),
                last_updated: Utc::now(),
                cached: false,
            });
        }

        if let Some(cached) = self.cache.get().await {
            return Ok(RankedLeaderboard {
                entries: cached.entries,
                last_updated: cached.computed_at,
                cached: true,
            });
        }

        let entries = self.calculate(filters).await?;
        let stored = self.cache.store(entries).await;
        Ok(RankedLeaderboard {
            entries: stored.entries,
            last_updated: stored.computed_at,
            cached: false,
        })
    }

    pub async fn user_leaderboard(&self, filters: &UserLeaderboardFilters) -> Result<Vec<UserLeaderboardEntry>> {
        let tallies = self.repo.user_tallies(filters).await?;
        Ok(rank_users(tallies))
    }

    /// Persisted snapshots for a team over the last `days`, newest first.
    /// With no history on record, the team's live position is returned as a
    /// single "current" snapshot instead.
    pub async fn team_history(&self, team_id: Uuid, days: i64) -> Result<TeamRankHistory> {
        let team = self.team_repo
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        let since = Duration::try_days(days)
            .and_then(|span| Utc::now().checked_sub_signed(span))
            .ok_or_else(|| AppError::BadRequest(format!("days window of {} is out of range", days)))?;
        let snapshots = self.repo.snapshots_since(team_id, since).await?;

        let mut history: Vec<RankSnapshot> = snapshots.into_iter().map(Into::into).collect();

        if history.is_empty() {
            match self.calculate(&LeaderboardFilters::default()).await {
                Ok(entries) => {
                    if let Some(current) = entries.into_iter().find(|e| e.team_id == team_id) {
                        history.push(RankSnapshot {
                            rank: current.rank,
                            points: current.total_points,
                            missions_completed: current.missions_completed,
                            snapshot_at: Utc::now(),
                            period_type: "current".to_string(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("Live rank unavailable for team {} history: {:?}", team_id, e);
                }
            }
        }

        Ok(TeamRankHistory {
            team_id,
            team_name: team.name,
            history,
        })
    }

    pub async fn stats(&self) -> Result<LeaderboardStats> {
        let totals = self.repo.global_totals().await?;
        let board = self.leaderboard(&LeaderboardFilters::default()).await?;
        let top = board.entries.first();

        let average_team_score = if totals.total_teams > 0 {
            round2(totals.total_points as f64 / totals.total_teams as f64)
        } else {
            0.0
        };

        Ok(LeaderboardStats {
            total_teams: totals.total_teams,
            total_points_awarded: totals.total_points,
            total_missions_completed: totals.total_missions,
            active_schools: totals.active_schools,
            average_team_score,
            top_team_points: top.map(|e| e.total_points).unwrap_or(0),
            top_team: top.map(|e| e.team_name.clone()),
            last_updated: Utc::now(),
        })
    }

    /// Record one snapshot per ranked team and refresh their current rank.
    /// Members of a team whose recorded rank moved are notified.
    pub async fn capture_snapshots(&self, period_type: &str) -> Result<usize> {
        let entries = self.calculate(&LeaderboardFilters::default()).await?;

        let mut previous = Vec::with_capacity(entries.len());
        for entry in &entries {
            let rank = self.team_repo
                .find_by_id(entry.team_id)
                .await?
                .and_then(|t| t.current_rank);
            previous.push(rank);
        }

        let recorded = self.repo.record_snapshots(&entries, period_type, Utc::now()).await?;
        tracing::info!("Captured {} {} leaderboard snapshots", recorded, period_type);

        for (entry, before) in entries.iter().zip(previous) {
            match before {
                Some(rank) if rank != entry.rank => {}
                _ => continue,
            }

            let members = match self.team_repo.list_members(entry.team_id).await {
                Ok(members) => members,
                Err(e) => {
                    tracing::warn!("Could not load members of team {}: {:?}", entry.team_id, e);
                    continue;
                }
            };

            for member in members {
                self.dispatcher
                    .dispatch(NotificationEvent::RankChanged {
                        user_id: member.user_id,
                        team_id: entry.team_id,
                        team_name: entry.team_name.clone(),
                        rank: entry.rank,
                    })
                    .await;
            }
        }

        Ok(recorded)
    }

    /// Called after any approval. Drops the cached board and pushes a fresh
    /// one to stream listeners.
    pub async fn on_points_changed(&self) {
        self.cache.invalidate().await;
        self.broadcaster.trigger();
    }

    pub async fn stream_update(&self, top_n: usize) -> Result<LeaderboardUpdate> {
        let board = self.leaderboard(&LeaderboardFilters::default()).await?;
        Ok(LeaderboardUpdate {
            entries: board.entries.iter().take(top_n).cloned().collect(),
            total_teams: board.entries.len(),
            timestamp: board.last_updated,
        })
    }
}
