use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::LeaderboardEntry;

/// A ranked leaderboard together with the moment it was computed.
#[derive(Debug, Clone)]
pub struct CachedLeaderboard {
    pub entries: Arc<Vec<LeaderboardEntry>>,
    pub computed_at: DateTime<Utc>,
    stored_at: Instant,
}

/// Single process-wide slot for the unfiltered team leaderboard.
///
/// Readers that find the slot stale recompute and overwrite it; two such
/// readers racing is harmless, the later write wins.
pub struct LeaderboardCache {
    ttl: Duration,
    slot: RwLock<Option<CachedLeaderboard>>,
}

impl LeaderboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// The cached leaderboard, if one is stored and younger than the TTL.
    pub async fn get(&self) -> Option<CachedLeaderboard> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .cloned()
    }

    pub async fn store(&self, entries: Vec<LeaderboardEntry>) -> CachedLeaderboard {
        let cached = CachedLeaderboard {
            entries: Arc::new(entries),
            computed_at: Utc::now(),
            stored_at: Instant::now(),
        };
        *self.slot.write().await = Some(cached.clone());
        cached
    }

    pub async fn invalidate(&self) {
        if self.slot.write().await.take().is_some() {
            tracing::debug!("Leaderboard cache invalidated");
        }
    }
}
