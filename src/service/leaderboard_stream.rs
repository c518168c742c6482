use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::{broadcast, Notify};
use tokio_util::sync::CancellationToken;

use crate::domain::LeaderboardEntry;
use crate::service::leaderboard_service::LeaderboardService;

/// Payload pushed to stream listeners.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardUpdate {
    pub entries: Vec<LeaderboardEntry>,
    pub total_teams: usize,
    pub timestamp: DateTime<Utc>,
}

/// Pushes the top of the team leaderboard to connected listeners on a
/// fixed interval, and immediately whenever points change.
pub struct LeaderboardBroadcaster {
    sender: broadcast::Sender<Arc<LeaderboardUpdate>>,
    refresh: Notify,
    listeners: Arc<AtomicUsize>,
    interval: Duration,
    top_n: usize,
}

impl LeaderboardBroadcaster {
    pub fn new(interval: Duration, top_n: usize, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            refresh: Notify::new(),
            listeners: Arc::new(AtomicUsize::new(0)),
            interval,
            top_n,
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    /// Wake the broadcast loop for an out-of-schedule push.
    pub fn trigger(&self) {
        self.refresh.notify_one();
    }

    pub fn subscribe(&self) -> LeaderboardSubscription {
        let guard = ListenerGuard::new(self.listeners.clone());
        tracing::debug!("Leaderboard listener connected ({} active)", self.listener_count());
        LeaderboardSubscription {
            receiver: self.sender.subscribe(),
            _guard: guard,
        }
    }

    /// Send an update to every current listener. Returns how many received it.
    pub fn publish(&self, update: LeaderboardUpdate) -> usize {
        self.sender.send(Arc::new(update)).unwrap_or(0)
    }

    /// Broadcast loop. Runs until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, service: Arc<LeaderboardService>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            "Leaderboard broadcaster started (every {}s, top {})",
            self.interval.as_secs(),
            self.top_n
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {}
            }

            if self.listener_count() == 0 {
                continue;
            }

            match service.stream_update(self.top_n).await {
                Ok(update) => {
                    let delivered = self.publish(update);
                    tracing::debug!("Leaderboard update sent to {} listeners", delivered);
                }
                Err(e) => {
                    tracing::warn!("Failed to compute leaderboard update: {:?}", e);
                }
            }
        }

        tracing::info!("Leaderboard broadcaster stopped");
    }
}

/// Counts a listener for as long as it is alive.
struct ListenerGuard {
    listeners: Arc<AtomicUsize>,
}

impl ListenerGuard {
    fn new(listeners: Arc<AtomicUsize>) -> Self {
        listeners.fetch_add(1, Ordering::SeqCst);
        Self { listeners }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let remaining = self.listeners.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        tracing::debug!("Leaderboard listener disconnected ({} active)", remaining);
    }
}

/// One listener's view of the broadcast. Dropping it (or the stream made
/// from it) deregisters the listener.
pub struct LeaderboardSubscription {
    receiver: broadcast::Receiver<Arc<LeaderboardUpdate>>,
    _guard: ListenerGuard,
}

impl LeaderboardSubscription {
    pub async fn recv(&mut self) -> Option<Arc<LeaderboardUpdate>> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Leaderboard listener skipped {} stale updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Arc<LeaderboardUpdate>> + Send {
        stream::unfold(self, |mut subscription| async move {
            subscription.recv().await.map(|update| (update, subscription))
        })
    }
}
