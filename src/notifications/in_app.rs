use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::Result,
    notifications::{NotificationChannel, NotificationEvent},
    repository::NotificationRepository,
};

/// Persists each event as a notification row the user can read in the app.
pub struct InAppChannel {
    repo: Arc<dyn NotificationRepository>,
}

impl InAppChannel {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationChannel for InAppChannel {
    fn name(&self) -> &str {
        "in-app"
    }

    async fn deliver(&self, event: &NotificationEvent) -> Result<()> {
        self.repo.create(event.render()).await?;
        Ok(())
    }
}
