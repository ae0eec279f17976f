//! Timeline sync: fetch, normalize, persist, record page membership

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio::time::{Duration, interval};

use crate::api::StatusService;
use crate::db::Database;
use crate::models::{MicroBlogKey, RichStatus, TimelineId, TimelineKind};
use crate::normalize::normalize;

/// Drives the fetch pipeline for one account
pub struct SyncManager<S> {
    db: Arc<Mutex<Database>>,
    service: Arc<S>,
    account_key: MicroBlogKey,
}

impl<S: StatusService> SyncManager<S> {
    /// Create a sync manager acting as the given account
    pub fn new(db: Arc<Mutex<Database>>, service: Arc<S>, account_key: MicroBlogKey) -> Self {
        Self {
            db,
            service,
            account_key,
        }
    }

    /// Fetch one page of a timeline and fold it into the cache.
    ///
    /// The whole fetched graph (including embedded reference targets) is
    /// persisted atomically, then the page membership is recorded for the
    /// top-level statuses only. A storage fault rolls back the batch and
    /// surfaces here; re-issuing the fetch retries cleanly.
    pub async fn refresh(
        &self,
        kind: TimelineKind,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<Vec<MicroBlogKey>> {
        let fetched = self
            .service
            .fetch_timeline(kind, cursor, limit)
            .await
            .context("Timeline fetch failed")?;

        let keys: Vec<MicroBlogKey> = fetched.iter().map(RichStatus::status_key).collect();
        let batch = normalize(&fetched, &self.account_key);

        let timeline = TimelineId::new(self.account_key.clone(), kind);
        let mut db = self.db.lock().await;
        db.save_batch(&batch)
            .context("Failed to persist fetched timeline")?;
        db.append_timeline_page(&timeline, &keys)
            .context("Failed to record timeline page")?;

        tracing::debug!(
            "Refreshed {} with {} statuses ({} in batch)",
            timeline,
            keys.len(),
            batch.statuses.len()
        );

        Ok(keys)
    }

    /// Fetch the newest page of the home timeline
    pub async fn refresh_home(&self, limit: usize) -> Result<Vec<MicroBlogKey>> {
        self.refresh(TimelineKind::Home, None, limit).await
    }
}

impl<S: StatusService + 'static> SyncManager<S> {
    /// Run a periodic refresh loop until the surrounding task is dropped
    pub async fn start_background_refresh(
        self: Arc<Self>,
        interval_secs: u64,
        kind: TimelineKind,
        limit: usize,
    ) {
        if interval_secs == 0 {
            return; // Manual refresh only
        }

        let mut interval = interval(Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;

            if let Err(e) = self.refresh(kind, None, limit).await {
                tracing::error!("Background refresh failed: {}", e);
            }
        }
    }
}
