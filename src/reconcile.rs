//! Optimistic reaction reconciliation
//!
//! User actions (like, unlike, repost, unrepost) write their effect to the
//! cache immediately, then confirm with the remote service in the background.
//! A failed confirmation reverts the flag to its prior value; the failure
//! itself is absorbed here and never reaches the caller. Store-level faults
//! during the optimistic write do propagate.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::StatusService;
use crate::db::Database;
use crate::models::{MicroBlogKey, Reaction};

/// Which boolean of the reaction record an action targets
#[derive(Debug, Clone, Copy)]
enum ReactionField {
    Liked,
    Reposted,
}

impl ReactionField {
    const fn get(self, reaction: &Reaction) -> bool {
        match self {
            Self::Liked => reaction.liked,
            Self::Reposted => reaction.reposted,
        }
    }

    const fn set(self, reaction: &mut Reaction, value: bool) {
        match self {
            Self::Liked => reaction.liked = value,
            Self::Reposted => reaction.reposted = value,
        }
    }
}

/// Handle to an in-flight confirmation.
///
/// The confirmation task is detached: dropping the handle does not cancel it,
/// so the optimistic write/revert cycle always runs to completion. `join`
/// waits for the cycle so tests and callers can observe the final state.
pub struct ActionHandle {
    inner: JoinHandle<()>,
}

impl ActionHandle {
    /// Wait until the confirmation (and any revert) has completed
    pub async fn join(self) {
        // The task absorbs its own errors; a join error can only be a panic
        let _ = self.inner.await;
    }

    /// Whether the confirmation has already completed
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

/// Reconciles user reactions against the cache and the remote service
pub struct ReactionManager<S> {
    db: Arc<Mutex<Database>>,
    service: Arc<S>,
    account_key: MicroBlogKey,
}

impl<S: StatusService + 'static> ReactionManager<S> {
    /// Create a manager acting as the given account
    pub fn new(db: Arc<Mutex<Database>>, service: Arc<S>, account_key: MicroBlogKey) -> Self {
        Self {
            db,
            service,
            account_key,
        }
    }

    /// Like a status
    pub async fn like(&self, status_id: &str) -> Result<ActionHandle> {
        self.apply(status_id, ReactionField::Liked, true).await
    }

    /// Unlike a status
    pub async fn unlike(&self, status_id: &str) -> Result<ActionHandle> {
        self.apply(status_id, ReactionField::Liked, false).await
    }

    /// Repost/boost a status
    pub async fn repost(&self, status_id: &str) -> Result<ActionHandle> {
        self.apply(status_id, ReactionField::Reposted, true).await
    }

    /// Undo a repost/boost
    pub async fn unrepost(&self, status_id: &str) -> Result<ActionHandle> {
        self.apply(status_id, ReactionField::Reposted, false).await
    }

    /// The shared protocol: optimistic write, remote confirmation, revert on
    /// remote failure.
    async fn apply(
        &self,
        status_id: &str,
        field: ReactionField,
        value: bool,
    ) -> Result<ActionHandle> {
        // Read-modify-write under the store lock; concurrent actions on the
        // same record serialize here, last writer wins
        let prior = {
            let db = self.db.lock().await;
            let mut reaction = db
                .get_reaction(status_id, &self.account_key)?
                .unwrap_or_else(|| Reaction::empty(status_id, self.account_key.clone()));
            let prior = field.get(&reaction);
            field.set(&mut reaction, value);
            db.upsert_reaction(&reaction)?;
            prior
        };

        let db = Arc::clone(&self.db);
        let service = Arc::clone(&self.service);
        let account_key = self.account_key.clone();
        let status_id = status_id.to_string();

        // Detached confirmation: caller cancellation must not leave the
        // optimistic flag stuck pre-confirmation
        let inner = tokio::spawn(async move {
            let outcome = match (field, value) {
                (ReactionField::Liked, true) => service.like(&status_id).await,
                (ReactionField::Liked, false) => service.unlike(&status_id).await,
                (ReactionField::Reposted, true) => service.repost(&status_id).await,
                (ReactionField::Reposted, false) => service.unrepost(&status_id).await,
            };

            if let Err(e) = outcome {
                tracing::warn!(
                    "Remote confirmation failed for status {}: {}; reverting",
                    status_id,
                    e
                );
                let db = db.lock().await;
                let revert = db
                    .get_reaction(&status_id, &account_key)
                    .map(|found| {
                        found.unwrap_or_else(|| Reaction::empty(&status_id, account_key.clone()))
                    })
                    .and_then(|mut reaction| {
                        field.set(&mut reaction, prior);
                        db.upsert_reaction(&reaction)
                    });
                if let Err(e) = revert {
                    tracing::warn!("Failed to revert reaction for status {}: {}", status_id, e);
                }
            }
        });

        Ok(ActionHandle { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PostPayload;
    use crate::models::{Platform, RichStatus, TimelineKind};
    use anyhow::bail;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Service whose reaction calls succeed or fail on demand
    #[derive(Default)]
    struct StubService {
        fail: AtomicBool,
        calls: AtomicUsize,
        gate: Option<Notify>,
    }

    impl StubService {
        fn failing() -> Self {
            let service = Self::default();
            service.fail.store(true, Ordering::SeqCst);
            service
        }

        async fn confirm(&self) -> anyhow::Result<()> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                bail!("service unavailable")
            }
            Ok(())
        }
    }

    impl StatusService for StubService {
        async fn fetch_timeline(
            &self,
            _kind: TimelineKind,
            _cursor: Option<String>,
            _limit: usize,
        ) -> anyhow::Result<Vec<RichStatus>> {
            bail!("not used")
        }

        async fn like(&self, _status_id: &str) -> anyhow::Result<()> {
            self.confirm().await
        }

        async fn unlike(&self, _status_id: &str) -> anyhow::Result<()> {
            self.confirm().await
        }

        async fn repost(&self, _status_id: &str) -> anyhow::Result<()> {
            self.confirm().await
        }

        async fn unrepost(&self, _status_id: &str) -> anyhow::Result<()> {
            self.confirm().await
        }

        async fn post(&self, _payload: &PostPayload) -> anyhow::Result<RichStatus> {
            bail!("not used")
        }

        async fn upload_media(&self, _bytes: &[u8], _mime_type: &str) -> anyhow::Result<String> {
            bail!("not used")
        }
    }

    fn viewer() -> MicroBlogKey {
        MicroBlogKey::new(Platform::Twitter, "me")
    }

    fn manager(service: StubService) -> ReactionManager<StubService> {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        ReactionManager::new(db, Arc::new(service), viewer())
    }

    #[tokio::test]
    async fn test_like_confirmed_stays_liked() {
        let manager = manager(StubService::default());

        let handle = manager.like("1").await.unwrap();
        handle.join().await;

        let db = manager.db.lock().await;
        let reaction = db.get_reaction("1", &viewer()).unwrap().unwrap();
        assert!(reaction.liked);
    }

    #[tokio::test]
    async fn test_like_failure_reverts() {
        let manager = manager(StubService::failing());

        let handle = manager.like("1").await.unwrap();
        handle.join().await;

        let db = manager.db.lock().await;
        let reaction = db.get_reaction("1", &viewer()).unwrap().unwrap();
        assert!(!reaction.liked);
    }

    #[tokio::test]
    async fn test_optimistic_write_visible_before_confirmation() {
        let mut service = StubService::failing();
        service.gate = Some(Notify::new());
        let manager = manager(service);

        let handle = manager.like("1").await.unwrap();

        // Confirmation is still gated; the optimistic write is already there
        {
            let db = manager.db.lock().await;
            assert!(db.get_reaction("1", &viewer()).unwrap().unwrap().liked);
        }

        manager.service.gate.as_ref().unwrap().notify_one();
        handle.join().await;

        let db = manager.db.lock().await;
        assert!(!db.get_reaction("1", &viewer()).unwrap().unwrap().liked);
    }

    #[tokio::test]
    async fn test_dropped_handle_still_reverts() {
        let mut service = StubService::failing();
        service.gate = Some(Notify::new());
        let manager = manager(service);

        let handle = manager.like("1").await.unwrap();
        drop(handle);

        manager.service.gate.as_ref().unwrap().notify_one();

        // The detached task finishes on its own; poll until the revert lands
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let db = manager.db.lock().await;
            if !db.get_reaction("1", &viewer()).unwrap().unwrap().liked {
                return;
            }
        }
        panic!("optimistic flag was left stuck after handle drop");
    }

    #[tokio::test]
    async fn test_concurrent_like_unlike_last_write_wins() {
        let manager = manager(StubService::default());

        // Issue both without awaiting confirmations in between
        let like = manager.like("1").await.unwrap();
        let unlike = manager.unlike("1").await.unwrap();
        like.join().await;
        unlike.join().await;

        let db = manager.db.lock().await;
        let reaction = db.get_reaction("1", &viewer()).unwrap().unwrap();
        // The unlike was issued last; both confirmations succeeded
        assert!(!reaction.liked);
    }

    #[tokio::test]
    async fn test_repost_failure_does_not_touch_liked() {
        let manager = manager(StubService::default());
        let handle = manager.like("1").await.unwrap();
        handle.join().await;

        manager.service.fail.store(true, Ordering::SeqCst);
        let handle = manager.repost("1").await.unwrap();
        handle.join().await;

        let db = manager.db.lock().await;
        let reaction = db.get_reaction("1", &viewer()).unwrap().unwrap();
        assert!(reaction.liked);
        assert!(!reaction.reposted);
    }
}
