//! Compose pipeline: upload media, publish, cache the result
//!
//! Each submission runs as its own task behind a [`ComposeHandle`], so the
//! caller can await the outcome, abort the wait, or let it run. Quote posts
//! pull the quoted status from the cache to append a share link; a cache miss
//! drops the link and the post still goes out.

use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::{PostPayload, StatusService};
use crate::db::Database;
use crate::models::MicroBlogKey;
use crate::normalize::normalize;

/// What kind of post is being composed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeType {
    /// A standalone post
    New,
    /// A reply to an existing status
    Reply,
    /// A further post in the author's own thread
    Thread,
    /// A quote of an existing status
    Quote,
}

/// A media blob to upload before posting
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// MIME type of the blob
    pub mime_type: String,
}

/// Everything needed to publish one post
#[derive(Debug, Clone)]
pub struct ComposeData {
    /// Post body as the user wrote it
    pub content: String,
    /// Media to upload first
    pub media: Vec<MediaUpload>,
    /// Kind of post
    pub compose_type: ComposeType,
    /// Target status for replies, thread posts and quotes
    pub status_key: Option<MicroBlogKey>,
}

impl ComposeData {
    /// A plain text post with no media or target
    pub fn new_post(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            media: Vec::new(),
            compose_type: ComposeType::New,
            status_key: None,
        }
    }

    /// A quote of the given status
    pub fn quote(content: impl Into<String>, status_key: MicroBlogKey) -> Self {
        Self {
            content: content.into(),
            media: Vec::new(),
            compose_type: ComposeType::Quote,
            status_key: Some(status_key),
        }
    }

    /// A reply to the given status
    pub fn reply(content: impl Into<String>, status_key: MicroBlogKey) -> Self {
        Self {
            content: content.into(),
            media: Vec::new(),
            compose_type: ComposeType::Reply,
            status_key: Some(status_key),
        }
    }
}

/// Compose failures callers may want to match on
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The service accepted the upload but returned no usable media id
    #[error("media upload returned no id")]
    UploadFailed,
}

/// Handle to an in-flight compose task.
///
/// The task keeps running if the handle is dropped; `abort` cancels it
/// explicitly.
pub struct ComposeHandle {
    inner: JoinHandle<Result<MicroBlogKey>>,
}

impl ComposeHandle {
    /// Wait for the post to publish, returning the key of the cached result
    pub async fn join(self) -> Result<MicroBlogKey> {
        self.inner.await.context("Compose task was aborted")?
    }

    /// Cancel the compose task
    pub fn abort(&self) {
        self.inner.abort();
    }

    /// Whether the task has completed
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

/// Publishes posts as a given account and caches the results
pub struct Composer<S> {
    db: Arc<Mutex<Database>>,
    service: Arc<S>,
    account_key: MicroBlogKey,
}

impl<S: StatusService + 'static> Composer<S> {
    /// Create a composer acting as the given account
    pub fn new(db: Arc<Mutex<Database>>, service: Arc<S>, account_key: MicroBlogKey) -> Self {
        Self {
            db,
            service,
            account_key,
        }
    }

    /// Submit a post for publication, returning a handle the caller owns
    pub fn submit(&self, data: ComposeData) -> ComposeHandle {
        let db = Arc::clone(&self.db);
        let service = Arc::clone(&self.service);
        let account_key = self.account_key.clone();

        ComposeHandle {
            inner: tokio::spawn(run_compose(db, service, account_key, data)),
        }
    }
}

async fn run_compose<S: StatusService>(
    db: Arc<Mutex<Database>>,
    service: Arc<S>,
    account_key: MicroBlogKey,
    data: ComposeData,
) -> Result<MicroBlogKey> {
    // Uploads come first; any failure aborts the compose with no partial post
    let mut media_ids = Vec::with_capacity(data.media.len());
    for media in &data.media {
        let id = service
            .upload_media(&media.bytes, &media.mime_type)
            .await
            .context("Media upload failed")?;
        if id.is_empty() {
            return Err(ComposeError::UploadFailed.into());
        }
        media_ids.push(id);
    }

    let content = back_referenced_content(&db, &account_key, &data).await?;

    let payload = PostPayload {
        content,
        media_ids,
        in_reply_to_status_id: match data.compose_type {
            ComposeType::Reply | ComposeType::Thread => {
                data.status_key.as_ref().map(|key| key.id.clone())
            }
            ComposeType::New | ComposeType::Quote => None,
        },
        quote_status_id: match data.compose_type {
            ComposeType::Quote => data.status_key.as_ref().map(|key| key.id.clone()),
            _ => None,
        },
    };

    let posted = service
        .post(&payload)
        .await
        .context("Failed to publish post")?;
    let key = posted.status_key();

    // The returned status is cached like any fetched one
    let batch = normalize(&[posted], &account_key);
    db.lock()
        .await
        .save_batch(&batch)
        .context("Failed to cache published post")?;

    tracing::debug!("Published and cached {}", key);
    Ok(key)
}

/// For quote posts, append the quoted status's share link to the content.
/// A quoted status missing from the cache is not an error; the link is
/// simply omitted.
async fn back_referenced_content(
    db: &Arc<Mutex<Database>>,
    account_key: &MicroBlogKey,
    data: &ComposeData,
) -> Result<String> {
    let (ComposeType::Quote, Some(key)) = (data.compose_type, &data.status_key) else {
        return Ok(data.content.clone());
    };

    let db = db.lock().await;
    match db.get_status_details(key, account_key)? {
        Some(details) => {
            let handle = details
                .user
                .map_or_else(|| details.status.user_key.id.clone(), |user| user.acct);
            Ok(format!(
                "{} {}",
                data.content,
                details.status.share_link(&handle)
            ))
        }
        None => {
            tracing::debug!("Quoted status {} not cached; posting without back-reference", key);
            Ok(data.content.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Platform, RichStatus, TimelineKind, User};
    use anyhow::bail;
    use std::sync::Mutex as StdMutex;

    /// Service that records the payload it was asked to post
    #[derive(Default)]
    struct StubService {
        posted: StdMutex<Vec<PostPayload>>,
        uploaded: StdMutex<Vec<String>>,
        empty_upload_id: bool,
    }

    impl StatusService for StubService {
        async fn fetch_timeline(
            &self,
            _kind: TimelineKind,
            _cursor: Option<String>,
            _limit: usize,
        ) -> Result<Vec<RichStatus>> {
            bail!("not used")
        }

        async fn like(&self, _status_id: &str) -> Result<()> {
            bail!("not used")
        }

        async fn unlike(&self, _status_id: &str) -> Result<()> {
            bail!("not used")
        }

        async fn repost(&self, _status_id: &str) -> Result<()> {
            bail!("not used")
        }

        async fn unrepost(&self, _status_id: &str) -> Result<()> {
            bail!("not used")
        }

        async fn post(&self, payload: &PostPayload) -> Result<RichStatus> {
            self.posted.lock().unwrap().push(payload.clone());
            let mut status = RichStatus::new(
                Platform::Twitter,
                "900",
                User::new(Platform::Twitter, "me", "me"),
            );
            status.html_text.clone_from(&payload.content);
            Ok(status)
        }

        async fn upload_media(&self, _bytes: &[u8], mime_type: &str) -> Result<String> {
            if self.empty_upload_id {
                return Ok(String::new());
            }
            let id = format!("media-{}", mime_type);
            self.uploaded.lock().unwrap().push(id.clone());
            Ok(id)
        }
    }

    fn viewer() -> MicroBlogKey {
        MicroBlogKey::twitter("me")
    }

    fn composer(service: StubService) -> Composer<StubService> {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        Composer::new(db, Arc::new(service), viewer())
    }

    #[tokio::test]
    async fn test_new_post_published_and_cached() {
        let composer = composer(StubService::default());

        let key = composer
            .submit(ComposeData::new_post("hello"))
            .join()
            .await
            .unwrap();

        assert_eq!(key, MicroBlogKey::twitter("900"));
        let db = composer.db.lock().await;
        assert!(db.contains_status(&key).unwrap());
    }

    #[tokio::test]
    async fn test_quote_of_cached_status_appends_share_link() {
        let composer = composer(StubService::default());

        // Cache the status being quoted
        {
            let quoted = RichStatus::new(
                Platform::Twitter,
                "42",
                User::new(Platform::Twitter, "7", "songbird"),
            );
            let batch = normalize(&[quoted], &viewer());
            composer.db.lock().await.save_batch(&batch).unwrap();
        }

        composer
            .submit(ComposeData::quote("look at this", MicroBlogKey::twitter("42")))
            .join()
            .await
            .unwrap();

        let posted = composer.service.posted.lock().unwrap();
        assert_eq!(
            posted[0].content,
            "look at this https://twitter.com/songbird/status/42"
        );
        assert_eq!(posted[0].quote_status_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_quote_of_uncached_status_posts_without_link() {
        let composer = composer(StubService::default());

        let result = composer
            .submit(ComposeData::quote("look at this", MicroBlogKey::twitter("404")))
            .join()
            .await;

        assert!(result.is_ok());
        let posted = composer.service.posted.lock().unwrap();
        assert_eq!(posted[0].content, "look at this");
    }

    #[tokio::test]
    async fn test_reply_carries_target_id() {
        let composer = composer(StubService::default());

        composer
            .submit(ComposeData::reply("agreed", MicroBlogKey::twitter("42")))
            .join()
            .await
            .unwrap();

        let posted = composer.service.posted.lock().unwrap();
        assert_eq!(posted[0].in_reply_to_status_id.as_deref(), Some("42"));
        assert_eq!(posted[0].quote_status_id, None);
    }

    #[tokio::test]
    async fn test_empty_upload_id_aborts_post() {
        let service = StubService {
            empty_upload_id: true,
            ..StubService::default()
        };
        let composer = composer(service);

        let mut data = ComposeData::new_post("with media");
        data.media.push(MediaUpload {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        });

        let result = composer.submit(data).join().await;

        assert!(result.is_err());
        // No partial post was created
        assert!(composer.service.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_media_uploaded_before_post() {
        let composer = composer(StubService::default());

        let mut data = ComposeData::new_post("with media");
        data.media.push(MediaUpload {
            bytes: vec![1, 2, 3],
            mime_type: "image/png".to_string(),
        });

        composer.submit(data).join().await.unwrap();

        let posted = composer.service.posted.lock().unwrap();
        assert_eq!(posted[0].media_ids, vec!["media-image/png".to_string()]);
    }
}
