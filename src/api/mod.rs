//! Remote service collaborator
//!
//! The cache engine never speaks HTTP itself; it consumes an implementation
//! of [`StatusService`] as an opaque set of asynchronous, fallible
//! operations. Concrete bindings (Twitter-shaped, Mastodon-shaped) live with
//! the embedding application.

use std::future::Future;

use anyhow::Result;

use crate::models::{RichStatus, TimelineKind};

/// Outgoing post, fully assembled: content with any back-reference already
/// appended, media already uploaded.
#[derive(Debug, Clone, Default)]
pub struct PostPayload {
    /// Post body
    pub content: String,
    /// Ids returned by prior media uploads
    pub media_ids: Vec<String>,
    /// Remote id of the status being replied to
    pub in_reply_to_status_id: Option<String>,
    /// Remote id of the status being quoted
    pub quote_status_id: Option<String>,
}

/// Unified capability set of a microblogging service.
///
/// Futures are `Send` so confirmation and compose work can run on spawned
/// tasks that outlive the caller.
pub trait StatusService: Send + Sync {
    /// Fetch one page of a timeline
    fn fetch_timeline(
        &self,
        kind: TimelineKind,
        cursor: Option<String>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RichStatus>>> + Send;

    /// Like/favorite a status
    fn like(&self, status_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Unlike/unfavorite a status
    fn unlike(&self, status_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Repost/boost a status
    fn repost(&self, status_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Undo a repost/boost
    fn unrepost(&self, status_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Publish a new status and return it as fetched
    fn post(&self, payload: &PostPayload) -> impl Future<Output = Result<RichStatus>> + Send;

    /// Upload a media blob, returning the service's media id
    fn upload_media(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}
