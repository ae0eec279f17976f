//! Rich status: the fetched object graph prior to normalization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    MediaType, MicroBlogKey, Platform, PreviewCard, ReferenceType, StatusExtra, User,
};

/// A fetched post with its embedded author, media, links, reaction state and
/// optional reference targets, exactly as one API response carries it.
///
/// This is the input shape of the normalization pipeline; nothing in it is
/// keyed yet. Reference targets nest arbitrarily deep in principle (quote of
/// a quote), so the normalizer walks them with an explicit worklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichStatus {
    /// Which platform this status came from
    pub platform: Platform,
    /// Remote id on that platform
    pub status_id: String,
    /// Embedded author profile
    pub author: User,
    /// Rendered body
    pub html_text: String,
    /// When the status was created
    pub timestamp: DateTime<Utc>,
    /// Number of replies
    pub reply_count: u64,
    /// Number of likes/favorites
    pub like_count: u64,
    /// Number of reposts/boosts
    pub repost_count: u64,
    /// Whether the source flagged the status as sensitive
    pub sensitive: bool,
    /// Link preview card, if the source provided one
    pub preview_card: Option<PreviewCard>,
    /// Remote id of the status this one replies to
    pub in_reply_to_status_id: Option<String>,
    /// Platform-specific payload
    pub extra: StatusExtra,
    /// Embedded media attachments, in display order
    pub media: Vec<RichMedia>,
    /// Embedded link entities
    pub urls: Vec<RichUrl>,
    /// The viewing account's reaction state, when the source reports it
    pub reaction: Option<ReactionState>,
    /// Embedded reference targets (quoted/replied/reposted statuses)
    pub references: Vec<RichReference>,
}

/// An embedded reference target and the relation that points at it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichReference {
    /// Edge kind
    pub reference_type: ReferenceType,
    /// The referenced status, itself a full rich status
    pub status: Box<RichStatus>,
}

/// Embedded media attachment, not yet keyed to a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichMedia {
    /// Media URL
    pub url: String,
    /// Preview/thumbnail URL
    pub preview_url: Option<String>,
    /// Media type
    pub media_type: MediaType,
    /// Alt text description
    pub alt_text: Option<String>,
}

/// Embedded link entity, not yet keyed to a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichUrl {
    /// Link as it appears in the body
    pub url: String,
    /// Fully expanded link
    pub expanded_url: String,
    /// Display form
    pub display_url: String,
    /// Preview title
    pub title: Option<String>,
    /// Preview description
    pub description: Option<String>,
    /// Preview image URL
    pub image: Option<String>,
}

/// Reaction state embedded in a fetched status
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReactionState {
    /// Server-reported liked flag
    pub liked: bool,
    /// Server-reported reposted flag
    pub reposted: bool,
}

impl RichStatus {
    /// Create a bare rich status with empty body and counters
    pub fn new(platform: Platform, status_id: &str, author: User) -> Self {
        Self {
            platform,
            status_id: status_id.to_string(),
            author,
            html_text: String::new(),
            timestamp: Utc::now(),
            reply_count: 0,
            like_count: 0,
            repost_count: 0,
            sensitive: false,
            preview_card: None,
            in_reply_to_status_id: None,
            extra: StatusExtra::default_for(platform),
            media: Vec::new(),
            urls: Vec::new(),
            reaction: None,
            references: Vec::new(),
        }
    }

    /// Cross-platform key of this status
    pub fn status_key(&self) -> MicroBlogKey {
        MicroBlogKey::new(self.platform, self.status_id.clone())
    }

    /// Attach a reference target
    pub fn with_reference(mut self, reference_type: ReferenceType, status: RichStatus) -> Self {
        self.references.push(RichReference {
            reference_type,
            status: Box::new(status),
        });
        self
    }
}
