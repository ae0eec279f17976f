//! Timeline identity and page membership

use serde::{Deserialize, Serialize};

use super::MicroBlogKey;

/// Kind of logical feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    /// Home feed
    Home,
    /// Mentions/notifications feed
    Mentions,
    /// A single user's posts
    User,
    /// Federated/public feed
    Federated,
}

impl TimelineKind {
    /// Stable text form used in storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Mentions => "mentions",
            Self::User => "user",
            Self::Federated => "federated",
        }
    }

    /// Parse from the stored text form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "home" => Some(Self::Home),
            "mentions" => Some(Self::Mentions),
            "user" => Some(Self::User),
            "federated" => Some(Self::Federated),
            _ => None,
        }
    }
}

/// Identity of one logical timeline: which account is viewing which feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId {
    /// Viewing account
    pub account_key: MicroBlogKey,
    /// Feed kind
    pub kind: TimelineKind,
}

impl TimelineId {
    /// Create a timeline identity
    pub const fn new(account_key: MicroBlogKey, kind: TimelineKind) -> Self {
        Self { account_key, kind }
    }
}

impl std::fmt::Display for TimelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.account_key)
    }
}

/// Membership of one status in one timeline at a given position.
///
/// Rows are appended, never mutated; first-seen ordering wins on repeated
/// fetches of overlapping pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePageEntry {
    /// Timeline the status belongs to
    pub timeline_id: TimelineId,
    /// Member status
    pub status_key: MicroBlogKey,
    /// Position within the timeline
    pub sort_order: i64,
}
