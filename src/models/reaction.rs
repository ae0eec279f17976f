//! Reaction model (the viewing account's like/repost state)

use serde::{Deserialize, Serialize};

use super::MicroBlogKey;

/// The viewing account's reaction to one status.
///
/// Keyed by `(status id, account key)`. This is the only record whose truth
/// is local between fetches: it is mutated optimistically by user actions and
/// a timeline re-fetch never replaces an existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Remote id of the status reacted to
    pub status_id: String,
    /// Key of the account whose reaction this is
    pub account_key: MicroBlogKey,
    /// Whether the account has liked the status
    pub liked: bool,
    /// Whether the account has reposted the status
    pub reposted: bool,
}

impl Reaction {
    /// Fresh reaction record with nothing set
    pub fn empty(status_id: &str, account_key: MicroBlogKey) -> Self {
        Self {
            status_id: status_id.to_string(),
            account_key,
            liked: false,
            reposted: false,
        }
    }
}
