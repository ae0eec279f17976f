//! User/profile model

use serde::{Deserialize, Serialize};

use super::{MicroBlogKey, Platform};

/// A cached user profile.
///
/// Profiles are overwritten wholesale on every fetch (last-write-wins); there
/// is no local-only state on this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Cross-platform key
    pub user_key: MicroBlogKey,
    /// Remote id on the originating platform
    pub user_id: String,
    /// Handle without server part
    pub handle: String,
    /// Full handle (`user@server` for Mastodon-shaped accounts)
    pub acct: String,
    /// Display name
    pub display_name: String,
    /// Avatar URL
    pub avatar: Option<String>,
    /// Profile bio
    pub bio: Option<String>,
    /// Follower count
    pub followers_count: u64,
    /// Following count
    pub following_count: u64,
    /// Which platform this profile is from
    pub platform: Platform,
}

impl User {
    /// Create a minimal profile for a platform and id
    pub fn new(platform: Platform, user_id: &str, handle: &str) -> Self {
        Self {
            user_key: MicroBlogKey::new(platform, user_id),
            user_id: user_id.to_string(),
            handle: handle.to_string(),
            acct: handle.to_string(),
            display_name: handle.to_string(),
            avatar: None,
            bio: None,
            followers_count: 0,
            following_count: 0,
            platform,
        }
    }
}
