//! Status model (unified across platforms)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MicroBlogKey, Platform};

/// A cached status/post record.
///
/// Counters and text are server-authoritative: a re-fetch of the same remote
/// status overwrites them wholesale. The viewing account's reaction state is
/// deliberately NOT part of this record — see [`super::Reaction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Remote id on the originating platform
    pub status_id: String,
    /// Cross-platform key (globally unique)
    pub status_key: MicroBlogKey,
    /// Key of the author
    pub user_key: MicroBlogKey,
    /// Rendered body (HTML for Mastodon-shaped sources)
    pub html_text: String,
    /// Plain-text body, HTML stripped
    pub raw_text: String,
    /// When the status was created
    pub timestamp: DateTime<Utc>,
    /// Number of replies
    pub reply_count: u64,
    /// Number of likes/favorites
    pub like_count: u64,
    /// Number of reposts/boosts
    pub repost_count: u64,
    /// Whether the status carries media attachments
    pub has_media: bool,
    /// Whether the source flagged the status as sensitive
    pub sensitive: bool,
    /// Link preview card, if the source provided one
    pub preview_card: Option<PreviewCard>,
    /// Remote id of the status this one replies to
    pub in_reply_to_status_id: Option<String>,
    /// Which platform this status is from
    pub platform: Platform,
    /// Platform-specific payload
    pub extra: StatusExtra,
}

/// Link preview card attached to a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewCard {
    /// Target link
    pub link: String,
    /// Shortened display form of the link
    pub display_link: Option<String>,
    /// Card title
    pub title: Option<String>,
    /// Card description
    pub description: Option<String>,
    /// Card image URL
    pub image: Option<String>,
}

/// Platform-specific status payload, tagged by platform shape so storage and
/// normalization code can match exhaustively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum StatusExtra {
    /// Twitter-shaped payload
    Twitter {
        /// Who may reply to this status
        reply_settings: ReplySettings,
        /// Quote count, when the API reports it
        quote_count: Option<u64>,
    },
    /// Mastodon-shaped payload
    Mastodon {
        /// Visibility scope
        visibility: Visibility,
        /// Content-warning text shown before the body
        spoiler_text: Option<String>,
        /// Attached poll
        poll: Option<Poll>,
        /// Mentioned accounts
        mentions: Vec<Mention>,
        /// Custom emoji used in the body
        emoji: Vec<Emoji>,
    },
}

impl StatusExtra {
    /// Default payload for a platform
    pub fn default_for(platform: Platform) -> Self {
        match platform {
            Platform::Twitter => Self::Twitter {
                reply_settings: ReplySettings::Everyone,
                quote_count: None,
            },
            Platform::Mastodon => Self::Mastodon {
                visibility: Visibility::Public,
                spoiler_text: None,
                poll: None,
                mentions: Vec::new(),
                emoji: Vec::new(),
            },
        }
    }
}

/// Twitter-shaped reply policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySettings {
    /// Anyone may reply
    #[default]
    Everyone,
    /// Only accounts the author follows
    FollowingOnly,
    /// Only accounts mentioned in the status
    MentionedOnly,
}

/// Mastodon-shaped visibility scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone, shown in public timelines
    #[default]
    Public,
    /// Visible to everyone, not listed publicly
    Unlisted,
    /// Followers only
    Private,
    /// Mentioned accounts only
    Direct,
}

/// Poll attached to a Mastodon-shaped status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    /// Remote poll id
    pub id: String,
    /// Options with their vote counts
    pub options: Vec<PollOption>,
    /// When the poll closes
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether multiple options may be chosen
    pub multiple: bool,
    /// Total number of votes
    pub votes_count: u64,
}

/// One poll option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    /// Option label
    pub title: String,
    /// Votes for this option
    pub votes_count: u64,
}

/// Mentioned account in a status body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Remote id of the mentioned account
    pub id: String,
    /// Account username
    pub username: String,
    /// Full handle including server
    pub acct: String,
}

/// Custom emoji used in a status body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    /// Shortcode without colons
    pub shortcode: String,
    /// Emoji image URL
    pub url: String,
}

impl Status {
    /// Build the public web link for this status, used as the human-readable
    /// back-reference embedded in quote posts.
    pub fn share_link(&self, author_handle: &str) -> String {
        match self.platform {
            Platform::Twitter => {
                format!("https://twitter.com/{author_handle}/status/{}", self.status_id)
            }
            Platform::Mastodon => {
                // acct form is user@server
                match author_handle.split_once('@') {
                    Some((user, server)) => {
                        format!("https://{server}/@{user}/{}", self.status_id)
                    }
                    None => format!("https://mastodon.social/@{author_handle}/{}", self.status_id),
                }
            }
        }
    }
}
