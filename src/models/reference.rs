//! Typed status-to-status references

use serde::{Deserialize, Serialize};

use super::MicroBlogKey;

/// Kind of edge between two statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    /// Source quotes the target
    Quote,
    /// Source replies to the target
    Reply,
    /// Source is a repost/boost of the target
    Retweet,
}

impl ReferenceType {
    /// Stable text form used in storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Reply => "reply",
            Self::Retweet => "retweet",
        }
    }

    /// Parse from the stored text form
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "quote" => Some(Self::Quote),
            "reply" => Some(Self::Reply),
            "retweet" => Some(Self::Retweet),
            _ => None,
        }
    }
}

/// A typed edge from one status to another.
///
/// Unique on `(reference type, status key, referenced status key)`. The
/// referenced status is always normalized into the same batch before the edge
/// is written, so a stored edge never dangles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReference {
    /// Edge kind
    pub reference_type: ReferenceType,
    /// Key of the referring status
    pub status_key: MicroBlogKey,
    /// Key of the referenced status
    pub reference_status_key: MicroBlogKey,
}
