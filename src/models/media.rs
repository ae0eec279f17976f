//! Media attachment model

use serde::{Deserialize, Serialize};

use super::MicroBlogKey;

/// A media attachment belonging to a status.
///
/// Child record: deleted when the parent status is pruned from the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    /// Key of the status this attachment belongs to
    pub belong_to_key: MicroBlogKey,
    /// Media URL
    pub url: String,
    /// Preview/thumbnail URL
    pub preview_url: Option<String>,
    /// Media type
    pub media_type: MediaType,
    /// Alt text description
    pub alt_text: Option<String>,
    /// Position within the status's attachment list
    pub order: u32,
}

/// Media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image (JPEG, PNG, GIF, WebP)
    Image,
    /// Video (MP4, WebM)
    Video,
    /// Animated GIF (Mastodon-specific)
    Gifv,
    /// Audio file
    Audio,
    /// Unknown or unsupported media type
    Unknown,
}

impl MediaType {
    /// Stable text form used in storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Gifv => "gifv",
            Self::Audio => "audio",
            Self::Unknown => "unknown",
        }
    }

    /// Parse from the stored text form
    pub fn from_str(s: &str) -> Self {
        match s {
            "image" => Self::Image,
            "video" => Self::Video,
            "gifv" => Self::Gifv,
            "audio" => Self::Audio,
            _ => Self::Unknown,
        }
    }
}
