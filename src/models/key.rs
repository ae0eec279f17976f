//! Cross-platform entity keys
//!
//! Every cached entity is addressed by a [`MicroBlogKey`]: the pair of the
//! platform it came from and its remote id. The same numeric id can exist on
//! two platforms at once, so neither half alone is unique — the pair is.

use serde::{Deserialize, Serialize};

use super::Platform;

/// Composite identifier `(platform, remote id)` uniquely naming an entity
/// across source services.
///
/// Rendered as `platform:id` when stored in a text column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MicroBlogKey {
    /// Remote id on the originating platform
    pub id: String,
    /// Originating platform
    pub platform: Platform,
}

impl MicroBlogKey {
    /// Create a key from a platform and remote id
    pub fn new(platform: Platform, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform,
        }
    }

    /// Shorthand for a Twitter-shaped key
    pub fn twitter(id: impl Into<String>) -> Self {
        Self::new(Platform::Twitter, id)
    }

    /// Shorthand for a Mastodon-shaped key
    pub fn mastodon(id: impl Into<String>) -> Self {
        Self::new(Platform::Mastodon, id)
    }

    /// Parse the `platform:id` text form
    pub fn parse(s: &str) -> Option<Self> {
        let (platform, id) = s.split_once(':')?;
        let platform = Platform::from_str(platform)?;
        if id.is_empty() {
            return None;
        }
        Some(Self::new(platform, id))
    }
}

impl std::fmt::Display for MicroBlogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_text_form() {
        let key = MicroBlogKey::twitter("12345");
        let parsed = MicroBlogKey::parse(&key.to_string()).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_same_id_different_platform_differs() {
        assert_ne!(MicroBlogKey::twitter("1"), MicroBlogKey::mastodon("1"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MicroBlogKey::parse("no-separator").is_none());
        assert!(MicroBlogKey::parse("plutonet:1").is_none());
        assert!(MicroBlogKey::parse("twitter:").is_none());
    }
}
