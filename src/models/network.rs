//! Platform type definitions

use serde::{Deserialize, Serialize};

/// Supported microblogging platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Mastodon (and compatible ActivityPub servers)
    #[default]
    Mastodon,
    /// Twitter-shaped services
    Twitter,
}

impl Platform {
    /// Get all supported platforms
    pub const fn all() -> &'static [Self] {
        &[Self::Mastodon, Self::Twitter]
    }

    /// Get the display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mastodon => "Mastodon",
            Self::Twitter => "Twitter",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mastodon" | "masto" => Some(Self::Mastodon),
            "twitter" | "tw" => Some(Self::Twitter),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_lowercase())
    }
}
