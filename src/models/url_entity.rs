//! Link entity model

use serde::{Deserialize, Serialize};

use super::MicroBlogKey;

/// A link extracted from a status body, with its expanded form and preview
/// metadata. Child record of the status it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntity {
    /// Key of the status this link belongs to
    pub belong_to_key: MicroBlogKey,
    /// Link as it appears in the body (possibly shortened)
    pub url: String,
    /// Fully expanded link
    pub expanded_url: String,
    /// Display form shown to the user
    pub display_url: String,
    /// Preview title
    pub title: Option<String>,
    /// Preview description
    pub description: Option<String>,
    /// Preview image URL
    pub image: Option<String>,
}
