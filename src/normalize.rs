//! Normalization of fetched rich-status graphs into flat entity batches
//!
//! A fetched status arrives as a tree: the post itself with its author, media,
//! links, reaction state and (possibly nested) quoted/replied/reposted
//! statuses embedded. [`normalize`] flattens that tree into one
//! [`NormalizedBatch`] of keyed records, ready for
//! [`Database::save_batch`](crate::db::Database::save_batch).
//!
//! The walk uses an explicit worklist instead of recursion, so reference
//! chains of any depth cannot overflow the stack.

use std::collections::HashSet;

use crate::models::{
    Media, MicroBlogKey, Platform, Reaction, RichStatus, Status, StatusReference, UrlEntity, User,
};

/// Flat output of normalization: one vector per entity table.
///
/// Every reference edge's target status is guaranteed to be present in
/// `statuses`, so persisting the whole batch can never produce a dangling
/// edge.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Status records, deduplicated by status key
    pub statuses: Vec<Status>,
    /// Author profiles, deduplicated by user key
    pub users: Vec<User>,
    /// Media attachments keyed to their statuses
    pub media: Vec<Media>,
    /// Link entities keyed to their statuses
    pub urls: Vec<UrlEntity>,
    /// Reaction state reported by the source, for the viewing account
    pub reactions: Vec<Reaction>,
    /// Typed status-to-status edges
    pub references: Vec<StatusReference>,
}

impl NormalizedBatch {
    /// Whether the batch carries no records at all
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.users.is_empty()
    }
}

/// Flatten fetched rich statuses into a normalized batch.
///
/// `account_key` is the viewing account; embedded reaction state is recorded
/// against it. Statuses and users appearing more than once in the input graph
/// (shared quote targets, repeated authors) are emitted once.
pub fn normalize(fetched: &[RichStatus], account_key: &MicroBlogKey) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen_statuses: HashSet<MicroBlogKey> = HashSet::new();
    let mut seen_users: HashSet<MicroBlogKey> = HashSet::new();
    let mut seen_edges: HashSet<(MicroBlogKey, MicroBlogKey, &'static str)> = HashSet::new();

    // Worklist walk, depth bounded only by input size
    let mut worklist: Vec<&RichStatus> = fetched.iter().rev().collect();

    while let Some(rich) = worklist.pop() {
        let status_key = rich.status_key();

        for reference in &rich.references {
            let target_key = reference.status.status_key();
            // Target first: it joins the worklist before the edge is recorded
            worklist.push(&reference.status);
            if seen_edges.insert((
                status_key.clone(),
                target_key.clone(),
                reference.reference_type.as_str(),
            )) {
                batch.references.push(StatusReference {
                    reference_type: reference.reference_type,
                    status_key: status_key.clone(),
                    reference_status_key: target_key,
                });
            }
        }

        if !seen_statuses.insert(status_key.clone()) {
            continue;
        }

        if seen_users.insert(rich.author.user_key.clone()) {
            batch.users.push(rich.author.clone());
        }

        for (order, media) in rich.media.iter().enumerate() {
            batch.media.push(Media {
                belong_to_key: status_key.clone(),
                url: media.url.clone(),
                preview_url: media.preview_url.clone(),
                media_type: media.media_type,
                alt_text: media.alt_text.clone(),
                order: order as u32,
            });
        }

        for url in &rich.urls {
            batch.urls.push(UrlEntity {
                belong_to_key: status_key.clone(),
                url: url.url.clone(),
                expanded_url: url.expanded_url.clone(),
                display_url: url.display_url.clone(),
                title: url.title.clone(),
                description: url.description.clone(),
                image: url.image.clone(),
            });
        }

        if let Some(reaction) = rich.reaction {
            batch.reactions.push(Reaction {
                status_id: rich.status_id.clone(),
                account_key: account_key.clone(),
                liked: reaction.liked,
                reposted: reaction.reposted,
            });
        }

        batch.statuses.push(Status {
            status_id: rich.status_id.clone(),
            status_key,
            user_key: rich.author.user_key.clone(),
            html_text: rich.html_text.clone(),
            raw_text: raw_text_of(rich),
            timestamp: rich.timestamp,
            reply_count: rich.reply_count,
            like_count: rich.like_count,
            repost_count: rich.repost_count,
            has_media: !rich.media.is_empty(),
            sensitive: rich.sensitive,
            preview_card: rich.preview_card.clone(),
            in_reply_to_status_id: rich.in_reply_to_status_id.clone(),
            platform: rich.platform,
            extra: rich.extra.clone(),
        });
    }

    batch
}

/// Derive the plain-text body. Mastodon-shaped sources deliver HTML; Twitter-
/// shaped sources already deliver plain text.
fn raw_text_of(rich: &RichStatus) -> String {
    match rich.platform {
        Platform::Mastodon => html_to_text(&rich.html_text),
        Platform::Twitter => rich.html_text.clone(),
    }
}

/// Strip HTML down to readable plain text
fn html_to_text(html: &str) -> String {
    let content = html_escape::decode_html_entities(html)
        .to_string()
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("</p><p>", "\n\n");

    // Simple HTML tag removal
    regex_lite::Regex::new(r"<[^>]+>")
        .map(|re| re.replace_all(&content, "").to_string())
        .unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Platform, ReactionState, ReferenceType, RichMedia, User};

    fn author(id: &str) -> User {
        User::new(Platform::Twitter, id, &format!("user{id}"))
    }

    fn rich(id: &str) -> RichStatus {
        RichStatus::new(Platform::Twitter, id, author("7"))
    }

    #[test]
    fn test_flattens_single_status() {
        let viewer = MicroBlogKey::twitter("me");
        let batch = normalize(&[rich("1")], &viewer);

        assert_eq!(batch.statuses.len(), 1);
        assert_eq!(batch.users.len(), 1);
        assert!(batch.references.is_empty());
        assert_eq!(batch.statuses[0].status_key, MicroBlogKey::twitter("1"));
    }

    #[test]
    fn test_reference_target_lands_in_same_batch() {
        let viewer = MicroBlogKey::twitter("me");
        let quoted = rich("2");
        let quoting = rich("1").with_reference(ReferenceType::Quote, quoted);

        let batch = normalize(&[quoting], &viewer);

        assert_eq!(batch.statuses.len(), 2);
        assert_eq!(batch.references.len(), 1);
        let edge = &batch.references[0];
        assert!(batch
            .statuses
            .iter()
            .any(|s| s.status_key == edge.reference_status_key));
    }

    #[test]
    fn test_deep_reference_chain_does_not_recurse() {
        let viewer = MicroBlogKey::twitter("me");
        // Quote-of-quote chain far deeper than any real API response
        let mut status = rich("0");
        for i in 1..=2000 {
            status = rich(&i.to_string()).with_reference(ReferenceType::Quote, status);
        }

        let batch = normalize(&[status], &viewer);
        assert_eq!(batch.statuses.len(), 2001);
        assert_eq!(batch.references.len(), 2000);
    }

    #[test]
    fn test_shared_quote_target_deduplicated() {
        let viewer = MicroBlogKey::twitter("me");
        let a = rich("1").with_reference(ReferenceType::Quote, rich("3"));
        let b = rich("2").with_reference(ReferenceType::Quote, rich("3"));

        let batch = normalize(&[a, b], &viewer);

        assert_eq!(batch.statuses.len(), 3);
        assert_eq!(batch.references.len(), 2);
        // Shared author emitted once
        assert_eq!(batch.users.len(), 1);
    }

    #[test]
    fn test_media_keyed_and_ordered() {
        let viewer = MicroBlogKey::twitter("me");
        let mut status = rich("1");
        status.media = vec![
            RichMedia {
                url: "https://img/a.png".into(),
                preview_url: None,
                media_type: crate::models::MediaType::Image,
                alt_text: None,
            },
            RichMedia {
                url: "https://img/b.png".into(),
                preview_url: None,
                media_type: crate::models::MediaType::Image,
                alt_text: None,
            },
        ];

        let batch = normalize(&[status], &viewer);

        assert_eq!(batch.media.len(), 2);
        assert_eq!(batch.media[0].order, 0);
        assert_eq!(batch.media[1].order, 1);
        assert!(batch.statuses[0].has_media);
    }

    #[test]
    fn test_reaction_seeded_for_viewer() {
        let viewer = MicroBlogKey::twitter("me");
        let mut status = rich("1");
        status.reaction = Some(ReactionState {
            liked: true,
            reposted: false,
        });

        let batch = normalize(&[status], &viewer);

        assert_eq!(batch.reactions.len(), 1);
        assert!(batch.reactions[0].liked);
        assert_eq!(batch.reactions[0].account_key, viewer);
    }

    #[test]
    fn test_mastodon_html_stripped_to_raw_text() {
        let viewer = MicroBlogKey::mastodon("me");
        let mut status = RichStatus::new(Platform::Mastodon, "1", User::new(Platform::Mastodon, "7", "wren"));
        status.html_text = "<p>hello &amp; welcome</p><p>second</p>".to_string();

        let batch = normalize(&[status], &viewer);

        assert_eq!(batch.statuses[0].raw_text, "hello & welcome\n\nsecond");
    }
}
