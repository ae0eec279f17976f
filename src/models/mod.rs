//! Data models for Roost

mod key;
mod media;
mod network;
mod reaction;
mod reference;
mod rich;
mod status;
mod timeline;
mod url_entity;
mod user;

pub use key::MicroBlogKey;
pub use media::{Media, MediaType};
pub use network::Platform;
pub use reaction::Reaction;
pub use reference::{ReferenceType, StatusReference};
pub use rich::{ReactionState, RichMedia, RichReference, RichStatus, RichUrl};
pub use status::{
    Emoji, Mention, Poll, PollOption, PreviewCard, ReplySettings, Status, StatusExtra, Visibility,
};
pub use timeline::{TimelineId, TimelineKind, TimelinePageEntry};
pub use url_entity::UrlEntity;
pub use user::User;
