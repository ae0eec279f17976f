//! # Roost 🪺
//!
//! Local cache and reconciliation engine for multi-network microblogging
//! clients.
//!
//! ## Overview
//!
//! Roost mirrors remote statuses, users, media and their relations into a
//! local `SQLite` store and keeps that mirror consistent under concurrent
//! timeline fetches and optimistic user actions. It does not render anything
//! and does not speak HTTP; concrete service bindings implement
//! [`api::StatusService`] and the embedding application reads projections
//! back out of [`db::Database`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StatusService (api)                     │
//! │   fetch_timeline · like/unlike · repost · post · upload     │
//! └─────────────────────────────────────────────────────────────┘
//!          │ fetch                │ confirm            │ publish
//!          ▼                      ▼                    ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │   SyncManager   │ │ ReactionManager │ │    Composer     │
//! │                 │ │                 │ │                 │
//! │ • normalize     │ │ • optimistic    │ │ • upload media  │
//! │ • save batch    │ │   write         │ │ • quote link    │
//! │ • page append   │ │ • revert on     │ │ • cache result  │
//! │                 │ │   failure       │ │                 │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                      │                    │
//!          └──────────────────────┴────────────────────┘
//!                                 │
//!                     ┌─────────────────────┐
//!                     │      Database       │
//!                     │                     │
//!                     │ • statuses · users  │
//!                     │ • media · links     │
//!                     │ • reactions · refs  │
//!                     │ • timeline pages    │
//!                     └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Remote service trait (the engine's only outward dependency)
//! - [`compose`] — Publish pipeline with quote back-references
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` cache: entity store, batch writer, timeline pages
//! - [`models`] — Data models (Status, User, Media, Reaction, ...)
//! - [`normalize`] — Rich-status graph flattening
//! - [`reconcile`] — Optimistic reaction reconciliation
//! - [`sync`] — Timeline fetch pipeline
//!
//! ## Invariants
//!
//! - A stored reference edge's target status is always stored too: the
//!   normalizer flattens targets into the same batch and the batch writer
//!   persists tables in dependency order inside one transaction.
//! - Status counters and text are server truth, overwritten on every fetch;
//!   the viewing account's reaction record is local truth, never overwritten
//!   by a fetch.
//! - A timeline page entry keeps its first-seen position; overlapping
//!   fetches neither reorder nor duplicate.

#![doc(html_root_url = "https://docs.rs/roost/0.2.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod compose;
pub mod config;
pub mod db;
pub mod models;
pub mod normalize;
pub mod paths;
pub mod reconcile;
pub mod sync;

// Re-export main types for convenience
pub use api::{PostPayload, StatusService};
pub use compose::{ComposeData, ComposeError, ComposeHandle, ComposeType, Composer};
pub use config::Config;
pub use db::{Database, StatusDetails};
pub use models::{
    Media, MicroBlogKey, Platform, Reaction, ReferenceType, RichStatus, Status, StatusExtra,
    StatusReference, TimelineId, TimelineKind, User,
};
pub use normalize::{NormalizedBatch, normalize};
pub use reconcile::{ActionHandle, ReactionManager};
pub use sync::SyncManager;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a stderr tracing subscriber honoring `RUST_LOG`, defaulting to
/// `warn`. Call once from the embedding application.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
