//! `SQLite` storage for the normalized cache
//!
//! One [`Database`] owns every cached record. Writes from the fetch pipeline
//! arrive as a [`NormalizedBatch`] and are applied inside a single
//! transaction in dependency order (users → media → statuses → links →
//! reactions → references), so a failed batch never leaves an edge pointing
//! at a missing status. Reaction rows are the one exception to replace
//! semantics: a fetch may seed them but never overwrites an existing row.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{
    Media, MediaType, MicroBlogKey, Platform, Reaction, ReferenceType, Status, StatusExtra,
    StatusReference, TimelineId, TimelinePageEntry, UrlEntity, User,
};
use crate::normalize::NormalizedBatch;
use crate::paths;

/// A status joined with its children, the shape the UI layer reads.
#[derive(Debug, Clone)]
pub struct StatusDetails {
    /// The status record itself
    pub status: Status,
    /// Author profile, when cached
    pub user: Option<User>,
    /// Media attachments in display order
    pub media: Vec<Media>,
    /// Link entities
    pub urls: Vec<UrlEntity>,
    /// The viewing account's reaction, when one exists
    pub reaction: Option<Reaction>,
    /// Outgoing reference edges
    pub references: Vec<StatusReference>,
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the default location
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_path(&path)
    }

    /// Open or create the database at a specific path
    pub fn open_path(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        let db = Self { conn };
        db.init()?;

        Ok(db)
    }

    /// Open an in-memory database (used by tests and ephemeral sessions)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        paths::database_path()
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                user_key TEXT NOT NULL,
                user_id TEXT NOT NULL,
                handle TEXT NOT NULL,
                acct TEXT NOT NULL,
                display_name TEXT NOT NULL,
                avatar TEXT,
                bio TEXT,
                followers_count INTEGER NOT NULL DEFAULT 0,
                following_count INTEGER NOT NULL DEFAULT 0,
                platform TEXT NOT NULL,
                UNIQUE(user_key)
            );

            -- Statuses table
            CREATE TABLE IF NOT EXISTS statuses (
                id TEXT PRIMARY KEY,
                status_id TEXT NOT NULL,
                status_key TEXT NOT NULL,
                user_key TEXT NOT NULL,
                html_text TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                reply_count INTEGER NOT NULL DEFAULT 0,
                like_count INTEGER NOT NULL DEFAULT 0,
                repost_count INTEGER NOT NULL DEFAULT 0,
                has_media INTEGER NOT NULL DEFAULT 0,
                sensitive INTEGER NOT NULL DEFAULT 0,
                preview_card TEXT,
                in_reply_to_status_id TEXT,
                platform TEXT NOT NULL,
                extra TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                UNIQUE(status_key)
            );

            -- Media table (children of statuses)
            CREATE TABLE IF NOT EXISTS media (
                id TEXT PRIMARY KEY,
                belong_to_key TEXT NOT NULL,
                url TEXT NOT NULL,
                preview_url TEXT,
                media_type TEXT NOT NULL,
                alt_text TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0,
                UNIQUE(belong_to_key, sort_order)
            );

            -- Link entities table (children of statuses)
            CREATE TABLE IF NOT EXISTS url_entities (
                id TEXT PRIMARY KEY,
                belong_to_key TEXT NOT NULL,
                url TEXT NOT NULL,
                expanded_url TEXT NOT NULL,
                display_url TEXT NOT NULL,
                title TEXT,
                description TEXT,
                image TEXT,
                UNIQUE(belong_to_key, url)
            );

            -- Reactions table (per status and viewing account)
            CREATE TABLE IF NOT EXISTS reactions (
                id TEXT PRIMARY KEY,
                status_id TEXT NOT NULL,
                account_key TEXT NOT NULL,
                liked INTEGER NOT NULL DEFAULT 0,
                reposted INTEGER NOT NULL DEFAULT 0,
                UNIQUE(status_id, account_key)
            );

            -- Status reference edges
            CREATE TABLE IF NOT EXISTS status_references (
                id TEXT PRIMARY KEY,
                reference_type TEXT NOT NULL,
                status_key TEXT NOT NULL,
                reference_status_key TEXT NOT NULL,
                UNIQUE(reference_type, status_key, reference_status_key)
            );

            -- Timeline page membership
            CREATE TABLE IF NOT EXISTS timeline_entries (
                id TEXT PRIMARY KEY,
                timeline_id TEXT NOT NULL,
                status_key TEXT NOT NULL,
                sort_order INTEGER NOT NULL,
                UNIQUE(timeline_id, status_key)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_statuses_user ON statuses(user_key);
            CREATE INDEX IF NOT EXISTS idx_statuses_cached_at ON statuses(cached_at);
            CREATE INDEX IF NOT EXISTS idx_media_belong ON media(belong_to_key);
            CREATE INDEX IF NOT EXISTS idx_urls_belong ON url_entities(belong_to_key);
            CREATE INDEX IF NOT EXISTS idx_references_source ON status_references(status_key);
            CREATE INDEX IF NOT EXISTS idx_timeline_order ON timeline_entries(timeline_id, sort_order);
            ",
        )?;

        Ok(())
    }

    // ==================== Batch writes ====================

    /// Persist a normalized batch atomically.
    ///
    /// Tables are written in dependency order so a mid-batch fault (rolled
    /// back in full) can never produce a child row without its parent. Any
    /// step failing rolls back the whole batch.
    pub fn save_batch(&mut self, batch: &NormalizedBatch) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin batch transaction")?;

        for user in &batch.users {
            Self::put_user(&tx, user)?;
        }
        for media in &batch.media {
            Self::put_media(&tx, media)?;
        }
        for status in &batch.statuses {
            Self::put_status(&tx, status)?;
        }
        for url in &batch.urls {
            Self::put_url_entity(&tx, url)?;
        }
        for reaction in &batch.reactions {
            Self::seed_reaction(&tx, reaction)?;
        }
        for reference in &batch.references {
            Self::put_reference(&tx, reference)?;
        }

        tx.commit().context("Failed to commit batch")
    }

    fn put_user(conn: &Connection, user: &User) -> Result<()> {
        conn.execute(
            r"INSERT OR REPLACE INTO users
               (id, user_key, user_id, handle, acct, display_name, avatar, bio,
                followers_count, following_count, platform)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                Uuid::new_v4().to_string(),
                user.user_key.to_string(),
                user.user_id,
                user.handle,
                user.acct,
                user.display_name,
                user.avatar,
                user.bio,
                user.followers_count as i64,
                user.following_count as i64,
                user.platform.to_string(),
            ],
        )?;
        Ok(())
    }

    fn put_media(conn: &Connection, media: &Media) -> Result<()> {
        conn.execute(
            r"INSERT OR REPLACE INTO media
               (id, belong_to_key, url, preview_url, media_type, alt_text, sort_order)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Uuid::new_v4().to_string(),
                media.belong_to_key.to_string(),
                media.url,
                media.preview_url,
                media.media_type.as_str(),
                media.alt_text,
                media.order,
            ],
        )?;
        Ok(())
    }

    fn put_status(conn: &Connection, status: &Status) -> Result<()> {
        let preview_card = status
            .preview_card
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize preview card")?;
        let extra =
            serde_json::to_string(&status.extra).context("Failed to serialize status extra")?;

        conn.execute(
            r"INSERT OR REPLACE INTO statuses
               (id, status_id, status_key, user_key, html_text, raw_text, timestamp,
                reply_count, like_count, repost_count, has_media, sensitive,
                preview_card, in_reply_to_status_id, platform, extra, cached_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                Uuid::new_v4().to_string(),
                status.status_id,
                status.status_key.to_string(),
                status.user_key.to_string(),
                status.html_text,
                status.raw_text,
                status.timestamp.to_rfc3339(),
                status.reply_count as i64,
                status.like_count as i64,
                status.repost_count as i64,
                i32::from(status.has_media),
                i32::from(status.sensitive),
                preview_card,
                status.in_reply_to_status_id,
                status.platform.to_string(),
                extra,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn put_url_entity(conn: &Connection, url: &UrlEntity) -> Result<()> {
        conn.execute(
            r"INSERT OR REPLACE INTO url_entities
               (id, belong_to_key, url, expanded_url, display_url, title, description, image)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Uuid::new_v4().to_string(),
                url.belong_to_key.to_string(),
                url.url,
                url.expanded_url,
                url.display_url,
                url.title,
                url.description,
                url.image,
            ],
        )?;
        Ok(())
    }

    /// Insert a fetched reaction only if no row exists yet. Local reaction
    /// state is authoritative between fetches; a re-fetch must not clobber a
    /// pending optimistic write.
    fn seed_reaction(conn: &Connection, reaction: &Reaction) -> Result<()> {
        conn.execute(
            r"INSERT OR IGNORE INTO reactions
               (id, status_id, account_key, liked, reposted)
               VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                reaction.status_id,
                reaction.account_key.to_string(),
                i32::from(reaction.liked),
                i32::from(reaction.reposted),
            ],
        )?;
        Ok(())
    }

    fn put_reference(conn: &Connection, reference: &StatusReference) -> Result<()> {
        conn.execute(
            r"INSERT OR REPLACE INTO status_references
               (id, reference_type, status_key, reference_status_key)
               VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                reference.reference_type.as_str(),
                reference.status_key.to_string(),
                reference.reference_status_key.to_string(),
            ],
        )?;
        Ok(())
    }

    // ==================== Reactions ====================

    /// Get the reaction record for a status and viewing account
    pub fn get_reaction(
        &self,
        status_id: &str,
        account_key: &MicroBlogKey,
    ) -> Result<Option<Reaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT status_id, account_key, liked, reposted
             FROM reactions WHERE status_id = ?1 AND account_key = ?2",
        )?;

        let result = stmt.query_row(
            params![status_id, account_key.to_string()],
            Self::row_to_reaction,
        );

        match result {
            Ok(reaction) => Ok(Some(reaction)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace a reaction record. This is the write path of the
    /// optimistic protocol; replace is atomic per row.
    pub fn upsert_reaction(&self, reaction: &Reaction) -> Result<()> {
        self.conn.execute(
            r"INSERT OR REPLACE INTO reactions
               (id, status_id, account_key, liked, reposted)
               VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                reaction.status_id,
                reaction.account_key.to_string(),
                i32::from(reaction.liked),
                i32::from(reaction.reposted),
            ],
        )?;
        Ok(())
    }

    // ==================== Status reads ====================

    /// Whether a status with this key is cached
    pub fn contains_status(&self, key: &MicroBlogKey) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM statuses WHERE status_key = ?1",
            params![key.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a single status record by key
    pub fn get_status(&self, key: &MicroBlogKey) -> Result<Option<Status>> {
        let mut stmt = self.conn.prepare(
            "SELECT status_id, status_key, user_key, html_text, raw_text, timestamp,
                    reply_count, like_count, repost_count, has_media, sensitive,
                    preview_card, in_reply_to_status_id, platform, extra
             FROM statuses WHERE status_key = ?1",
        )?;

        let result = stmt.query_row(params![key.to_string()], Self::row_to_status);

        match result {
            Ok(status) => Ok(Some(status)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a status joined with its user, media, links, reaction and
    /// reference edges, for the given viewing account
    pub fn get_status_details(
        &self,
        key: &MicroBlogKey,
        account_key: &MicroBlogKey,
    ) -> Result<Option<StatusDetails>> {
        let Some(status) = self.get_status(key)? else {
            return Ok(None);
        };

        let user = self.get_user(&status.user_key)?;
        let media = self.get_media_for(key)?;
        let urls = self.get_url_entities_for(key)?;
        let reaction = self.get_reaction(&status.status_id, account_key)?;
        let references = self.get_references_for(key)?;

        Ok(Some(StatusDetails {
            status,
            user,
            media,
            urls,
            reaction,
            references,
        }))
    }

    /// Get a cached user profile by key
    pub fn get_user(&self, key: &MicroBlogKey) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_key, user_id, handle, acct, display_name, avatar, bio,
                    followers_count, following_count, platform
             FROM users WHERE user_key = ?1",
        )?;

        let result = stmt.query_row(params![key.to_string()], Self::row_to_user);

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get media attachments of a status, in display order
    pub fn get_media_for(&self, status_key: &MicroBlogKey) -> Result<Vec<Media>> {
        let mut stmt = self.conn.prepare(
            "SELECT belong_to_key, url, preview_url, media_type, alt_text, sort_order
             FROM media WHERE belong_to_key = ?1 ORDER BY sort_order ASC",
        )?;

        let rows = stmt.query_map(params![status_key.to_string()], |row| {
            Ok(Media {
                belong_to_key: parse_key_column(row.get(0)?)?,
                url: row.get(1)?,
                preview_url: row.get(2)?,
                media_type: MediaType::from_str(&row.get::<_, String>(3)?),
                alt_text: row.get(4)?,
                order: row.get(5)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get link entities of a status
    pub fn get_url_entities_for(&self, status_key: &MicroBlogKey) -> Result<Vec<UrlEntity>> {
        let mut stmt = self.conn.prepare(
            "SELECT belong_to_key, url, expanded_url, display_url, title, description, image
             FROM url_entities WHERE belong_to_key = ?1",
        )?;

        let rows = stmt.query_map(params![status_key.to_string()], |row| {
            Ok(UrlEntity {
                belong_to_key: parse_key_column(row.get(0)?)?,
                url: row.get(1)?,
                expanded_url: row.get(2)?,
                display_url: row.get(3)?,
                title: row.get(4)?,
                description: row.get(5)?,
                image: row.get(6)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get outgoing reference edges of a status
    pub fn get_references_for(&self, status_key: &MicroBlogKey) -> Result<Vec<StatusReference>> {
        let mut stmt = self.conn.prepare(
            "SELECT reference_type, status_key, reference_status_key
             FROM status_references WHERE status_key = ?1",
        )?;

        let rows = stmt.query_map(params![status_key.to_string()], |row| {
            let type_str: String = row.get(0)?;
            Ok(StatusReference {
                reference_type: ReferenceType::from_str(&type_str)
                    .unwrap_or(ReferenceType::Quote),
                status_key: parse_key_column(row.get(1)?)?,
                reference_status_key: parse_key_column(row.get(2)?)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count stored statuses (used by retention and tests)
    pub fn count_statuses(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM statuses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ==================== Timeline pages ====================

    /// Append one fetched page of status keys to a timeline.
    ///
    /// De-duplicates across pages: a status already in the timeline keeps its
    /// original position, so cursor overlap between fetches neither reorders
    /// nor duplicates. Ignored keys do not consume positions.
    pub fn append_timeline_page(
        &mut self,
        timeline_id: &TimelineId,
        ordered_status_keys: &[MicroBlogKey],
    ) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin timeline transaction")?;

        let timeline = timeline_id.to_string();
        let mut next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM timeline_entries WHERE timeline_id = ?1",
            params![timeline],
            |row| row.get(0),
        )?;

        for key in ordered_status_keys {
            let inserted = tx.execute(
                r"INSERT OR IGNORE INTO timeline_entries
                   (id, timeline_id, status_key, sort_order)
                   VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    timeline,
                    key.to_string(),
                    next
                ],
            )?;
            if inserted > 0 {
                next += 1;
            }
        }

        tx.commit().context("Failed to commit timeline page")
    }

    /// Get the ordered status keys of a timeline
    pub fn get_timeline_page(&self, timeline_id: &TimelineId) -> Result<Vec<MicroBlogKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT status_key FROM timeline_entries
             WHERE timeline_id = ?1 ORDER BY sort_order ASC",
        )?;

        let rows = stmt.query_map(params![timeline_id.to_string()], |row| {
            parse_key_column(row.get(0)?)
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get a timeline's entries with their positions
    pub fn get_timeline_entries(
        &self,
        timeline_id: &TimelineId,
    ) -> Result<Vec<TimelinePageEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT status_key, sort_order FROM timeline_entries
             WHERE timeline_id = ?1 ORDER BY sort_order ASC",
        )?;

        let rows = stmt.query_map(params![timeline_id.to_string()], |row| {
            Ok(TimelinePageEntry {
                timeline_id: timeline_id.clone(),
                status_key: parse_key_column(row.get(0)?)?,
                sort_order: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get a timeline's statuses joined with their children, in page order
    pub fn get_timeline_statuses(
        &self,
        timeline_id: &TimelineId,
    ) -> Result<Vec<StatusDetails>> {
        let keys = self.get_timeline_page(timeline_id)?;
        let mut details = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(d) = self.get_status_details(key, &timeline_id.account_key)? {
                details.push(d);
            }
        }
        Ok(details)
    }

    // ==================== Retention ====================

    /// Delete statuses cached before the cutoff, cascading to their media,
    /// links, reactions, reference edges (either side) and timeline entries.
    /// Returns the number of statuses removed.
    pub fn clear_old_cache(&mut self, max_age_hours: u64) -> Result<usize> {
        let cutoff = (Utc::now() - chrono::Duration::hours(max_age_hours as i64)).to_rfc3339();

        let tx = self
            .conn
            .transaction()
            .context("Failed to begin retention transaction")?;

        tx.execute(
            "DELETE FROM media WHERE belong_to_key IN
               (SELECT status_key FROM statuses WHERE cached_at < ?1)",
            params![cutoff],
        )?;
        tx.execute(
            "DELETE FROM url_entities WHERE belong_to_key IN
               (SELECT status_key FROM statuses WHERE cached_at < ?1)",
            params![cutoff],
        )?;
        tx.execute(
            "DELETE FROM reactions WHERE status_id IN
               (SELECT status_id FROM statuses WHERE cached_at < ?1)",
            params![cutoff],
        )?;
        tx.execute(
            "DELETE FROM status_references WHERE
               status_key IN (SELECT status_key FROM statuses WHERE cached_at < ?1)
               OR reference_status_key IN (SELECT status_key FROM statuses WHERE cached_at < ?1)",
            params![cutoff],
        )?;
        tx.execute(
            "DELETE FROM timeline_entries WHERE status_key IN
               (SELECT status_key FROM statuses WHERE cached_at < ?1)",
            params![cutoff],
        )?;
        let removed = tx.execute("DELETE FROM statuses WHERE cached_at < ?1", params![cutoff])?;

        tx.commit().context("Failed to commit retention pass")?;
        Ok(removed)
    }

    // ==================== Row mapping ====================

    fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<Status> {
        let platform_str: String = row.get(13)?;
        let platform = Platform::from_str(&platform_str).unwrap_or_default();

        let preview_card = row
            .get::<_, Option<String>>(11)?
            .and_then(|json| serde_json::from_str(&json).ok());
        let extra: StatusExtra = serde_json::from_str(&row.get::<_, String>(14)?)
            .unwrap_or_else(|_| StatusExtra::default_for(platform));

        Ok(Status {
            status_id: row.get(0)?,
            status_key: parse_key_column(row.get(1)?)?,
            user_key: parse_key_column(row.get(2)?)?,
            html_text: row.get(3)?,
            raw_text: row.get(4)?,
            timestamp: DateTime::parse_from_rfc3339(&row.get::<_, String>(5)?)
                .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc)),
            reply_count: row.get::<_, i64>(6)? as u64,
            like_count: row.get::<_, i64>(7)? as u64,
            repost_count: row.get::<_, i64>(8)? as u64,
            has_media: row.get::<_, i32>(9)? != 0,
            sensitive: row.get::<_, i32>(10)? != 0,
            preview_card,
            in_reply_to_status_id: row.get(12)?,
            platform,
            extra,
        })
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let platform_str: String = row.get(9)?;

        Ok(User {
            user_key: parse_key_column(row.get(0)?)?,
            user_id: row.get(1)?,
            handle: row.get(2)?,
            acct: row.get(3)?,
            display_name: row.get(4)?,
            avatar: row.get(5)?,
            bio: row.get(6)?,
            followers_count: row.get::<_, i64>(7)? as u64,
            following_count: row.get::<_, i64>(8)? as u64,
            platform: Platform::from_str(&platform_str).unwrap_or_default(),
        })
    }

    fn row_to_reaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reaction> {
        Ok(Reaction {
            status_id: row.get(0)?,
            account_key: parse_key_column(row.get(1)?)?,
            liked: row.get::<_, i32>(2)? != 0,
            reposted: row.get::<_, i32>(3)? != 0,
        })
    }
}

/// Parse a stored `platform:id` key column, surfacing corruption instead of
/// defaulting.
fn parse_key_column(text: String) -> rusqlite::Result<MicroBlogKey> {
    MicroBlogKey::parse(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("invalid entity key: {text}").into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReactionState, ReferenceType, RichStatus, TimelineKind};
    use crate::normalize::normalize;
    use tempfile::tempdir;

    fn viewer() -> MicroBlogKey {
        MicroBlogKey::twitter("me")
    }

    fn rich(id: &str) -> RichStatus {
        RichStatus::new(
            Platform::Twitter,
            id,
            User::new(Platform::Twitter, "7", "songbird"),
        )
    }

    #[test]
    fn test_database_init() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let _db = Database::open_path(&path).unwrap();
        // Should create without error
    }

    #[test]
    fn test_save_batch_and_read_back() {
        let mut db = Database::open_in_memory().unwrap();

        let mut status = rich("1");
        status.html_text = "hello".to_string();
        let batch = normalize(&[status], &viewer());
        db.save_batch(&batch).unwrap();

        let details = db
            .get_status_details(&MicroBlogKey::twitter("1"), &viewer())
            .unwrap()
            .unwrap();
        assert_eq!(details.status.raw_text, "hello");
        assert_eq!(details.user.unwrap().handle, "songbird");
    }

    #[test]
    fn test_no_dangling_reference_targets() {
        let mut db = Database::open_in_memory().unwrap();

        let quoting = rich("1").with_reference(ReferenceType::Quote, rich("2"));
        let batch = normalize(&[quoting], &viewer());
        db.save_batch(&batch).unwrap();

        let refs = db.get_references_for(&MicroBlogKey::twitter("1")).unwrap();
        assert_eq!(refs.len(), 1);
        for r in &refs {
            assert!(db.contains_status(&r.reference_status_key).unwrap());
        }
    }

    #[test]
    fn test_double_save_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();

        let quoting = rich("1").with_reference(ReferenceType::Reply, rich("2"));
        let batch = normalize(&[quoting.clone()], &viewer());
        db.save_batch(&batch).unwrap();
        let batch = normalize(&[quoting], &viewer());
        db.save_batch(&batch).unwrap();

        assert_eq!(db.count_statuses().unwrap(), 2);
        assert_eq!(
            db.get_references_for(&MicroBlogKey::twitter("1"))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            db.get_media_for(&MicroBlogKey::twitter("1")).unwrap().len(),
            0
        );
    }

    #[test]
    fn test_refetch_overwrites_counters_not_reaction() {
        let mut db = Database::open_in_memory().unwrap();

        let mut status = rich("1");
        status.like_count = 5;
        status.reaction = Some(ReactionState {
            liked: false,
            reposted: false,
        });
        db.save_batch(&normalize(&[status.clone()], &viewer())).unwrap();

        // Local optimistic like lands between fetches
        let mut reaction = db.get_reaction("1", &viewer()).unwrap().unwrap();
        reaction.liked = true;
        db.upsert_reaction(&reaction).unwrap();

        // Re-fetch reports new counters and stale reaction state
        status.like_count = 6;
        db.save_batch(&normalize(&[status], &viewer())).unwrap();

        let stored = db.get_status(&MicroBlogKey::twitter("1")).unwrap().unwrap();
        assert_eq!(stored.like_count, 6);
        // The optimistic write survived the re-fetch
        assert!(db.get_reaction("1", &viewer()).unwrap().unwrap().liked);
    }

    #[test]
    fn test_timeline_page_deduplication() {
        let mut db = Database::open_in_memory().unwrap();
        let timeline = TimelineId::new(viewer(), TimelineKind::Home);

        let a = MicroBlogKey::twitter("a");
        let b = MicroBlogKey::twitter("b");
        let c = MicroBlogKey::twitter("c");
        let d = MicroBlogKey::twitter("d");

        db.append_timeline_page(&timeline, &[a.clone(), b.clone(), c.clone()])
            .unwrap();
        db.append_timeline_page(&timeline, &[b.clone(), c.clone(), d.clone()])
            .unwrap();

        let page = db.get_timeline_page(&timeline).unwrap();
        assert_eq!(page, vec![a, b, c, d]);

        // Positions are contiguous and first-seen
        let entries = db.get_timeline_entries(&timeline).unwrap();
        let orders: Vec<i64> = entries.iter().map(|e| e.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_timeline_isolation_between_accounts() {
        let mut db = Database::open_in_memory().unwrap();
        let mine = TimelineId::new(viewer(), TimelineKind::Home);
        let theirs = TimelineId::new(MicroBlogKey::twitter("other"), TimelineKind::Home);

        db.append_timeline_page(&mine, &[MicroBlogKey::twitter("a")])
            .unwrap();

        assert!(db.get_timeline_page(&theirs).unwrap().is_empty());
    }

    #[test]
    fn test_retention_cascades_to_children() {
        let mut db = Database::open_in_memory().unwrap();
        let timeline = TimelineId::new(viewer(), TimelineKind::Home);

        let mut status = rich("1");
        status.urls = vec![crate::models::RichUrl {
            url: "https://t.co/x".into(),
            expanded_url: "https://example.com/x".into(),
            display_url: "example.com/x".into(),
            title: None,
            description: None,
            image: None,
        }];
        db.save_batch(&normalize(&[status], &viewer())).unwrap();
        db.append_timeline_page(&timeline, &[MicroBlogKey::twitter("1")])
            .unwrap();

        // Cutoff in the future removes everything cached so far
        let removed = db.clear_old_cache(0).unwrap();
        assert_eq!(removed, 1);
        assert!(!db.contains_status(&MicroBlogKey::twitter("1")).unwrap());
        assert!(db
            .get_url_entities_for(&MicroBlogKey::twitter("1"))
            .unwrap()
            .is_empty());
        assert!(db.get_timeline_page(&timeline).unwrap().is_empty());
    }
}
