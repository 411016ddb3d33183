//! Repository for the cached library mirror.
//!
//! Media, collections and the sync cursor live in one file and are mutated
//! together when a page is applied, so they share a single repository.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{CollectionRow, Cursor, CursorRow, MediaRow};
use exn::ResultExt;
use mediasync_decode::models::{CollectionRecord, MediaRecord, Page};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::instrument;

/// Row counts from applying one [`Page`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub media_upserted: u64,
    pub collections_upserted: u64,
    pub media_deleted: u64,
    pub collections_deleted: u64,
}

/// Repository for media, collections and the sync cursor.
///
/// Every batch mutation runs inside one transaction: readers see either the
/// whole batch or none of it.
///
/// > **Note:** a repository only sees what its own [`Database`] handle sees.
/// > Writes committed by another session are picked up on the next query,
/// > but values read earlier are not refreshed; re-query rather than holding
/// > on to results across sessions.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Upsert
    // =========================================================================

    /// Insert or fully replace media records, keyed by media key.
    ///
    /// Every non-key column is overwritten on conflict. An empty batch is a
    /// no-op that doesn't touch the database.
    pub async fn upsert_media(&self, items: &[MediaRecord]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        let rows = items.iter().map(MediaRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let count = upsert_media_rows(&mut *tx, rows).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(count)
    }

    /// Insert or fully replace collection records, keyed by collection media key.
    pub async fn upsert_collections(&self, items: &[CollectionRecord]) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }
        let rows = items.iter().map(CollectionRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let count = upsert_collection_rows(&mut *tx, rows).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(count)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete media by key. Absent keys are not an error.
    ///
    /// Returns the number of rows removed.
    pub async fn delete_media<S: AsRef<str>>(&self, keys: &[S]) -> Result<u64> {
        if keys.iter().all(|key| key.as_ref().is_empty()) {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let count = delete_media_keys(&mut *tx, keys).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(count)
    }

    /// Delete collections whose media key *or* album id matches one of `keys`.
    ///
    /// Deletion events reference collections by either identifier. Empty keys
    /// are skipped: they would otherwise match every collection without an
    /// album id.
    pub async fn delete_collections<S: AsRef<str>>(&self, keys: &[S]) -> Result<u64> {
        if keys.iter().all(|key| key.as_ref().is_empty()) {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let count = delete_collection_keys(&mut *tx, keys).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(count)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get_media(&self, media_key: impl AsRef<str>) -> Result<Option<MediaRecord>> {
        let row: Option<MediaRow> = sqlx::query_as(include_str!("../queries/get_media.sql"))
            .bind(media_key.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|r| r.try_into()).transpose()
    }

    /// Find the media key of an item with the given dedup key.
    ///
    /// Used to answer "has this content already been uploaded?". When several
    /// items share a dedup key the lowest media key is returned.
    pub async fn find_media_key_by_dedup_key(&self, dedup_key: impl AsRef<str>) -> Result<Option<String>> {
        sqlx::query_scalar(include_str!("../queries/find_media_key_by_dedup_key.sql"))
            .bind(dedup_key.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn get_collection_by_id(
        &self,
        collection_media_key: impl AsRef<str>,
    ) -> Result<Option<CollectionRecord>> {
        let row: Option<CollectionRow> = sqlx::query_as(include_str!("../queries/get_collection_by_id.sql"))
            .bind(collection_media_key.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|r| r.try_into()).transpose()
    }

    /// Get a collection by exact, case-sensitive title.
    ///
    /// Titles are not unique. The collection with the most recent activity
    /// wins, then the lowest collection media key.
    pub async fn get_collection_by_title(&self, title: impl AsRef<str>) -> Result<Option<CollectionRecord>> {
        let row: Option<CollectionRow> = sqlx::query_as(include_str!("../queries/get_collection_by_title.sql"))
            .bind(title.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|r| r.try_into()).transpose()
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List collections, most recently active first.
    ///
    /// Collections without an activity time sort last. `None` lists every
    /// collection; `Some(0)` is a limit like any other and returns nothing.
    pub async fn list_collections(&self, limit: Option<usize>) -> Result<Vec<CollectionRecord>> {
        let limit = match limit {
            Some(limit) => i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?,
            None => -1,
        };
        let rows: Vec<CollectionRow> = sqlx::query_as(include_str!("../queries/list_collections.sql"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    pub async fn count_media(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_media.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("media count"))
    }

    pub async fn count_collections(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_collections.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("collection count"))
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// The stored pagination cursor. Both tokens are empty on a fresh cache.
    pub async fn get_cursor(&self) -> Result<Cursor> {
        Ok(self.cursor_row().await?.into())
    }

    /// Update the provided token(s); `None` leaves the stored value untouched.
    pub async fn set_cursor(&self, state_token: Option<&str>, page_token: Option<&str>) -> Result<()> {
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        store_cursor(&mut *conn, state_token, page_token).await
    }

    /// Whether the first full sync pass has completed.
    pub async fn get_init_complete(&self) -> Result<bool> {
        self.cursor_row().await?.init_complete()
    }

    pub async fn set_init_complete(&self, init_complete: bool) -> Result<()> {
        sqlx::query(include_str!("../queries/set_init_complete.sql"))
            .bind(i64::from(init_complete))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn cursor_row(&self) -> Result<CursorRow> {
        let row: Option<CursorRow> = sqlx::query_as(include_str!("../queries/get_cursor.sql"))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        // The migration seeds the row; a missing row reads as the defaults.
        Ok(row.unwrap_or(CursorRow {
            state_token: String::new(),
            page_token: String::new(),
            init_complete: 0,
        }))
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Apply everything a decoded page carries in one transaction.
    ///
    /// Upserts go first, then deletions, then the cursor. The state token is
    /// only replaced when the page carries one; the page token is always
    /// replaced (an empty token marks the last page). Applying the same page
    /// twice leaves the cache unchanged.
    #[instrument(skip_all, fields(next_page_token = %page.cursor.next_page_token))]
    pub async fn apply_page(&self, page: &Page) -> Result<Applied> {
        let media = page.media.iter().map(MediaRow::try_from).collect::<Result<Vec<_>>>()?;
        let collections = page.collections.iter().map(CollectionRow::try_from).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let applied = Applied {
            media_upserted: upsert_media_rows(&mut *tx, media).await?,
            collections_upserted: upsert_collection_rows(&mut *tx, collections).await?,
            media_deleted: delete_media_keys(&mut *tx, &page.media_deletions).await?,
            collections_deleted: delete_collection_keys(&mut *tx, &page.collection_deletions).await?,
        };
        let state_token = page.cursor.state_token.as_str();
        store_cursor(
            &mut *tx,
            (!state_token.is_empty()).then_some(state_token),
            Some(page.cursor.next_page_token.as_str()),
        )
        .await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(
            media_upserted = applied.media_upserted,
            collections_upserted = applied.collections_upserted,
            media_deleted = applied.media_deleted,
            collections_deleted = applied.collections_deleted,
            "applied page"
        );
        Ok(applied)
    }
}

async fn upsert_media_rows(conn: &mut SqliteConnection, rows: Vec<MediaRow>) -> Result<u64> {
    let mut count = 0;
    for row in rows {
        let result = sqlx::query(include_str!("../queries/upsert_media.sql"))
            .bind(row.media_key)
            .bind(row.dedup_key)
            .bind(row.media_type)
            .bind(row.is_canonical)
            .bind(row.origin)
            .bind(row.file_name)
            .bind(row.caption)
            .bind(row.collection_id)
            .bind(row.size_bytes)
            .bind(row.quota_charged_bytes)
            .bind(row.content_version)
            .bind(row.utc_timestamp)
            .bind(row.server_creation_timestamp)
            .bind(row.timezone_offset)
            .bind(row.trash_timestamp)
            .bind(row.upload_status)
            .bind(row.is_archived)
            .bind(row.is_favorite)
            .bind(row.is_locked)
            .bind(row.is_original_quality)
            .bind(row.latitude)
            .bind(row.longitude)
            .bind(row.location_name)
            .bind(row.location_id)
            .bind(row.payload)
            .bind(row.remote_url)
            .bind(row.width)
            .bind(row.height)
            .bind(row.is_edited)
            .bind(row.make)
            .bind(row.model)
            .bind(row.aperture)
            .bind(row.shutter_speed)
            .bind(row.iso)
            .bind(row.focal_length)
            .bind(row.duration)
            .bind(row.capture_frame_rate)
            .bind(row.encoded_frame_rate)
            .bind(row.is_micro_video)
            .bind(row.micro_video_width)
            .bind(row.micro_video_height)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        count += result.rows_affected();
    }
    Ok(count)
}

async fn upsert_collection_rows(conn: &mut SqliteConnection, rows: Vec<CollectionRow>) -> Result<u64> {
    let mut count = 0;
    for row in rows {
        let result = sqlx::query(include_str!("../queries/upsert_collection.sql"))
            .bind(row.collection_media_key)
            .bind(row.collection_album_id)
            .bind(row.title)
            .bind(row.total_items)
            .bind(row.collection_type)
            .bind(row.sort_order)
            .bind(row.is_custom_ordered)
            .bind(row.cover_item_media_key)
            .bind(row.start)
            .bind(row.end)
            .bind(row.last_activity_time_ms)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        count += result.rows_affected();
    }
    Ok(count)
}

async fn delete_media_keys<S: AsRef<str>>(conn: &mut SqliteConnection, keys: &[S]) -> Result<u64> {
    let mut count = 0;
    for key in keys.iter().map(AsRef::as_ref).filter(|key| !key.is_empty()) {
        let result = sqlx::query(include_str!("../queries/delete_media.sql"))
            .bind(key)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        count += result.rows_affected();
    }
    Ok(count)
}

async fn delete_collection_keys<S: AsRef<str>>(conn: &mut SqliteConnection, keys: &[S]) -> Result<u64> {
    let mut count = 0;
    for key in keys.iter().map(AsRef::as_ref).filter(|key| !key.is_empty()) {
        let result = sqlx::query(include_str!("../queries/delete_collection.sql"))
            .bind(key)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        count += result.rows_affected();
    }
    Ok(count)
}

async fn store_cursor(conn: &mut SqliteConnection, state_token: Option<&str>, page_token: Option<&str>) -> Result<()> {
    if state_token.is_none() && page_token.is_none() {
        return Ok(());
    }
    sqlx::query(include_str!("../queries/set_cursor.sql"))
        .bind(state_token)
        .bind(page_token)
        .execute(&mut *conn)
        .await
        .or_raise(|| ErrorKind::Database)?;
    Ok(())
}
