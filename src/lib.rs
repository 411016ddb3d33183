//! Local mirror of a remote media library.
//!
//! This crate ties the decoder ([`decode`]) to the SQLite cache ([`cache`]):
//! open a cache session, hand it one page envelope at a time with [`ingest`],
//! and persist the returned cursor until no pages remain. Fetching pages,
//! retries and backoff are left to the caller.
//!
//! ```no_run
//! # async fn example(pages: Vec<serde_json::Value>) -> mediasync::Result<()> {
//! mediasync::session("cache.sqlite3", async |repo| {
//!     for envelope in &pages {
//!         if !mediasync::ingest(repo, envelope).await?.has_more() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! })
//! .await
//! # }
//! ```

pub mod error;

pub use crate::error::{Error, ErrorKind, Result};
pub use mediasync_cache::{self as cache, Applied, ConnectOptions, Cursor, Database, Repository};
pub use mediasync_config::{self as config, CacheConfig, Config};
pub use mediasync_decode::models::{Page, PageCursor, Rejected};
pub use mediasync_decode::{self as decode, decode_page};

use exn::ResultExt;
use serde_json::Value;
use std::path::Path;
use tracing::instrument;

/// Outcome of ingesting one page envelope.
#[derive(Debug)]
pub struct Ingested {
    pub applied: Applied,
    /// Entries left out of the page because they could not be decoded.
    pub rejected: Vec<Rejected>,
    /// The cursor as stored in the cache after the page was applied.
    ///
    /// A page without a state token keeps the previously stored one.
    pub cursor: Cursor,
}
impl Ingested {
    /// Returns `true` if the remote has further pages to fetch.
    pub fn has_more(&self) -> bool {
        !self.cursor.page_token.is_empty()
    }
}

/// Open the cache file described by `config`, creating its directory if needed.
pub async fn open(config: &Config) -> Result<Database> {
    let path = config.cache.resolve_path().or_raise(|| ErrorKind::Config)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Cache)?;
    }
    let options = ConnectOptions {
        max_connections: config.cache.max_connections,
        busy_timeout: config.cache.busy_timeout(),
    };
    Database::connect_with(&path, options).await.or_raise(|| ErrorKind::Cache)
}

/// Run one unit of work against the cache file at `path`.
///
/// The handle is opened for `work` and closed afterwards, whether `work`
/// succeeded or not. Don't carry query results from one session into
/// another: writes committed by other sessions in between are not reflected.
pub async fn session<T>(path: impl AsRef<Path>, work: impl AsyncFnOnce(&Repository) -> Result<T>) -> Result<T> {
    let db = Database::connect(path).await.or_raise(|| ErrorKind::Cache)?;
    scoped(db, work).await
}

/// [`session`], with the cache location and pool tuning taken from `config`.
pub async fn session_with<T>(config: &Config, work: impl AsyncFnOnce(&Repository) -> Result<T>) -> Result<T> {
    let db = open(config).await?;
    scoped(db, work).await
}

async fn scoped<T>(db: Database, work: impl AsyncFnOnce(&Repository) -> Result<T>) -> Result<T> {
    let repo = Repository::from(&db);
    let result = work(&repo).await;
    db.close().await;
    result
}

/// Decode one page envelope and apply it to the cache in a single transaction.
///
/// Malformed entries don't fail the page; they are returned in
/// [`Ingested::rejected`]. Only an unusable envelope or a cache failure is an
/// error, in which case nothing from the page has been applied.
#[instrument(skip_all)]
pub async fn ingest(repo: &Repository, envelope: &Value) -> Result<Ingested> {
    let page = decode_page(envelope).or_raise(|| ErrorKind::Decode)?;
    let applied = repo.apply_page(&page).await.or_raise(|| ErrorKind::Cache)?;
    if !page.rejected.is_empty() {
        tracing::warn!(rejected = page.rejected.len(), "page applied with rejected entries");
    }
    let cursor = repo.get_cursor().await.or_raise(|| ErrorKind::Cache)?;
    Ok(Ingested {
        applied,
        rejected: page.rejected,
        cursor,
    })
}
