//! SQLite cache of the remote media library.
//!
//! The cache is a local mirror: media items, collections and the sync cursor
//! that says where the next fetch resumes. The remote library is the source
//! of truth; deleting the cache file only means the next sync starts over.
//!
//! # Architecture
//! - [`Database`] opens one cache file (a "session") and runs the embedded
//!   migrations.
//! - [`Repository`] upserts, deletes and queries records. A whole decoded
//!   page is applied atomically with [`Repository::apply_page`].

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::{ConnectOptions, Database};
pub use crate::models::Cursor;
pub use crate::repo::{Applied, Repository};
