//! Decoder for media library update pages.
//!
//! The remote library reports changes as pages of untyped, tag-indexed
//! records: no schema, fields addressed by small integer tags nested
//! arbitrarily deep, and any repeated field collapsed to a bare record when it
//! holds exactly one element. This crate turns one such page into typed
//! [`MediaRecord`](models::MediaRecord)s, [`CollectionRecord`](models::CollectionRecord)s,
//! deletion keys and the pagination cursor.
//!
//! Decoding is pure and stateless, so pages can be decoded on any number of
//! threads, as long as they are applied to the cache in page order.

mod decode;
mod dedup;
pub mod error;
pub mod models;
pub mod scaled;
mod tags;

pub use crate::decode::{decode_collection, decode_deletion, decode_media, decode_page};
pub use crate::dedup::{dedup_key_from_sha1, urlsafe_base64};
