//! Collection (album) decoding.

use serde_json::Value;
use tracing::instrument;

use crate::error::Result;
use crate::models::{CollectionRecord, UNTITLED};
use crate::tags::{opt_int, opt_text, req_text};

/// Decodes a single collection.
///
/// Only the collection key is required; every other field falls back to the
/// remote default when absent.
#[instrument(level = "trace", skip(record))]
pub fn decode_collection(record: &Value) -> Result<CollectionRecord> {
    Ok(CollectionRecord {
        collection_media_key: req_text(record, &["1"], "collection_media_key")?,
        collection_album_id: opt_text(record, &["4", "2", "3"], "collection_album_id")?.unwrap_or_default(),
        title: opt_text(record, &["2", "5"], "title")?.unwrap_or_else(|| UNTITLED.to_string()),
        total_items: opt_int(record, &["2", "7"], "total_items")?.unwrap_or(0),
        collection_type: opt_int(record, &["2", "8"], "type")?.unwrap_or(0),
        sort_order: opt_int(record, &["19", "1"], "sort_order")?.unwrap_or(0),
        is_custom_ordered: opt_int::<i64>(record, &["19", "2"], "is_custom_ordered")? == Some(1),
        cover_item_media_key: opt_text(record, &["2", "17", "1"], "cover_item_media_key")?,
        start: opt_int(record, &["2", "10", "6", "1"], "start")?,
        end: opt_int(record, &["2", "10", "7", "1"], "end")?,
        last_activity_time_ms: opt_int(record, &["2", "10", "10"], "last_activity_time_ms")?,
    })
}
