//! Deletion notice decoding.

use serde_json::Value;
use tracing::instrument;

use crate::error::Result;
use crate::models::{CollectionDeletion, Deletion};
use crate::tags::{req_int, req_text, required};

/// Decodes a single deletion entry.
///
/// Each deletion type nests the deleted key under a different path. Types this
/// decoder does not know about decode successfully as [`Deletion::Unknown`]
/// so the caller can skip them.
#[instrument(level = "trace", skip(entry))]
pub fn decode_deletion(entry: &Value) -> Result<Deletion> {
    let notice = required(entry, &["1"], "deletion")?;
    let code = req_int::<i64>(notice, &["1"], "deletion_type")?;
    Ok(match code {
        1 => Deletion::Media(req_text(notice, &["2", "1"], "media_key")?),
        2 => Deletion::Collection(CollectionDeletion::Album, req_text(notice, &["3", "1"], "collection_key")?),
        4 => Deletion::Collection(CollectionDeletion::Shared, req_text(notice, &["5", "2"], "collection_key")?),
        6 => Deletion::Collection(CollectionDeletion::Envelope, req_text(notice, &["7", "1"], "collection_key")?),
        _ => Deletion::Unknown(code),
    })
}
