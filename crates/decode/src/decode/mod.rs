//! Page envelope decoding.
//!
//! A page envelope has a single root record under tag `1`:
//!
//! | Tag | Content                               |
//! |-----|---------------------------------------|
//! | `1` | next page token (absent on last page) |
//! | `2` | media items                           |
//! | `3` | collections                           |
//! | `6` | state token                           |
//! | `9` | deletion notices                      |
//!
//! Each repeated field may be a list, a bare record (list of one), or absent.

mod collection;
mod deletion;
mod media;

use exn::OptionExt;
use serde_json::Value;
use tracing::instrument;

pub use self::collection::decode_collection;
pub use self::deletion::decode_deletion;
pub use self::media::decode_media;
use crate::error::{ErrorKind, Result};
use crate::models::{Deletion, Page, PageCursor, Rejected};
use crate::tags::{at, opt_text, repeated};

/// Decodes one page envelope into typed upserts, deletions and cursor tokens.
///
/// Entries are decoded independently: an entry that fails to decode is logged,
/// recorded in [`Page::rejected`], and left out, while the rest of the page is
/// returned as normal.
///
/// # Errors
///
/// Only an envelope without a root record, or with malformed cursor tokens,
/// fails as a whole.
#[instrument(skip(envelope), fields(media, collections, deletions, rejected))]
pub fn decode_page(envelope: &Value) -> Result<Page> {
    let root = at(envelope, &["1"]).filter(|root| root.is_object()).ok_or_raise(|| ErrorKind::InvalidEnvelope)?;
    let mut page = Page {
        cursor: PageCursor {
            state_token: opt_text(root, &["6"], "state_token")?.unwrap_or_default(),
            next_page_token: opt_text(root, &["1"], "next_page_token")?.unwrap_or_default(),
        },
        ..Page::default()
    };

    for record in repeated(at(root, &["2"])) {
        match decode_media(record) {
            Ok(item) => page.media.push(item),
            Err(error) => {
                let key = at(record, &["1"]).and_then(Value::as_str).map(str::to_string);
                tracing::warn!(media_key = key.as_deref(), error = ?error, "skipping media item that failed to decode");
                page.rejected.push(Rejected::Media { key, error });
            },
        }
    }

    for record in repeated(at(root, &["3"])) {
        match decode_collection(record) {
            Ok(collection) => page.collections.push(collection),
            Err(error) => {
                let key = at(record, &["1"]).and_then(Value::as_str).map(str::to_string);
                tracing::warn!(collection_key = key.as_deref(), error = ?error, "skipping collection that failed to decode");
                page.rejected.push(Rejected::Collection { key, error });
            },
        }
    }

    for entry in repeated(at(root, &["9"])) {
        match decode_deletion(entry) {
            Ok(Deletion::Media(key)) => page.media_deletions.push(key),
            Ok(Deletion::Collection(_, key)) => page.collection_deletions.push(key),
            Ok(Deletion::Unknown(code)) => {
                tracing::debug!(code, "skipping deletion of unknown type");
                page.rejected.push(Rejected::UnknownDeletion { code });
            },
            Err(error) => {
                tracing::warn!(error = ?error, "skipping deletion that failed to decode");
                page.rejected.push(Rejected::Deletion { error });
            },
        }
    }

    let span = tracing::Span::current();
    span.record("media", page.media.len());
    span.record("collections", page.collections.len());
    span.record("deletions", page.media_deletions.len() + page.collection_deletions.len());
    span.record("rejected", page.rejected.len());
    Ok(page)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(media: Value, collections: Value, deletions: Value) -> Value {
        json!({"1": {"1": "next-page", "6": "state-1", "2": media, "3": collections, "9": deletions}})
    }

    #[test]
    fn test_full_page() {
        let page = decode_page(&envelope(
            json!([fixtures::photo("AF1QipA"), fixtures::video("AF1QipB")]),
            json!([fixtures::collection("AF1QipAlbum", "Holiday")]),
            json!([
                {"1": {"1": 1, "2": {"1": "AF1QipGone"}}},
                {"1": {"1": 6, "7": {"1": "AF1QipAlbumGone"}}},
            ]),
        ))
        .unwrap();
        assert_eq!(page.cursor.state_token, "state-1");
        assert_eq!(page.cursor.next_page_token, "next-page");
        assert!(!page.is_last());
        assert_eq!(page.media.len(), 2);
        assert_eq!(page.collections.len(), 1);
        assert_eq!(page.media_deletions, vec!["AF1QipGone".to_string()]);
        assert_eq!(page.collection_deletions, vec!["AF1QipAlbumGone".to_string()]);
        assert!(page.rejected.is_empty());
    }

    #[test]
    fn test_bare_records_decode_like_lists() {
        let bare = decode_page(&envelope(
            fixtures::photo("AF1QipA"),
            fixtures::collection("AF1QipAlbum", "Holiday"),
            json!({"1": {"1": 1, "2": {"1": "AF1QipGone"}}}),
        ))
        .unwrap();
        let listed = decode_page(&envelope(
            json!([fixtures::photo("AF1QipA")]),
            json!([fixtures::collection("AF1QipAlbum", "Holiday")]),
            json!([{"1": {"1": 1, "2": {"1": "AF1QipGone"}}}]),
        ))
        .unwrap();
        assert_eq!(bare.media, listed.media);
        assert_eq!(bare.collections, listed.collections);
        assert_eq!(bare.media_deletions, listed.media_deletions);
        assert_eq!(bare.cursor, listed.cursor);
    }

    #[test]
    fn test_bad_entries_do_not_stall_the_page() {
        let mut broken = fixtures::photo("AF1QipBroken");
        broken["2"]["30"]["1"] = json!(9);
        let page = decode_page(&envelope(
            json!([fixtures::photo("AF1QipA"), broken, {"2": {}}]),
            json!([{"2": {"5": "Keyless"}}, fixtures::collection("AF1QipAlbum", "Holiday")]),
            json!([{"1": {"1": 99}}, {"1": {"1": 4}}, {"1": {"1": 1, "2": {"1": "AF1QipGone"}}}]),
        ))
        .unwrap();
        assert_eq!(page.media.len(), 1);
        assert_eq!(page.collections.len(), 1);
        assert_eq!(page.media_deletions.len(), 1);
        assert_eq!(page.cursor.state_token, "state-1");
        assert_eq!(page.rejected.len(), 5);
        assert!(page.rejected.iter().any(|rejected| rejected.key() == Some("AF1QipBroken")));
        assert!(page.rejected.iter().any(|rejected| matches!(rejected, Rejected::UnknownDeletion { code: 99 })));
        assert!(page.rejected.iter().any(|rejected| matches!(
            rejected,
            Rejected::Media { key: Some(key), error }
                if key == "AF1QipBroken" && **error == ErrorKind::UnknownOrigin(9)
        )));
    }

    #[test]
    fn test_last_page_has_no_token() {
        let page = decode_page(&json!({"1": {"6": "state-2"}})).unwrap();
        assert!(page.is_last());
        assert!(page.is_empty());
        assert_eq!(page.cursor.state_token, "state-2");
    }

    #[test]
    fn test_missing_root_fails_the_page() {
        assert_eq!(*decode_page(&json!({})).unwrap_err(), ErrorKind::InvalidEnvelope);
        assert_eq!(*decode_page(&json!({"1": "oops"})).unwrap_err(), ErrorKind::InvalidEnvelope);
    }
}
