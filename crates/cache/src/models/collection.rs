use exn::ResultExt;
use mediasync_decode::models::CollectionRecord;

use super::{flag, is_set};
use crate::error::{Error, ErrorKind};

#[derive(sqlx::FromRow)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct CollectionRow {
    pub(crate) collection_media_key: String,
    pub(crate) collection_album_id: String,
    pub(crate) title: String,
    pub(crate) total_items: i64,
    #[sqlx(rename = "type")]
    pub(crate) collection_type: i64,
    pub(crate) sort_order: i64,
    pub(crate) is_custom_ordered: i64,
    pub(crate) cover_item_media_key: Option<String>,
    pub(crate) start: Option<i64>,
    pub(crate) end: Option<i64>,
    pub(crate) last_activity_time_ms: Option<i64>,
}
impl TryFrom<&CollectionRecord> for CollectionRow {
    type Error = Error;
    fn try_from(item: &CollectionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            collection_media_key: item.collection_media_key.clone(),
            collection_album_id: item.collection_album_id.clone(),
            title: item.title.clone(),
            total_items: i64::try_from(item.total_items).or_raise(|| ErrorKind::InvalidData("total items"))?,
            collection_type: item.collection_type,
            sort_order: item.sort_order,
            is_custom_ordered: flag(item.is_custom_ordered),
            cover_item_media_key: item.cover_item_media_key.clone(),
            start: item.start,
            end: item.end,
            last_activity_time_ms: item.last_activity_time_ms,
        })
    }
}
impl TryFrom<CollectionRow> for CollectionRecord {
    type Error = Error;
    fn try_from(row: CollectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            collection_media_key: row.collection_media_key,
            collection_album_id: row.collection_album_id,
            title: row.title,
            total_items: u64::try_from(row.total_items).or_raise(|| ErrorKind::InvalidData("total items"))?,
            collection_type: row.collection_type,
            sort_order: row.sort_order,
            is_custom_ordered: is_set(row.is_custom_ordered, "is custom ordered")?,
            cover_item_media_key: row.cover_item_media_key,
            start: row.start,
            end: row.end,
            last_activity_time_ms: row.last_activity_time_ms,
        })
    }
}
