/// Title given to collections that arrive without one.
pub const UNTITLED: &str = "Untitled";

/// One album/collection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionRecord {
    pub collection_media_key: String,
    /// Secondary identifier referenced by some deletion events. May be empty.
    pub collection_album_id: String,
    pub title: String,
    pub total_items: u64,
    pub collection_type: i64,
    pub sort_order: i64,
    pub is_custom_ordered: bool,
    pub cover_item_media_key: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub last_activity_time_ms: Option<i64>,
}
impl CollectionRecord {
    /// Creates a collection with the remote defaults for every optional field.
    pub fn new(collection_media_key: impl Into<String>) -> Self {
        Self {
            collection_media_key: collection_media_key.into(),
            collection_album_id: String::new(),
            title: UNTITLED.to_string(),
            total_items: 0,
            collection_type: 0,
            sort_order: 0,
            is_custom_ordered: false,
            cover_item_media_key: None,
            start: None,
            end: None,
            last_activity_time_ms: None,
        }
    }
}
