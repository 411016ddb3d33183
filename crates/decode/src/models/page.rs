use crate::error::Error;
use crate::models::{CollectionRecord, MediaRecord};

/// The two-token resumable pagination cursor carried by every page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor {
    /// Identifies the library state the page was computed against.
    pub state_token: String,
    /// Token to request the next page with. Empty on the final page.
    pub next_page_token: String,
}

/// An entry that could not be decoded and was left out of its [`Page`].
#[derive(Debug)]
pub enum Rejected {
    Media { key: Option<String>, error: Error },
    Collection { key: Option<String>, error: Error },
    Deletion { error: Error },
    /// A deletion entry with a type code this decoder does not handle.
    UnknownDeletion { code: i64 },
}
impl Rejected {
    /// The key of the rejected entity, when it could be read.
    pub fn key(&self) -> Option<&str> {
        match self {
            Rejected::Media { key, .. } | Rejected::Collection { key, .. } => key.as_deref(),
            Rejected::Deletion { .. } | Rejected::UnknownDeletion { .. } => None,
        }
    }
}

/// Everything decoded from one page envelope.
///
/// Entries that failed to decode are reported in [`rejected`](Self::rejected);
/// the rest of the page is still usable.
#[derive(Debug, Default)]
pub struct Page {
    pub cursor: PageCursor,
    pub media: Vec<MediaRecord>,
    pub collections: Vec<CollectionRecord>,
    pub media_deletions: Vec<String>,
    pub collection_deletions: Vec<String>,
    pub rejected: Vec<Rejected>,
}
impl Page {
    /// Returns `true` if there are no further pages to fetch.
    pub fn is_last(&self) -> bool {
        self.cursor.next_page_token.is_empty()
    }

    /// Returns `true` if the page carries no mutations at all.
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
            && self.collections.is_empty()
            && self.media_deletions.is_empty()
            && self.collection_deletions.is_empty()
    }
}
