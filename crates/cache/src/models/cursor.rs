use super::is_set;
use crate::error::Error;

/// The persisted two-token pagination cursor.
///
/// Both tokens are empty until the first page has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub state_token: String,
    pub page_token: String,
}

#[derive(sqlx::FromRow)]
pub(crate) struct CursorRow {
    pub(crate) state_token: String,
    pub(crate) page_token: String,
    pub(crate) init_complete: i64,
}
impl CursorRow {
    pub(crate) fn init_complete(&self) -> Result<bool, Error> {
        is_set(self.init_complete, "init complete")
    }
}
impl From<CursorRow> for Cursor {
    fn from(row: CursorRow) -> Self {
        Self {
            state_token: row.state_token,
            page_token: row.page_token,
        }
    }
}
