mod collection;
mod cursor;
mod media;

pub use self::cursor::Cursor;
pub(crate) use self::collection::CollectionRow;
pub(crate) use self::cursor::CursorRow;
pub(crate) use self::media::MediaRow;

use crate::error::{Error, ErrorKind};
use exn::ResultExt;

pub(crate) fn flag(value: bool) -> i64 {
    i64::from(value)
}

/// Booleans are stored as 0/1; anything else means the row was not written by us.
pub(crate) fn is_set(value: i64, field: &'static str) -> Result<bool, Error> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => exn::bail!(ErrorKind::InvalidData(field)),
    }
}

pub(crate) fn signed(value: u64, field: &'static str) -> Result<i64, Error> {
    i64::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn unsigned<T: TryFrom<i64>>(value: i64, field: &'static str) -> Result<T, Error>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}
