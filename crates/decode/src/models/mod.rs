mod collection;
mod deletion;
mod media;
mod page;

pub use self::collection::{CollectionRecord, UNTITLED};
pub use self::deletion::{CollectionDeletion, Deletion};
pub use self::media::{Camera, Location, MediaPayload, MediaRecord, MicroVideo, Origin, Photo, Video};
pub use self::page::{Page, PageCursor, Rejected};
