/// The three ways a collection deletion can be reported.
///
/// They come from different deletion flows on the remote side but all mean
/// the same thing locally: the collection is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionDeletion {
    /// Type `2`.
    Album,
    /// Type `4`.
    Shared,
    /// Type `6`.
    Envelope,
}
impl CollectionDeletion {
    pub fn code(&self) -> i64 {
        match self {
            CollectionDeletion::Album => 2,
            CollectionDeletion::Shared => 4,
            CollectionDeletion::Envelope => 6,
        }
    }
}

/// A deletion notice decoded from one page entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    Media(String),
    Collection(CollectionDeletion, String),
    /// A deletion type this decoder does not know about.
    Unknown(i64),
}
impl Deletion {
    /// The remote type code, or `0` for unknown types.
    pub fn code(&self) -> i64 {
        match self {
            Deletion::Media(_) => 1,
            Deletion::Collection(kind, _) => kind.code(),
            Deletion::Unknown(_) => 0,
        }
    }

    /// The key of the deleted entity, if the notice carries one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Deletion::Media(key) | Deletion::Collection(_, key) => Some(key),
            Deletion::Unknown(_) => None,
        }
    }
}
