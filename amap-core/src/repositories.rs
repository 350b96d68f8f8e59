// Storage access traits.
//
// The geocode cache is the single source of truth for all
// addresses that have ever been resolved. Entries are only
// added or updated, the only way to remove them is to
// clear the whole cache.

use crate::entities::*;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

type Result<T> = std::result::Result<T, Error>;

pub trait GeoCacheRepo {
    fn get_pos(&self, key: &CanonicalKey) -> Option<MapPoint>;

    /// Inserts or updates an entry and persists the whole cache.
    ///
    /// The entry is always kept in memory, an error
    /// only reports that it could not be persisted.
    fn put_pos(&self, key: CanonicalKey, pos: MapPoint) -> Result<()>;

    fn count_entries(&self) -> usize;

    /// Removes all entries, both in memory and persisted.
    fn clear(&self) -> Result<()>;
}
