use super::prelude::*;

/// Removes every cached position and returns the number of removed entries.
pub fn clear_geocache<R: GeoCacheRepo>(repo: &R) -> Result<usize> {
    let count = repo.count_entries();
    repo.clear()?;
    log::info!("Removed {count} entries from the geocode cache");
    Ok(count)
}
