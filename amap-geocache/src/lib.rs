//! A geocode cache that is persisted as a single JSON file.
//!
//! The file maps canonical addresses to `[lat, lng]` pairs.
//! It is read once on first access and rewritten completely
//! after every change (write-through).

use amap_core::{
    entities::*,
    repositories::{Error as RepoError, GeoCacheRepo},
};
use anyhow::anyhow;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

pub const DEFAULT_FILE_NAME: &str = ".geocache.json";

/// Appended to the name of a cache file that could not be loaded.
pub const CORRUPT_FILE_SUFFIX: &str = ".corrupt";

type Entries = HashMap<CanonicalKey, MapPoint>;

#[derive(Debug)]
pub struct GeoCacheStore {
    path: PathBuf,
    // Loaded lazily on first access.
    entries: Mutex<Option<Entries>>,
}

impl GeoCacheStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a snapshot of all cached entries.
    pub fn load(&self) -> Entries {
        self.with_entries(|entries| entries.clone())
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut Entries) -> T) -> T {
        let mut locked = self.entries.lock();
        let entries = locked.get_or_insert_with(|| read_entries(&self.path));
        f(entries)
    }
}

impl GeoCacheRepo for GeoCacheStore {
    fn get_pos(&self, key: &CanonicalKey) -> Option<MapPoint> {
        self.with_entries(|entries| entries.get(key).copied())
    }

    fn put_pos(&self, key: CanonicalKey, pos: MapPoint) -> Result<(), RepoError> {
        if !pos.is_valid() {
            return Err(anyhow!("Invalid position of '{key}': {pos}").into());
        }
        // The lock is held while writing to serialize concurrent updates.
        self.with_entries(|entries| {
            entries.insert(key, pos);
            write_entries(&self.path, entries)
        })
        .map_err(|err| {
            log::warn!(
                "Unable to write geocode cache {}: {err}",
                self.path.display()
            );
            err.into()
        })
    }

    fn count_entries(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    fn clear(&self) -> Result<(), RepoError> {
        self.with_entries(|entries| {
            entries.clear();
            write_entries(&self.path, entries)
        })?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Entries {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            if err.kind() == ErrorKind::NotFound {
                log::info!("No geocode cache found at {}", path.display());
            } else {
                log::warn!("Unable to read geocode cache {}: {err}", path.display());
                if path.is_file() {
                    move_aside(path);
                }
            }
            return Entries::new();
        }
    };
    let map = match serde_json::from_str::<Map<String, Value>>(&json) {
        Ok(map) => map,
        Err(err) => {
            log::warn!(
                "Ignoring corrupt geocode cache {}: {err}",
                path.display()
            );
            move_aside(path);
            return Entries::new();
        }
    };
    let entries: Entries = map
        .into_iter()
        .filter_map(|(key, value)| {
            let pos = parse_pos(&value);
            if pos.is_none() {
                log::warn!("Ignoring invalid geocode cache entry '{key}': {value}");
            }
            pos.map(|pos| (CanonicalKey::from(key), pos))
        })
        .collect();
    log::debug!(
        "Loaded {} entries from geocode cache {}",
        entries.len(),
        path.display()
    );
    entries
}

// Keeps an unloadable file for manual recovery,
// otherwise the next write would replace it.
fn move_aside(path: &Path) {
    let backup = corrupt_file_path(path);
    match fs::rename(path, &backup) {
        Ok(()) => log::warn!(
            "Moved unloadable geocode cache {} to {}",
            path.display(),
            backup.display()
        ),
        Err(err) => log::warn!(
            "Unable to move unloadable geocode cache {} aside: {err}",
            path.display()
        ),
    }
}

fn corrupt_file_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(CORRUPT_FILE_SUFFIX);
    PathBuf::from(name)
}

fn parse_pos(value: &Value) -> Option<MapPoint> {
    match value.as_array()?.as_slice() {
        [lat, lng] => MapPoint::try_from_lat_lng_deg(lat.as_f64()?, lng.as_f64()?),
        _ => None,
    }
}

// Replaces the file atomically, so a crash never
// leaves a partially written cache behind.
fn write_entries(path: &Path, entries: &Entries) -> io::Result<()> {
    let sorted: BTreeMap<&str, [f64; 2]> = entries
        .iter()
        .map(|(key, pos)| (key.as_str(), pos.to_lat_lng_array()))
        .collect();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, &sorted)?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}
