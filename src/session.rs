//! Keeps the session state between two runs of the binary.

use amap_core::entities::SessionState;
use anyhow::Result;
use std::{fs, io::ErrorKind, path::Path};

/// Reads the last session state.
///
/// A missing or unreadable file is a fresh session.
pub fn load_state(path: &Path) -> SessionState {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                log::warn!("Unable to read session state {}: {err}", path.display());
            }
            return SessionState::default();
        }
    };
    serde_json::from_str(&json).unwrap_or_else(|err| {
        log::warn!("Ignoring invalid session state {}: {err}", path.display());
        SessionState::default()
    })
}

pub fn save_state(path: &Path, state: &SessionState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json)?;
    log::debug!("Saved session state to {}", path.display());
    Ok(())
}
