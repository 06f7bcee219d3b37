//! Seller settings saved as `settings.json` in the platform config directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Error as SerdeError;
use tracing::{debug, warn};

use crate::domain::app_state::PersistedState;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "LotValueScanner";
const APP_NAME: &str = "LotValueScanner";
const SETTINGS_FILENAME: &str = "settings.json";

pub fn settings_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILENAME))
}

pub fn load_persisted_state() -> Option<PersistedState> {
    load_persisted_state_from(&settings_file()?)
}

/// Missing or unreadable files yield `None`; loaded settings are re-validated.
pub fn load_persisted_state_from(path: &Path) -> Option<PersistedState> {
    let data = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PersistedState>(&data) {
        Ok(mut state) => {
            state.settings = state.settings.sanitized();
            debug!(path = %path.display(), "loaded settings");
            Some(state)
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable settings file");
            None
        }
    }
}

pub fn save_persisted_state(state: &PersistedState) -> Result<(), PersistSaveError> {
    let path = settings_file().ok_or(PersistSaveError::StorageUnavailable)?;
    save_persisted_state_to(&path, state)
}

pub fn save_persisted_state_to(
    path: &Path,
    state: &PersistedState,
) -> Result<(), PersistSaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), "saved settings");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
