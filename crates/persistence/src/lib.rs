#![deny(warnings)]

//! Persistence layer: save files and compact snapshot blobs.
//!
//! A save holds exactly the world and the player. Seed and tick round-trip
//! unchanged, so a resumed game draws the same random streams it would have
//! drawn without the reload.

use serde::{Deserialize, Serialize};
use sim_core::{validate_snapshot, Snapshot, ValidationError};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Save format version written by this build.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
    #[error("saved state is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

/// On-disk envelope around a snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    snapshot: Snapshot,
}

/// Returns the default path used for local saves.
pub fn default_save_path() -> &'static str {
    "./saves/game.json"
}

fn unwrap_save(save: SaveFile) -> Result<Snapshot, PersistenceError> {
    if save.version != SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion(save.version));
    }
    validate_snapshot(&save.snapshot)?;
    Ok(save.snapshot)
}

/// Serialize a snapshot as pretty JSON.
pub fn to_json(snapshot: &Snapshot) -> Result<String, PersistenceError> {
    let save = SaveFile {
        version: SAVE_VERSION,
        snapshot: snapshot.clone(),
    };
    Ok(serde_json::to_string_pretty(&save)?)
}

/// Parse and validate a JSON save.
pub fn from_json(text: &str) -> Result<Snapshot, PersistenceError> {
    unwrap_save(serde_json::from_str(text)?)
}

/// Write a JSON save to `path`, creating parent directories as needed.
pub fn save_json(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_json(snapshot)?)?;
    info!(path = %path.display(), tick = snapshot.world.tick, "game saved");
    Ok(())
}

/// Read a JSON save from `path`.
pub fn load_json(path: impl AsRef<Path>) -> Result<Snapshot, PersistenceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let snapshot = from_json(&text)?;
    info!(path = %path.display(), tick = snapshot.world.tick, "game loaded");
    Ok(snapshot)
}

/// Encode a snapshot as a compact binary blob.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, PersistenceError> {
    let save = SaveFile {
        version: SAVE_VERSION,
        snapshot: snapshot.clone(),
    };
    let bytes = bincode::serialize(&save)?;
    debug!(len = bytes.len(), "snapshot encoded");
    Ok(bytes)
}

/// Decode and validate a blob produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Snapshot, PersistenceError> {
    unwrap_save(bincode::deserialize(bytes)?)
}
