//! JSON-file-backed key-value store
//!
//! Values live in memory for the whole session and reach disk only on
//! `flush`, which the driver calls once at shutdown. A crash before that
//! loses everything placed or moved since the previous run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rally_core::{KeyValueStore, MemoryStore, StoredValue};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Save format version (for future migration)
pub const SAVE_VERSION: u32 = 1;

/// On-disk layout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    /// Human-readable timestamp of the last flush
    timestamp: String,
    values: BTreeMap<String, StoredValue>,
}

pub struct JsonFileStore {
    path: PathBuf,
    values: MemoryStore,
    dirty: bool,
}

/// Default save file, `<data dir>/rally/save.json`
pub fn default_save_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rally")
        .join("save.json")
}

impl JsonFileStore {
    /// Open the save at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let data = read_save(&path)?;
            if data.version != SAVE_VERSION {
                anyhow::bail!(
                    "Save file {:?} has format version {}, expected {}",
                    path,
                    data.version,
                    SAVE_VERSION
                );
            }
            info!("Loaded {} saved values from {:?} ({})", data.values.len(), path, data.timestamp);
            MemoryStore::from_values(data.values)
        } else {
            info!("No save file at {:?}, starting fresh", path);
            MemoryStore::new()
        };

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Write every value to disk, replacing the previous file
    pub fn flush(&mut self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).context("Failed to create save directory")?;
            }
        }

        let data = SaveFile {
            version: SAVE_VERSION,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            values: self.values.values().clone(),
        };
        let json = serde_json::to_string_pretty(&data).context("Failed to serialize save data")?;
        fs::write(&self.path, json).context("Failed to write save file")?;
        self.dirty = false;
        info!("Saved {} values to {:?}", self.values.len(), self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when values changed since the last load or flush
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: StoredValue) {
        self.values.set(key, value);
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.dirty = true;
    }
}

fn read_save(path: &Path) -> Result<SaveFile> {
    let json = fs::read_to_string(path).context("Failed to read save file")?;
    let data: SaveFile = serde_json::from_str(&json).context("Failed to deserialize save data")?;
    Ok(data)
}
