//! Placement list persistence
//!
//! The ordered obstacle list is saved in one of two schemas:
//! - schema 1 (keyed): a count key plus one group of keys per record index
//! - schema 2 (blob): a single JSON string carrying an explicit count
//!
//! Loading honors whichever schema the store declares. A category name that
//! does not parse aborts the load; a corrupt save is never reinterpreted as a
//! different category.

use glam::Vec2;
use rally_core::{KeyValueStore, StoredValue, ValueTypeError};
use serde::{Deserialize, Serialize};

use super::category::{ObstacleCategory, ParseCategoryError};

pub const SCHEMA_KEY: &str = "obstacles.schema";
pub const COUNT_KEY: &str = "obstacles.count";
pub const BLOB_KEY: &str = "obstacles.blob";

pub fn record_key(index: usize, field: &str) -> String {
    format!("obstacles.{index}.{field}")
}

/// Persisted placement of one obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleRecord {
    pub category: ObstacleCategory,
    /// Degrees in [0, 360)
    pub rotation: f32,
    pub position: Vec2,
}

/// Storage layout of the placement list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlacementSchema {
    Keyed,
    #[default]
    Blob,
}

impl PlacementSchema {
    pub fn version(self) -> i64 {
        match self {
            PlacementSchema::Keyed => 1,
            PlacementSchema::Blob => 2,
        }
    }

    pub fn from_version(version: i64) -> Option<Self> {
        match version {
            1 => Some(PlacementSchema::Keyed),
            2 => Some(PlacementSchema::Blob),
            _ => None,
        }
    }
}

/// Errors that can occur while reading the placement list
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("record {index}: {source}")]
    UnknownCategory {
        index: usize,
        #[source]
        source: ParseCategoryError,
    },

    #[error("record {index} is missing its '{field}' value")]
    MissingField { index: usize, field: &'static str },

    #[error("key '{key}': {source}")]
    WrongType {
        key: String,
        #[source]
        source: ValueTypeError,
    },

    #[error("negative record count {0}")]
    NegativeCount(i64),

    #[error("placement blob declares {declared} records but holds {actual}")]
    CountMismatch { declared: usize, actual: usize },

    #[error("malformed placement blob: {0}")]
    Blob(#[from] serde_json::Error),

    #[error("unsupported placement schema {0}")]
    UnsupportedSchema(i64),
}

/// Wire shape of a record: the category travels as its symbolic name
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRecord {
    kind: String,
    rotation: f32,
    x: f32,
    y: f32,
}

impl RawRecord {
    fn from_record(record: &ObstacleRecord) -> Self {
        Self {
            kind: record.category.name().to_string(),
            rotation: record.rotation,
            x: record.position.x,
            y: record.position.y,
        }
    }

    fn into_record(self, index: usize) -> Result<ObstacleRecord, PlacementError> {
        let category = self
            .kind
            .parse()
            .map_err(|source| PlacementError::UnknownCategory { index, source })?;
        Ok(ObstacleRecord {
            category,
            rotation: self.rotation,
            position: Vec2::new(self.x, self.y),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PlacementBlob {
    count: usize,
    records: Vec<RawRecord>,
}

/// Write the full ordered list, replacing whatever was saved before
pub fn save_placements<S: KeyValueStore + ?Sized>(
    store: &mut S,
    records: &[ObstacleRecord],
    schema: PlacementSchema,
) -> Result<(), PlacementError> {
    match schema {
        PlacementSchema::Keyed => {
            store.remove(BLOB_KEY);
            store.set(COUNT_KEY, StoredValue::Int(records.len() as i64));
            for (index, record) in records.iter().enumerate() {
                store.set(
                    &record_key(index, "kind"),
                    StoredValue::Text(record.category.name().to_string()),
                );
                store.set(&record_key(index, "rotation"), StoredValue::Float(record.rotation));
                store.set(&record_key(index, "x"), StoredValue::Float(record.position.x));
                store.set(&record_key(index, "y"), StoredValue::Float(record.position.y));
            }
            remove_stale_records(store, records.len());
        }
        PlacementSchema::Blob => {
            let blob = PlacementBlob {
                count: records.len(),
                records: records.iter().map(RawRecord::from_record).collect(),
            };
            store.set(BLOB_KEY, StoredValue::Text(serde_json::to_string(&blob)?));
            store.remove(COUNT_KEY);
            remove_stale_records(store, 0);
        }
    }
    store.set(SCHEMA_KEY, StoredValue::Int(schema.version()));
    Ok(())
}

/// Read the ordered list back; an empty store yields no records
pub fn load_placements<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<Vec<ObstacleRecord>, PlacementError> {
    let schema = match store.get(SCHEMA_KEY) {
        None => PlacementSchema::Keyed,
        Some(value) => {
            let version = value.as_int().map_err(|source| PlacementError::WrongType {
                key: SCHEMA_KEY.to_string(),
                source,
            })?;
            PlacementSchema::from_version(version)
                .ok_or(PlacementError::UnsupportedSchema(version))?
        }
    };

    match schema {
        PlacementSchema::Keyed => load_keyed(store),
        PlacementSchema::Blob => load_blob(store),
    }
}

fn load_keyed<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<ObstacleRecord>, PlacementError> {
    let count = match store.get(COUNT_KEY) {
        None => return Ok(Vec::new()),
        Some(value) => value.as_int().map_err(|source| PlacementError::WrongType {
            key: COUNT_KEY.to_string(),
            source,
        })?,
    };
    if count < 0 {
        return Err(PlacementError::NegativeCount(count));
    }

    // The count is untrusted; missing records surface as `MissingField`
    let mut records = Vec::new();
    for index in 0..count as usize {
        let kind = read_field(store, index, "kind")?;
        let kind = kind
            .as_text()
            .map_err(|source| PlacementError::WrongType {
                key: record_key(index, "kind"),
                source,
            })?
            .to_string();
        let raw = RawRecord {
            kind,
            rotation: read_float(store, index, "rotation")?,
            x: read_float(store, index, "x")?,
            y: read_float(store, index, "y")?,
        };
        records.push(raw.into_record(index)?);
    }
    Ok(records)
}

fn load_blob<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<ObstacleRecord>, PlacementError> {
    let text = match store.get(BLOB_KEY) {
        None => return Ok(Vec::new()),
        Some(value) => value
            .as_text()
            .map_err(|source| PlacementError::WrongType {
                key: BLOB_KEY.to_string(),
                source,
            })?
            .to_string(),
    };
    let blob: PlacementBlob = serde_json::from_str(&text)?;
    if blob.records.len() != blob.count {
        return Err(PlacementError::CountMismatch {
            declared: blob.count,
            actual: blob.records.len(),
        });
    }
    blob.records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| raw.into_record(index))
        .collect()
}

fn read_field<S: KeyValueStore + ?Sized>(
    store: &S,
    index: usize,
    field: &'static str,
) -> Result<StoredValue, PlacementError> {
    store
        .get(&record_key(index, field))
        .ok_or(PlacementError::MissingField { index, field })
}

fn read_float<S: KeyValueStore + ?Sized>(
    store: &S,
    index: usize,
    field: &'static str,
) -> Result<f32, PlacementError> {
    read_field(store, index, field)?
        .as_float()
        .map_err(|source| PlacementError::WrongType {
            key: record_key(index, field),
            source,
        })
}

const RECORD_FIELDS: [&str; 4] = ["kind", "rotation", "x", "y"];

/// Drop keyed records from `first` up to the first index with no keys left.
/// Saved records are contiguous, so this never trusts a stored count.
fn remove_stale_records<S: KeyValueStore + ?Sized>(store: &mut S, first: usize) {
    for index in first.. {
        let keys: Vec<String> = RECORD_FIELDS
            .iter()
            .map(|field| record_key(index, field))
            .filter(|key| store.contains(key))
            .collect();
        if keys.is_empty() {
            break;
        }
        for key in keys {
            store.remove(&key);
        }
    }
}
