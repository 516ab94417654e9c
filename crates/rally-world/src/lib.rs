//! Rally World - Terrain streaming and obstacle population
//!
//! Keeps a bounded window of terrain tiles and scenery around a moving
//! anchor, filling newly reached regions and persisting what was placed.

pub mod config;
pub mod host;
pub mod obstacle;
pub mod session;
pub mod tile;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ObstacleConfig, StreamingConfig, FALLBACK_REGION_EXTENT};
pub use host::{ObstacleHost, Prefab, PrefabTable, TileHost, Viewport};
pub use obstacle::{
    ObstacleCategory, ObstacleField, ObstacleRecord, ObstacleTick, ParseCategoryError,
    PlacementError, PlacementSchema, SpacedSpawn, SpawnTable, SpawnWeights, WeightError,
};
pub use session::{RallyWorld, WorldSave, WorldSettings, WorldTick};
pub use tile::{AnchorReady, AnchorSave, Tile, TileStreamer};
pub use visibility::VisibilityWindow;
