//! Tunable parameters for the streaming subsystems

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::obstacle::{ObstacleCategory, PlacementSchema};

/// Region extent used when the viewport reports an empty or non-finite one;
/// matches a 1600x900 screen showing 40 world units across
pub const FALLBACK_REGION_EXTENT: Vec2 = Vec2::new(40.0, 22.5);

/// Terrain tile grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Edge length of a square terrain tile
    pub tile_size: f32,
    /// Tiles farther than `cutoff_factor * tile_size` from the current tile are deactivated
    pub cutoff_factor: f32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            tile_size: 20.0,
            cutoff_factor: 2.0,
        }
    }
}

impl StreamingConfig {
    pub fn cutoff_radius(&self) -> f32 {
        self.tile_size * self.cutoff_factor
    }
}

/// Obstacle population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleConfig {
    /// Density cap per region
    pub max_visible_objects: u32,
    /// Seconds between spaced spawn attempts
    pub spaced_spawn_period: f32,
    /// A spaced spawn is declined unless its nearest neighbor is farther than this
    pub minimal_spacing: f32,
    /// Visibility window half-extent as a multiple of the region extent (> 1)
    pub visibility_coefficient: f32,
    /// Random candidates scored per spaced spawn attempt
    pub spacing_candidates: usize,
    /// Category injected by spaced spawns
    pub spaced_category: ObstacleCategory,
    /// Layout used when saving the placement list
    pub placement_schema: PlacementSchema,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            max_visible_objects: 50,
            spaced_spawn_period: 50.0,
            minimal_spacing: 50.0,
            visibility_coefficient: 1.5,
            spacing_candidates: 10,
            spaced_category: ObstacleCategory::Bush,
            placement_schema: PlacementSchema::Blob,
        }
    }
}
