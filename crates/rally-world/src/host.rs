//! Collaborator interfaces the engine drives
//!
//! The engine never renders or simulates anything itself. It asks a host to
//! create, show, hide, and destroy the objects it decides should exist.

use glam::Vec2;
use rally_core::GridCoord;

use crate::obstacle::ObstacleCategory;

/// Creates and toggles terrain tiles
pub trait TileHost {
    /// Renderable owned by a tile
    type Tile;

    fn spawn_tile(&mut self, coord: GridCoord, center: Vec2) -> Self::Tile;
    fn set_tile_active(&mut self, tile: &mut Self::Tile, active: bool);
    fn despawn_tile(&mut self, tile: Self::Tile);
}

/// Creates and toggles scenery objects
pub trait ObstacleHost {
    /// Renderable owned by an obstacle
    type Obstacle;

    fn spawn_obstacle(
        &mut self,
        category: ObstacleCategory,
        position: Vec2,
        rotation: f32,
    ) -> Self::Obstacle;
    fn set_obstacle_active(&mut self, obstacle: &mut Self::Obstacle, active: bool);
    fn despawn_obstacle(&mut self, obstacle: Self::Obstacle);
}

/// Camera query answered once at startup
pub trait Viewport {
    /// Screen size in pixels
    fn screen_size(&self) -> (u32, u32);
    /// World-space width covered by the screen
    fn world_width(&self) -> f32;

    /// World-space extent of one region: the visible width, and a depth
    /// following the screen aspect ratio
    fn region_extent(&self) -> Vec2 {
        let (width, height) = self.screen_size();
        let world_width = self.world_width();
        let aspect = if width == 0 {
            1.0
        } else {
            height as f32 / width as f32
        };
        Vec2::new(world_width, world_width * aspect)
    }
}

/// Constructor for one category of obstacle
pub type Prefab<H> = fn(Vec2, f32) -> H;

/// Category to constructor table
pub struct PrefabTable<H> {
    pub tree: Prefab<H>,
    pub bush: Prefab<H>,
    pub puddle: Prefab<H>,
    pub stone: Prefab<H>,
}

impl<H> PrefabTable<H> {
    pub fn prefab(&self, category: ObstacleCategory) -> Prefab<H> {
        match category {
            ObstacleCategory::Tree => self.tree,
            ObstacleCategory::Bush => self.bush,
            ObstacleCategory::Puddle => self.puddle,
            ObstacleCategory::Stone => self.stone,
        }
    }

    pub fn instantiate(&self, category: ObstacleCategory, position: Vec2, rotation: f32) -> H {
        (self.prefab(category))(position, rotation)
    }
}
