//! In-memory host used by unit tests

use glam::Vec2;
use rally_core::GridCoord;

use crate::host::{ObstacleHost, TileHost, Viewport};
use crate::obstacle::ObstacleCategory;

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedTile {
    pub coord: GridCoord,
    pub center: Vec2,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedObstacle {
    pub category: ObstacleCategory,
    pub position: Vec2,
    pub rotation: f32,
    pub active: bool,
}

/// Records every call; handles are indices into the spawn logs
#[derive(Debug)]
pub struct RecordingHost {
    pub tiles: Vec<SpawnedTile>,
    pub obstacles: Vec<SpawnedObstacle>,
    pub despawned_tiles: usize,
    pub despawned_obstacles: usize,
    pub toggles: usize,
    pub screen: (u32, u32),
    pub world_width: f32,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            tiles: Vec::new(),
            obstacles: Vec::new(),
            despawned_tiles: 0,
            despawned_obstacles: 0,
            toggles: 0,
            screen: (1600, 900),
            world_width: 40.0,
        }
    }
}

impl RecordingHost {
    pub fn active_obstacles(&self) -> usize {
        self.obstacles.iter().filter(|o| o.active).count()
    }
}

impl TileHost for RecordingHost {
    type Tile = usize;

    fn spawn_tile(&mut self, coord: GridCoord, center: Vec2) -> usize {
        self.tiles.push(SpawnedTile {
            coord,
            center,
            active: true,
        });
        self.tiles.len() - 1
    }

    fn set_tile_active(&mut self, tile: &mut usize, active: bool) {
        self.tiles[*tile].active = active;
        self.toggles += 1;
    }

    fn despawn_tile(&mut self, _tile: usize) {
        self.despawned_tiles += 1;
    }
}

impl ObstacleHost for RecordingHost {
    type Obstacle = usize;

    fn spawn_obstacle(&mut self, category: ObstacleCategory, position: Vec2, rotation: f32) -> usize {
        self.obstacles.push(SpawnedObstacle {
            category,
            position,
            rotation,
            active: true,
        });
        self.obstacles.len() - 1
    }

    fn set_obstacle_active(&mut self, obstacle: &mut usize, active: bool) {
        self.obstacles[*obstacle].active = active;
        self.toggles += 1;
    }

    fn despawn_obstacle(&mut self, _obstacle: usize) {
        self.despawned_obstacles += 1;
    }
}

impl Viewport for RecordingHost {
    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn world_width(&self) -> f32 {
        self.world_width
    }
}
