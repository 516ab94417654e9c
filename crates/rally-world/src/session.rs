//! Composed per-tick driver
//!
//! Owns both subsystems and fixes their order: tiles start first and hand
//! over the restored anchor, then obstacles start from it. Each tick flows
//! anchor pose → tiles → obstacles.

use glam::Vec2;
use rally_core::{Crossing, KeyValueStore, Pose};
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::config::{ObstacleConfig, StreamingConfig};
use crate::host::{ObstacleHost, TileHost, Viewport};
use crate::obstacle::{ObstacleField, ObstacleTick, PlacementError, SpawnTable};
use crate::tile::{AnchorSave, TileStreamer};

/// Everything the world needs at startup besides the store and host
#[derive(Debug, Clone, Default)]
pub struct WorldSettings {
    pub streaming: StreamingConfig,
    pub obstacles: ObstacleConfig,
    pub table: SpawnTable,
}

/// What one world tick changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTick {
    pub tile_crossing: Option<Crossing>,
    pub obstacles: ObstacleTick,
}

/// What teardown wrote to the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSave {
    pub anchor: AnchorSave,
    pub records: usize,
}

pub struct RallyWorld<T, O> {
    tiles: TileStreamer<T>,
    obstacles: ObstacleField<O>,
}

impl<T, O> RallyWorld<T, O> {
    /// Restore both subsystems from `store`. Returns the world and the
    /// anchor pose the controller should resume from.
    pub fn start<H, S>(
        settings: WorldSettings,
        store: &S,
        host: &mut H,
        rng: StdRng,
    ) -> Result<(Self, Pose), PlacementError>
    where
        H: TileHost<Tile = T> + ObstacleHost<Obstacle = O> + Viewport + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        let (tiles, ready) = TileStreamer::restore(settings.streaming, store, host);
        let pose = ready.pose();
        let extent = host.region_extent();
        info!("Region extent {:.2} x {:.2}", extent.x, extent.y);

        let obstacles = match ObstacleField::restore(
            ready,
            settings.obstacles,
            settings.table,
            extent,
            store,
            host,
            rng,
        ) {
            Ok(obstacles) => obstacles,
            Err(e) => {
                let released = tiles.release(host);
                warn!("Obstacle restore failed, released {} tiles", released);
                return Err(e);
            }
        };
        Ok((Self { tiles, obstacles }, pose))
    }

    pub fn tick<H>(&mut self, host: &mut H, anchor: Pose, delta: f32) -> WorldTick
    where
        H: TileHost<Tile = T> + ObstacleHost<Obstacle = O> + ?Sized,
    {
        let tile_crossing = self.tiles.tick(host, anchor);
        let obstacles = self.obstacles.tick(host, anchor.position, delta);
        WorldTick {
            tile_crossing,
            obstacles,
        }
    }

    /// Persist both subsystems and release every handle
    pub fn teardown<H, S>(self, host: &mut H, store: &mut S) -> Result<WorldSave, PlacementError>
    where
        H: TileHost<Tile = T> + ObstacleHost<Obstacle = O> + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        let anchor = self.tiles.teardown(host, store);
        let records = self.obstacles.teardown(host, store)?;
        Ok(WorldSave { anchor, records })
    }

    pub fn tiles(&self) -> &TileStreamer<T> {
        &self.tiles
    }

    pub fn obstacles(&self) -> &ObstacleField<O> {
        &self.obstacles
    }

    pub fn anchor_position(&self) -> Vec2 {
        self.tiles.anchor().position
    }
}
