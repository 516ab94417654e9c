//! Tile-based terrain streaming
//!
//! Keeps the 3×3 block of tiles around the anchor instantiated and active,
//! and deactivates tiles that fall past the cutoff radius. Tiles are created
//! the first time they are needed and only destroyed at teardown.
//!
//! The tile grid is local to a terrain origin. At startup the origin is
//! derived from the saved anchor position and its saved offset inside its
//! tile, so a restored session sees the same tile layout under the anchor.

use std::collections::HashMap;

use glam::Vec2;
use rally_core::{Crossing, GridCoord, KeyValueStore, Pose};
use tracing::{debug, info};

use crate::config::StreamingConfig;
use crate::host::TileHost;

pub const ROTATION_KEY: &str = "anchor.rotation";
pub const POSITION_X_KEY: &str = "anchor.position.x";
pub const POSITION_Y_KEY: &str = "anchor.position.y";
pub const OFFSET_X_KEY: &str = "terrain.offset.x";
pub const OFFSET_Y_KEY: &str = "terrain.offset.y";

/// Anchor state persisted between sessions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorSave {
    /// World position of the anchor
    pub position: Vec2,
    /// Anchor offset from the center of its current tile
    pub offset: Vec2,
    /// Anchor heading in degrees
    pub rotation: f32,
}

impl AnchorSave {
    /// Read the saved anchor, defaulting to the world origin
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            position: Vec2::new(
                store.get_float(POSITION_X_KEY, 0.0),
                store.get_float(POSITION_Y_KEY, 0.0),
            ),
            offset: Vec2::new(
                store.get_float(OFFSET_X_KEY, 0.0),
                store.get_float(OFFSET_Y_KEY, 0.0),
            ),
            rotation: store.get_float(ROTATION_KEY, 0.0),
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        store.set_float(ROTATION_KEY, self.rotation);
        store.set_float(POSITION_X_KEY, self.position.x);
        store.set_float(POSITION_Y_KEY, self.position.y);
        store.set_float(OFFSET_X_KEY, self.offset.x);
        store.set_float(OFFSET_Y_KEY, self.offset.y);
    }
}

/// One-shot proof that the anchor pose has been restored
///
/// Only `TileStreamer::initialize` creates one, and consumers take it by
/// value, so obstacle population cannot start before the tiles are ready.
#[derive(Debug)]
pub struct AnchorReady {
    pose: Pose,
}

impl AnchorReady {
    /// Restored anchor pose the controller should resume from
    pub fn pose(&self) -> Pose {
        self.pose
    }
}

/// A single terrain tile
pub struct Tile<T> {
    /// Grid coordinate of this tile
    pub coord: GridCoord,
    /// Whether the tile is currently shown
    pub active: bool,
    handle: T,
}

impl<T> Tile<T> {
    pub fn handle(&self) -> &T {
        &self.handle
    }
}

/// Manages activation of terrain tiles around the anchor
pub struct TileStreamer<T> {
    config: StreamingConfig,
    origin: Vec2,
    current: GridCoord,
    anchor: Pose,
    tiles: HashMap<GridCoord, Tile<T>>,
    /// Tiles created during the last update
    pub newly_spawned: Vec<GridCoord>,
    /// Tiles deactivated during the last update
    pub newly_hidden: Vec<GridCoord>,
}

impl<T> TileStreamer<T> {
    /// Restore the anchor from `saved` and instantiate its neighborhood
    pub fn initialize<H>(
        config: StreamingConfig,
        saved: AnchorSave,
        host: &mut H,
    ) -> (Self, AnchorReady)
    where
        H: TileHost<Tile = T> + ?Sized,
    {
        let anchor = Pose::new(saved.position, saved.rotation);
        let origin = saved.position - saved.offset;
        let cell = Vec2::splat(config.tile_size);
        let current = GridCoord::nearest(anchor.position - origin, cell);

        let mut streamer = Self {
            config,
            origin,
            current,
            anchor,
            tiles: HashMap::new(),
            newly_spawned: Vec::new(),
            newly_hidden: Vec::new(),
        };
        streamer.show_neighborhood(host);

        info!(
            "Anchor restored at ({:.2}, {:.2}) heading {:.1}, {} tiles around {:?}",
            anchor.position.x,
            anchor.position.y,
            anchor.heading,
            streamer.tiles.len(),
            current
        );

        (streamer, AnchorReady { pose: anchor })
    }

    /// Load the saved anchor from `store` and initialize from it
    pub fn restore<H, S>(config: StreamingConfig, store: &S, host: &mut H) -> (Self, AnchorReady)
    where
        H: TileHost<Tile = T> + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        Self::initialize(config, AnchorSave::load(store), host)
    }

    /// Follow the anchor. Returns the transition taken, if any.
    ///
    /// At most one shift happens per call.
    pub fn tick<H>(&mut self, host: &mut H, anchor: Pose) -> Option<Crossing>
    where
        H: TileHost<Tile = T> + ?Sized,
    {
        self.newly_spawned.clear();
        self.newly_hidden.clear();
        self.anchor = anchor;

        let crossing = Crossing::detect(self.offset(), Vec2::splat(self.config.tile_size / 2.0))?;
        self.current = crossing.apply(self.current);
        debug!("Anchor crossed {:?} into tile {:?}", crossing, self.current);

        self.show_neighborhood(host);
        self.hide_distant(host);
        Some(crossing)
    }

    /// Persist the anchor and release every tile
    pub fn teardown<H, S>(self, host: &mut H, store: &mut S) -> AnchorSave
    where
        H: TileHost<Tile = T> + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        let save = AnchorSave {
            position: self.anchor.position,
            offset: self.offset(),
            rotation: self.anchor.heading,
        };
        save.save(store);

        let count = self.release(host);
        info!("Saved anchor pose, released {} tiles", count);
        save
    }

    /// Despawn every tile without saving; returns how many were released
    pub fn release<H>(self, host: &mut H) -> usize
    where
        H: TileHost<Tile = T> + ?Sized,
    {
        let count = self.tiles.len();
        for (_, tile) in self.tiles {
            host.despawn_tile(tile.handle);
        }
        count
    }

    /// Anchor offset from the center of the current tile
    pub fn offset(&self) -> Vec2 {
        self.anchor.position - self.tile_center(self.current)
    }

    /// Coordinate of the tile the anchor is in
    pub fn current_tile(&self) -> GridCoord {
        self.current
    }

    /// World-space center of a tile
    pub fn tile_center(&self, coord: GridCoord) -> Vec2 {
        self.origin + coord.center(self.cell())
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn anchor(&self) -> Pose {
        self.anchor
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn tile(&self, coord: &GridCoord) -> Option<&Tile<T>> {
        self.tiles.get(coord)
    }

    /// Iterate over every tile ever created this session
    pub fn tiles(&self) -> impl Iterator<Item = &Tile<T>> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn active_tiles(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.tiles.values().filter(|t| t.active).map(|t| t.coord)
    }

    pub fn active_count(&self) -> usize {
        self.tiles.values().filter(|t| t.active).count()
    }

    fn cell(&self) -> Vec2 {
        Vec2::splat(self.config.tile_size)
    }

    fn show_neighborhood<H>(&mut self, host: &mut H)
    where
        H: TileHost<Tile = T> + ?Sized,
    {
        for coord in self.current.neighborhood() {
            if let Some(tile) = self.tiles.get_mut(&coord) {
                if !tile.active {
                    host.set_tile_active(&mut tile.handle, true);
                    tile.active = true;
                }
                continue;
            }
            let center = self.origin + coord.center(Vec2::splat(self.config.tile_size));
            let handle = host.spawn_tile(coord, center);
            self.tiles.insert(
                coord,
                Tile {
                    coord,
                    active: true,
                    handle,
                },
            );
            self.newly_spawned.push(coord);
        }
    }

    fn hide_distant<H>(&mut self, host: &mut H)
    where
        H: TileHost<Tile = T> + ?Sized,
    {
        let cell = self.cell();
        let cutoff = self.config.cutoff_radius();
        let current = self.current;
        for tile in self.tiles.values_mut() {
            if tile.active && tile.coord.distance(&current, cell) > cutoff {
                host.set_tile_active(&mut tile.handle, false);
                tile.active = false;
                self.newly_hidden.push(tile.coord);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHost;
    use rally_core::MemoryStore;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn start(saved: AnchorSave) -> (TileStreamer<usize>, RecordingHost, AnchorReady) {
        let mut host = RecordingHost::default();
        let (streamer, ready) = TileStreamer::initialize(StreamingConfig::default(), saved, &mut host);
        (streamer, host, ready)
    }

    fn assert_window(streamer: &TileStreamer<usize>) {
        let current = streamer.current_tile();
        for coord in current.neighborhood() {
            let tile = streamer.tile(&coord).expect("neighbor tile exists");
            assert!(tile.active, "neighbor {coord:?} of {current:?} inactive");
        }
        let cell = Vec2::splat(streamer.config().tile_size);
        let cutoff = streamer.config().cutoff_radius();
        for coord in streamer.active_tiles() {
            assert!(
                coord.distance(&current, cell) <= cutoff,
                "{coord:?} active beyond cutoff of {current:?}"
            );
        }
    }

    #[test]
    fn test_initialize_spawns_neighborhood() {
        let (streamer, host, ready) = start(AnchorSave::default());
        assert_eq!(streamer.tile_count(), 9);
        assert_eq!(streamer.active_count(), 9);
        assert_eq!(host.tiles.len(), 9);
        assert_eq!(streamer.current_tile(), GridCoord::ORIGIN);
        assert_eq!(ready.pose(), Pose::default());
        assert_window(&streamer);
    }

    #[test]
    fn test_restore_uses_saved_offset_as_origin() {
        let saved = AnchorSave {
            position: Vec2::new(107.0, -33.0),
            offset: Vec2::new(7.0, -3.0),
            rotation: 45.0,
        };
        let (streamer, _host, ready) = start(saved);
        assert_eq!(streamer.origin(), Vec2::new(100.0, -30.0));
        assert_eq!(streamer.current_tile(), GridCoord::ORIGIN);
        assert_eq!(streamer.offset(), Vec2::new(7.0, -3.0));
        assert_eq!(ready.pose().heading, 45.0);
        assert_eq!(streamer.tile_center(GridCoord::new(1, 0)), Vec2::new(120.0, -30.0));
    }

    #[test]
    fn test_crossing_is_edge_triggered() {
        let (mut streamer, mut host, _) = start(AnchorSave::default());

        assert_eq!(streamer.tick(&mut host, Pose::new(Vec2::new(9.5, 0.0), 0.0)), None);
        assert_eq!(streamer.tile_count(), 9);

        let crossing = streamer.tick(&mut host, Pose::new(Vec2::new(10.5, 0.0), 0.0));
        assert_eq!(crossing, Some(Crossing::East));
        assert_eq!(streamer.current_tile(), GridCoord::new(1, 0));
        assert_eq!(streamer.newly_spawned.len(), 3);
        assert_eq!(streamer.tile_count(), 12);

        // Staying put does not shift again
        assert_eq!(streamer.tick(&mut host, Pose::new(Vec2::new(10.5, 0.0), 0.0)), None);
        assert!(streamer.newly_spawned.is_empty());
    }

    #[test]
    fn test_diagonal_crossing_shifts_once() {
        let (mut streamer, mut host, _) = start(AnchorSave::default());
        let crossing = streamer.tick(&mut host, Pose::new(Vec2::new(-10.5, 10.5), 0.0));
        assert_eq!(crossing, Some(Crossing::NorthWest));
        assert_eq!(streamer.current_tile(), GridCoord::new(-1, 1));
        assert_eq!(streamer.newly_spawned.len(), 5);
        assert_window(&streamer);
    }

    #[test]
    fn test_distant_tiles_deactivate_and_come_back() {
        let (mut streamer, mut host, _) = start(AnchorSave::default());
        for step in 1..=3 {
            let x = step as f32 * 20.0 - 9.0;
            streamer.tick(&mut host, Pose::new(Vec2::new(x, 0.0), 0.0));
        }
        assert_eq!(streamer.current_tile(), GridCoord::new(3, 0));
        let origin_tile = streamer.tile(&GridCoord::ORIGIN).unwrap();
        assert!(!origin_tile.active);
        assert_window(&streamer);

        for step in (0..4).rev() {
            let x = step as f32 * 20.0 - 11.0;
            streamer.tick(&mut host, Pose::new(Vec2::new(x, 0.0), 0.0));
        }
        assert_eq!(streamer.current_tile(), GridCoord::new(-1, 0));
        assert!(streamer.tile(&GridCoord::ORIGIN).unwrap().active);
        // Reactivated, not duplicated
        assert_eq!(host.tiles.len(), streamer.tile_count());
        assert_window(&streamer);
    }

    #[test]
    fn test_random_walk_keeps_window_invariant() {
        let (mut streamer, mut host, _) = start(AnchorSave::default());
        let mut rng = StdRng::seed_from_u64(11);
        let mut position = Vec2::ZERO;
        for _ in 0..5_000 {
            position += Vec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
            streamer.tick(&mut host, Pose::new(position, 0.0));
            assert_window(&streamer);
        }
        assert_eq!(host.tiles.len(), streamer.tile_count());
    }

    #[test]
    fn test_teardown_persists_and_releases() {
        let (mut streamer, mut host, _) = start(AnchorSave::default());
        streamer.tick(&mut host, Pose::new(Vec2::new(13.0, 4.0), 270.0));
        let mut store = MemoryStore::new();
        let count = streamer.tile_count();
        let save = streamer.teardown(&mut host, &mut store);

        assert_eq!(host.despawned_tiles, count);
        assert_eq!(save.offset, Vec2::new(-7.0, 4.0));
        assert_eq!(AnchorSave::load(&store), save);

        let (restored, _, ready) = start(AnchorSave::load(&store));
        assert_eq!(restored.current_tile(), GridCoord::ORIGIN);
        assert_eq!(restored.offset(), Vec2::new(-7.0, 4.0));
        assert_eq!(ready.pose().position, Vec2::new(13.0, 4.0));
        assert_eq!(ready.pose().heading, 270.0);
    }
}
