//! Obstacle population engine
//!
//! Fills the regions around the anchor with a weighted mix of scenery,
//! injects well-spaced objects of one category on a timer, culls objects
//! outside the visibility window, and persists the full placement list.
//!
//! Regions form their own grid, sized from the viewport and anchored at the
//! anchor's position at startup; it is independent of the terrain tiles.

pub mod category;
pub mod placement;
pub mod spacing;
pub mod weights;

use std::collections::HashSet;

use glam::Vec2;
use rally_core::{Crossing, GridCoord, KeyValueStore, PeriodicTimer, Rect};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{ObstacleConfig, FALLBACK_REGION_EXTENT};
use crate::host::ObstacleHost;
use crate::tile::AnchorReady;
use crate::visibility::VisibilityWindow;

pub use category::{ObstacleCategory, ParseCategoryError};
pub use placement::{load_placements, save_placements, ObstacleRecord, PlacementError, PlacementSchema};
pub use spacing::{farthest_candidate, SpacingChoice};
pub use weights::{SpawnTable, SpawnWeights, WeightError};

/// A spawned scenery object
pub struct Obstacle<O> {
    pub record: ObstacleRecord,
    pub active: bool,
    handle: O,
}

impl<O> Obstacle<O> {
    pub fn handle(&self) -> &O {
        &self.handle
    }
}

/// Result of a spaced spawn attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpacedSpawn {
    /// The period has not elapsed yet
    NotDue,
    /// A new object was placed at `index` in the placement list
    Spawned { index: usize, nearest_distance: f32 },
    /// No candidate cleared the spacing floor; nothing spawned this period
    Declined { best_distance: f32 },
}

/// What one obstacle tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleTick {
    pub crossing: Option<Crossing>,
    pub spawned: usize,
    pub spaced: SpacedSpawn,
}

/// Owns every obstacle spawned this session
pub struct ObstacleField<O> {
    config: ObstacleConfig,
    table: SpawnTable,
    extent: Vec2,
    region_origin: Vec2,
    anchor_region: GridCoord,
    anchor: Vec2,
    filled: HashSet<GridCoord>,
    obstacles: Vec<Obstacle<O>>,
    timer: PeriodicTimer,
    window: VisibilityWindow,
    rng: StdRng,
}

impl<O> ObstacleField<O> {
    /// Re-spawn `records` in order, then fill the regions around the anchor
    pub fn start<H>(
        ready: AnchorReady,
        config: ObstacleConfig,
        table: SpawnTable,
        extent: Vec2,
        records: Vec<ObstacleRecord>,
        host: &mut H,
        rng: StdRng,
    ) -> Self
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        let extent = if extent.is_finite() && extent.cmpgt(Vec2::ZERO).all() {
            extent
        } else {
            warn!("Unusable region extent {:?}, using {:?}", extent, FALLBACK_REGION_EXTENT);
            FALLBACK_REGION_EXTENT
        };
        let anchor = ready.pose().position;
        let window = VisibilityWindow::around(anchor, extent, config.visibility_coefficient);
        let timer = PeriodicTimer::new(config.spaced_spawn_period);
        let mut field = Self {
            config,
            table,
            extent,
            region_origin: anchor,
            anchor_region: GridCoord::ORIGIN,
            anchor,
            filled: HashSet::new(),
            obstacles: Vec::with_capacity(records.len()),
            timer,
            window,
            rng,
        };

        let restored = records.len();
        for record in records {
            let mut handle = host.spawn_obstacle(record.category, record.position, record.rotation);
            let active = field.window.contains(record.position);
            if !active {
                host.set_obstacle_active(&mut handle, false);
            }
            field.obstacles.push(Obstacle {
                record,
                active,
                handle,
            });
        }

        let spawned = field.populate(host, GridCoord::ORIGIN);
        field.cull(host, anchor);
        info!(
            "Obstacles ready: {} restored, {} spawned, {} active",
            restored,
            spawned,
            field.active_count()
        );
        field
    }

    /// Load the placement list from `store` and start from it
    pub fn restore<H, S>(
        ready: AnchorReady,
        config: ObstacleConfig,
        table: SpawnTable,
        extent: Vec2,
        store: &S,
        host: &mut H,
        rng: StdRng,
    ) -> Result<Self, PlacementError>
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        let records = load_placements(store)?;
        Ok(Self::start(ready, config, table, extent, records, host, rng))
    }

    /// Per-tick update: follow the anchor, fill new regions, run the spaced
    /// spawn timer, and cull by visibility
    pub fn tick<H>(&mut self, host: &mut H, anchor: Vec2, delta: f32) -> ObstacleTick
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        self.anchor = anchor;

        let offset = anchor - self.region_center(self.anchor_region);
        let crossing = Crossing::detect(offset, self.extent / 2.0);
        if let Some(crossing) = crossing {
            self.anchor_region = crossing.apply(self.anchor_region);
            debug!("Anchor moved {:?} into region {:?}", crossing, self.anchor_region);
        }
        let spawned = self.populate(host, self.anchor_region);

        let elapsed = self.timer.accumulate(delta);
        let spaced = self.maybe_spawn_spaced(host, anchor, elapsed);
        if spaced != SpacedSpawn::NotDue {
            self.timer.reset();
        }

        self.cull(host, anchor);

        ObstacleTick {
            crossing,
            spawned,
            spaced,
        }
    }

    /// Fill every not-yet-filled region of the 3×3 block around `center`
    /// up to the density cap. Returns the number of objects spawned.
    ///
    /// A region is marked filled after one attempt, whether or not it ended
    /// up saturated.
    pub fn populate<H>(&mut self, host: &mut H, center: GridCoord) -> usize
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        let mut spawned = 0;
        for region in center.neighborhood() {
            if self.filled.contains(&region) {
                continue;
            }
            let rect = self.region_rect(region);
            let mut count = self.reveal_in(host, rect);
            let mut added = 0;
            while count < self.config.max_visible_objects as usize {
                let category = self.table.draw(&mut self.rng);
                let position = self.random_point(rect);
                let rotation = self.rng.gen_range(0.0..360.0);
                self.spawn(host, category, position, rotation);
                count += 1;
                added += 1;
            }
            self.filled.insert(region);
            debug!("Filled region {:?}: {} spawned, {} total", region, added, count);
            spawned += added;
        }
        spawned
    }

    /// Try to inject one well-spaced object of the spaced category around
    /// `anchor`, if more than the configured period has elapsed
    pub fn maybe_spawn_spaced<H>(&mut self, host: &mut H, anchor: Vec2, elapsed: f32) -> SpacedSpawn
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        if elapsed <= self.config.spaced_spawn_period {
            return SpacedSpawn::NotDue;
        }

        let neighborhood = Rect::from_center(anchor, self.extent / 2.0);
        let category = self.config.spaced_category;
        let existing: Vec<Vec2> = self
            .obstacles
            .iter()
            .filter(|o| o.active && o.record.category == category)
            .map(|o| o.record.position)
            .filter(|p| neighborhood.contains(*p))
            .collect();
        let candidates: Vec<Vec2> = (0..self.config.spacing_candidates)
            .map(|_| self.random_point(neighborhood))
            .collect();

        let Some(choice) = farthest_candidate(&candidates, &existing) else {
            return SpacedSpawn::Declined {
                best_distance: 0.0,
            };
        };
        if choice.nearest_distance > self.config.minimal_spacing {
            let rotation = self.rng.gen_range(0.0..360.0);
            let index = self.spawn(host, category, choice.position, rotation);
            debug!(
                "Spaced {} spawned at ({:.2}, {:.2}), nearest neighbor {:.2}",
                category, choice.position.x, choice.position.y, choice.nearest_distance
            );
            SpacedSpawn::Spawned {
                index,
                nearest_distance: choice.nearest_distance,
            }
        } else {
            debug!(
                "Spaced {} declined: best spacing {:.2} below {:.2}",
                category, choice.nearest_distance, self.config.minimal_spacing
            );
            SpacedSpawn::Declined {
                best_distance: choice.nearest_distance,
            }
        }
    }

    /// Recompute the visibility window and show exactly the objects inside it
    pub fn cull<H>(&mut self, host: &mut H, anchor: Vec2)
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        self.window = VisibilityWindow::around(anchor, self.extent, self.config.visibility_coefficient);
        for obstacle in &mut self.obstacles {
            let visible = self.window.contains(obstacle.record.position);
            if visible != obstacle.active {
                host.set_obstacle_active(&mut obstacle.handle, visible);
                obstacle.active = visible;
            }
        }
    }

    /// Persist the placement list and release every object.
    /// Returns the number of records saved.
    pub fn teardown<H, S>(self, host: &mut H, store: &mut S) -> Result<usize, PlacementError>
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
        S: KeyValueStore + ?Sized,
    {
        let records: Vec<ObstacleRecord> = self.obstacles.iter().map(|o| o.record).collect();
        save_placements(store, &records, self.config.placement_schema)?;
        for obstacle in self.obstacles {
            host.despawn_obstacle(obstacle.handle);
        }
        info!("Saved {} obstacle placements", records.len());
        Ok(records.len())
    }

    /// World-space center of a region
    pub fn region_center(&self, region: GridCoord) -> Vec2 {
        self.region_origin + region.center(self.extent)
    }

    /// Bounding rectangle of a region
    pub fn region_rect(&self, region: GridCoord) -> Rect {
        Rect::from_center(self.region_center(region), self.extent / 2.0)
    }

    /// Objects inside a region, active or not
    pub fn count_in_region(&self, region: GridCoord) -> usize {
        let rect = self.region_rect(region);
        self.obstacles
            .iter()
            .filter(|o| rect.contains(o.record.position))
            .count()
    }

    pub fn active_in_region(&self, region: GridCoord) -> usize {
        let rect = self.region_rect(region);
        self.obstacles
            .iter()
            .filter(|o| o.active && rect.contains(o.record.position))
            .count()
    }

    pub fn is_filled(&self, region: &GridCoord) -> bool {
        self.filled.contains(region)
    }

    pub fn filled_count(&self) -> usize {
        self.filled.len()
    }

    pub fn anchor_region(&self) -> GridCoord {
        self.anchor_region
    }

    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    pub fn window(&self) -> VisibilityWindow {
        self.window
    }

    pub fn table(&self) -> &SpawnTable {
        &self.table
    }

    /// Placement list in insertion order
    pub fn records(&self) -> impl Iterator<Item = &ObstacleRecord> {
        self.obstacles.iter().map(|o| &o.record)
    }

    pub fn obstacles(&self) -> &[Obstacle<O>] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.obstacles.iter().filter(|o| o.active).count()
    }

    /// Count objects inside `rect`, showing any that were hidden
    fn reveal_in<H>(&mut self, host: &mut H, rect: Rect) -> usize
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        let mut count = 0;
        for obstacle in &mut self.obstacles {
            if rect.contains(obstacle.record.position) {
                if !obstacle.active {
                    host.set_obstacle_active(&mut obstacle.handle, true);
                    obstacle.active = true;
                }
                count += 1;
            }
        }
        count
    }

    fn spawn<H>(&mut self, host: &mut H, category: ObstacleCategory, position: Vec2, rotation: f32) -> usize
    where
        H: ObstacleHost<Obstacle = O> + ?Sized,
    {
        let handle = host.spawn_obstacle(category, position, rotation);
        self.obstacles.push(Obstacle {
            record: ObstacleRecord {
                category,
                rotation,
                position,
            },
            active: true,
            handle,
        });
        self.obstacles.len() - 1
    }

    fn random_point(&mut self, rect: Rect) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(rect.min.x..rect.max.x),
            self.rng.gen_range(rect.min.y..rect.max.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamingConfig;
    use crate::host::Viewport;
    use crate::testing::RecordingHost;
    use crate::tile::{AnchorSave, TileStreamer};
    use rally_core::MemoryStore;
    use rand::SeedableRng;

    fn ready(host: &mut RecordingHost, position: Vec2) -> AnchorReady {
        let saved = AnchorSave {
            position,
            ..AnchorSave::default()
        };
        let (_tiles, ready) = TileStreamer::initialize(StreamingConfig::default(), saved, host);
        ready
    }

    fn start_with(config: ObstacleConfig, records: Vec<ObstacleRecord>) -> (ObstacleField<usize>, RecordingHost) {
        let mut host = RecordingHost::default();
        let ready = ready(&mut host, Vec2::ZERO);
        let extent = host.region_extent();
        let field = ObstacleField::start(
            ready,
            config,
            SpawnTable::default(),
            extent,
            records,
            &mut host,
            StdRng::seed_from_u64(7),
        );
        (field, host)
    }

    #[test]
    fn test_start_fills_block_to_cap() {
        let (field, host) = start_with(ObstacleConfig::default(), Vec::new());
        assert_eq!(field.extent(), Vec2::new(40.0, 22.5));
        assert_eq!(field.len(), 450);
        assert_eq!(field.active_count(), 450);
        assert_eq!(host.active_obstacles(), 450);
        for region in GridCoord::ORIGIN.neighborhood() {
            assert!(field.is_filled(&region));
            assert_eq!(field.count_in_region(region), 50);
        }
    }

    #[test]
    fn test_degenerate_extent_uses_fallback() {
        for extent in [Vec2::ZERO, Vec2::new(-40.0, 22.5), Vec2::new(f32::NAN, 1.0)] {
            let mut host = RecordingHost::default();
            let ready = ready(&mut host, Vec2::ZERO);
            let field = ObstacleField::start(
                ready,
                ObstacleConfig::default(),
                SpawnTable::default(),
                extent,
                Vec::new(),
                &mut host,
                StdRng::seed_from_u64(7),
            );
            assert_eq!(field.extent(), FALLBACK_REGION_EXTENT);
            assert_eq!(field.len(), 450);
        }
    }

    #[test]
    fn test_populate_is_idempotent() {
        let (mut field, mut host) = start_with(ObstacleConfig::default(), Vec::new());
        assert_eq!(field.populate(&mut host, GridCoord::ORIGIN), 0);
        assert_eq!(field.len(), 450);
    }

    #[test]
    fn test_crossing_east_fills_only_new_regions() {
        let (mut field, mut host) = start_with(ObstacleConfig::default(), Vec::new());

        let tick = field.tick(&mut host, Vec2::new(20.5, 0.0), 0.0);
        assert_eq!(tick.crossing, Some(Crossing::East));
        assert_eq!(tick.spawned, 150);
        assert_eq!(tick.spaced, SpacedSpawn::NotDue);
        assert_eq!(field.anchor_region(), GridCoord::new(1, 0));
        assert_eq!(field.len(), 600);
        assert_eq!(field.filled_count(), 12);
        for z in -1..=1 {
            assert_eq!(field.count_in_region(GridCoord::new(2, z)), 50);
            assert_eq!(field.count_in_region(GridCoord::new(-1, z)), 50);
        }

        // Heading back west re-enters filled regions only
        let tick = field.tick(&mut host, Vec2::new(0.0, 0.0), 0.0);
        assert_eq!(tick.crossing, Some(Crossing::West));
        assert_eq!(tick.spawned, 0);
        assert_eq!(field.len(), 600);
    }

    #[test]
    fn test_cull_hides_and_restores_without_duplicates() {
        let (mut field, mut host) = start_with(ObstacleConfig::default(), Vec::new());

        field.cull(&mut host, Vec2::new(1000.0, 0.0));
        assert_eq!(field.active_count(), 0);
        assert_eq!(host.active_obstacles(), 0);

        field.cull(&mut host, Vec2::ZERO);
        assert_eq!(field.active_count(), 450);
        assert_eq!(host.active_obstacles(), 450);
        assert_eq!(host.obstacles.len(), 450);

        let window = field.window();
        for obstacle in field.obstacles() {
            assert_eq!(obstacle.active, window.contains(obstacle.record.position));
        }
    }

    #[test]
    fn test_spaced_spawn_waits_for_period() {
        let (mut field, mut host) = start_with(ObstacleConfig::default(), Vec::new());
        assert_eq!(field.maybe_spawn_spaced(&mut host, Vec2::ZERO, 50.0), SpacedSpawn::NotDue);
        assert_eq!(field.len(), 450);
    }

    #[test]
    fn test_spaced_spawns_respect_minimal_spacing() {
        let config = ObstacleConfig {
            max_visible_objects: 0,
            spaced_spawn_period: 1.0,
            minimal_spacing: 3.0,
            ..ObstacleConfig::default()
        };
        let (mut field, mut host) = start_with(config, Vec::new());
        assert!(field.is_empty());

        let mut declined = 0;
        for _ in 0..300 {
            match field.tick(&mut host, Vec2::ZERO, 1.5).spaced {
                SpacedSpawn::Spawned { nearest_distance, .. } => assert!(nearest_distance > 3.0),
                SpacedSpawn::Declined { best_distance } => {
                    assert!(best_distance <= 3.0);
                    declined += 1;
                }
                SpacedSpawn::NotDue => panic!("timer should be due every tick"),
            }
        }
        assert!(declined > 0, "neighborhood never saturated");

        let bushes: Vec<Vec2> = field
            .records()
            .filter(|r| r.category == ObstacleCategory::Bush)
            .map(|r| r.position)
            .collect();
        assert_eq!(bushes.len(), field.len());
        for (i, a) in bushes.iter().enumerate() {
            for b in &bushes[i + 1..] {
                assert!(a.distance(*b) > 3.0);
            }
        }
    }

    #[test]
    fn test_first_spaced_spawn_always_succeeds() {
        let config = ObstacleConfig {
            max_visible_objects: 0,
            ..ObstacleConfig::default()
        };
        let (mut field, mut host) = start_with(config, Vec::new());
        match field.maybe_spawn_spaced(&mut host, Vec2::ZERO, 51.0) {
            SpacedSpawn::Spawned { index, nearest_distance } => {
                assert_eq!(index, 0);
                assert!(nearest_distance.is_infinite());
            }
            other => panic!("expected a spawn, got {other:?}"),
        }
    }

    #[test]
    fn test_restart_restores_placements_in_order() {
        for schema in [PlacementSchema::Keyed, PlacementSchema::Blob] {
            let config = ObstacleConfig {
                placement_schema: schema,
                ..ObstacleConfig::default()
            };
            let (field, mut host) = start_with(config.clone(), Vec::new());
            let before: Vec<ObstacleRecord> = field.records().copied().collect();

            let mut store = MemoryStore::new();
            let saved = field.teardown(&mut host, &mut store).unwrap();
            assert_eq!(saved, 450);
            assert_eq!(host.despawned_obstacles, 450);

            let mut host = RecordingHost::default();
            let ready = ready(&mut host, Vec2::ZERO);
            let extent = host.region_extent();
            let restored = ObstacleField::restore(
                ready,
                config,
                SpawnTable::default(),
                extent,
                &store,
                &mut host,
                StdRng::seed_from_u64(99),
            )
            .unwrap();

            let after: Vec<ObstacleRecord> = restored.records().copied().collect();
            assert_eq!(before, after);
            assert_eq!(host.obstacles.len(), 450);
        }
    }

    #[test]
    fn test_restored_objects_outside_window_start_hidden() {
        let far = ObstacleRecord {
            category: ObstacleCategory::Stone,
            rotation: 12.0,
            position: Vec2::new(500.0, 500.0),
        };
        let (field, host) = start_with(ObstacleConfig::default(), vec![far]);
        assert_eq!(field.len(), 451);
        assert!(!field.obstacles()[0].active);
        assert!(!host.obstacles[0].active);
    }

    #[test]
    fn test_restore_rejects_unknown_category() {
        let mut store = MemoryStore::new();
        store.set_int(placement::SCHEMA_KEY, 1);
        store.set_int(placement::COUNT_KEY, 1);
        store.set_text(&placement::record_key(0, "kind"), "Cactus");
        store.set_float(&placement::record_key(0, "rotation"), 0.0);
        store.set_float(&placement::record_key(0, "x"), 0.0);
        store.set_float(&placement::record_key(0, "y"), 0.0);

        let mut host = RecordingHost::default();
        let ready = ready(&mut host, Vec2::ZERO);
        let result = ObstacleField::<usize>::restore(
            ready,
            ObstacleConfig::default(),
            SpawnTable::default(),
            Vec2::new(40.0, 22.5),
            &store,
            &mut host,
            StdRng::seed_from_u64(1),
        );
        assert!(matches!(result, Err(PlacementError::UnknownCategory { index: 0, .. })));
        assert!(host.obstacles.is_empty());
    }
}
