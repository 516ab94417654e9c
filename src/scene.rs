//! Headless scene host
//!
//! Stands in for a renderer: keeps lightweight scene nodes for tiles and
//! scenery and counts what is live and active, so a run can be inspected
//! without a window.

use std::collections::BTreeMap;

use glam::Vec2;
use rally_core::GridCoord;
use rally_world::{ObstacleCategory, ObstacleHost, PrefabTable, TileHost, Viewport};

use crate::settings::CameraSettings;

/// Scene node for one terrain tile
#[derive(Debug, Clone, PartialEq)]
pub struct TileNode {
    pub coord: GridCoord,
    pub center: Vec2,
    pub visible: bool,
}

/// Scene node for one scenery object
#[derive(Debug, Clone, PartialEq)]
pub struct PropNode {
    pub category: ObstacleCategory,
    pub model: &'static str,
    /// Collision radius
    pub radius: f32,
    pub position: Vec2,
    pub rotation: f32,
    pub visible: bool,
}

fn tree(position: Vec2, rotation: f32) -> PropNode {
    prop(ObstacleCategory::Tree, "tree", 0.6, position, rotation)
}

fn bush(position: Vec2, rotation: f32) -> PropNode {
    prop(ObstacleCategory::Bush, "bush", 0.8, position, rotation)
}

fn puddle(position: Vec2, rotation: f32) -> PropNode {
    prop(ObstacleCategory::Puddle, "puddle", 1.2, position, rotation)
}

fn stone(position: Vec2, rotation: f32) -> PropNode {
    prop(ObstacleCategory::Stone, "stone", 0.5, position, rotation)
}

fn prop(
    category: ObstacleCategory,
    model: &'static str,
    radius: f32,
    position: Vec2,
    rotation: f32,
) -> PropNode {
    PropNode {
        category,
        model,
        radius,
        position,
        rotation,
        visible: true,
    }
}

pub fn default_prefabs() -> PrefabTable<PropNode> {
    PrefabTable {
        tree,
        bush,
        puddle,
        stone,
    }
}

/// Live and visible node counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCount {
    pub live: usize,
    pub visible: usize,
}

pub struct HeadlessScene {
    camera: CameraSettings,
    prefabs: PrefabTable<PropNode>,
    tiles: NodeCount,
    props: BTreeMap<ObstacleCategory, NodeCount>,
}

impl HeadlessScene {
    pub fn new(camera: CameraSettings) -> Self {
        Self {
            camera,
            prefabs: default_prefabs(),
            tiles: NodeCount::default(),
            props: BTreeMap::new(),
        }
    }

    pub fn tile_count(&self) -> NodeCount {
        self.tiles
    }

    pub fn prop_count(&self, category: ObstacleCategory) -> NodeCount {
        self.props.get(&category).copied().unwrap_or_default()
    }

    pub fn total_props(&self) -> NodeCount {
        self.props.values().fold(NodeCount::default(), |acc, c| NodeCount {
            live: acc.live + c.live,
            visible: acc.visible + c.visible,
        })
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        let props = ObstacleCategory::ALL
            .into_iter()
            .map(|category| {
                let count = self.prop_count(category);
                format!("{} {}/{}", category, count.visible, count.live)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let tiles = self.tile_count();
        format!("tiles {}/{}, props [{}]", tiles.visible, tiles.live, props)
    }
}

fn toggle(count: &mut NodeCount, visible: &mut bool, active: bool) {
    if *visible == active {
        return;
    }
    *visible = active;
    if active {
        count.visible += 1;
    } else {
        count.visible -= 1;
    }
}

impl TileHost for HeadlessScene {
    type Tile = TileNode;

    fn spawn_tile(&mut self, coord: GridCoord, center: Vec2) -> TileNode {
        self.tiles.live += 1;
        self.tiles.visible += 1;
        TileNode {
            coord,
            center,
            visible: true,
        }
    }

    fn set_tile_active(&mut self, tile: &mut TileNode, active: bool) {
        toggle(&mut self.tiles, &mut tile.visible, active);
    }

    fn despawn_tile(&mut self, tile: TileNode) {
        self.tiles.live -= 1;
        if tile.visible {
            self.tiles.visible -= 1;
        }
    }
}

impl ObstacleHost for HeadlessScene {
    type Obstacle = PropNode;

    fn spawn_obstacle(&mut self, category: ObstacleCategory, position: Vec2, rotation: f32) -> PropNode {
        let count = self.props.entry(category).or_default();
        count.live += 1;
        count.visible += 1;
        self.prefabs.instantiate(category, position, rotation)
    }

    fn set_obstacle_active(&mut self, obstacle: &mut PropNode, active: bool) {
        let count = self.props.entry(obstacle.category).or_default();
        toggle(count, &mut obstacle.visible, active);
    }

    fn despawn_obstacle(&mut self, obstacle: PropNode) {
        let count = self.props.entry(obstacle.category).or_default();
        count.live -= 1;
        if obstacle.visible {
            count.visible -= 1;
        }
    }
}

impl Viewport for HeadlessScene {
    fn screen_size(&self) -> (u32, u32) {
        (self.camera.screen_width, self.camera.screen_height)
    }

    fn world_width(&self) -> f32 {
        self.camera.world_width
    }
}
