//! Rally settings loaded from a config file
//!
//! Defaults to `config/rally.json`. A `.toml` file is accepted as well; both
//! are read into the same value tree. Every field falls back on its own, so
//! one bad value never discards the rest of the file.

use std::fs;
use std::path::Path;

use rally_world::{ObstacleCategory, ObstacleConfig, SpawnTable, SpawnWeights};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/rally.json";

const MIN_TANK_VELOCITY: f32 = 0.01;
const MAX_TANK_VELOCITY: f32 = 9.0;

/// Everything read from the config file
#[derive(Debug, Clone, Default)]
pub struct RallySettings {
    pub obstacles: ObstacleConfig,
    pub table: SpawnTable,
    pub tank: TankConfig,
    pub camera: CameraSettings,
}

/// Anchor controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankConfig {
    /// Distance moved per tick
    pub velocity: f32,
    /// Degrees turned per tick
    pub angular_velocity: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            velocity: 0.1,
            angular_velocity: 1.0,
        }
    }
}

/// Headless camera the viewport query is answered from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub screen_width: u32,
    pub screen_height: u32,
    /// World-space width the camera covers
    pub world_width: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            screen_width: 1600,
            screen_height: 900,
            world_width: 40.0,
        }
    }
}

impl RallySettings {
    /// Load settings from `path`, or return defaults if it is missing or
    /// cannot be parsed
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read config {:?}: {}, using defaults", path, e);
                return Self::default();
            }
        };
        let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
        let parsed: Result<Value, String> = if is_toml {
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };

        match parsed {
            Ok(root) => {
                info!("Loaded config from {:?}", path);
                Self::from_value(&root)
            }
            Err(e) => {
                warn!("Failed to parse config {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Read each field independently, substituting its default on failure
    pub fn from_value(root: &Value) -> Self {
        let defaults = ObstacleConfig::default();
        let obstacles = ObstacleConfig {
            max_visible_objects: read_u32(root, "MaxVisibleObjects", defaults.max_visible_objects),
            spaced_spawn_period: read_f32(root, "BushSpawnPeriod", defaults.spaced_spawn_period),
            minimal_spacing: read_f32(root, "MinimalBushDistance", defaults.minimal_spacing),
            ..defaults
        };

        let tank_defaults = TankConfig::default();
        let velocity = read_f32(root, "TankVelocity", tank_defaults.velocity);
        let tank = TankConfig {
            velocity: velocity.clamp(MIN_TANK_VELOCITY, MAX_TANK_VELOCITY),
            angular_velocity: read_f32(root, "TankAngularVelocity", tank_defaults.angular_velocity),
        };

        let camera = match root.get("Camera") {
            Some(camera) => {
                let defaults = CameraSettings::default();
                CameraSettings {
                    screen_width: read_positive_u32(camera, "ScreenWidth", defaults.screen_width),
                    screen_height: read_positive_u32(camera, "ScreenHeight", defaults.screen_height),
                    world_width: read_positive_f32(camera, "WorldWidth", defaults.world_width),
                }
            }
            None => CameraSettings::default(),
        };

        Self {
            obstacles,
            table: read_table(root),
            tank,
            camera,
        }
    }
}

fn read_table(root: &Value) -> SpawnTable {
    let Some(possibilities) = root.get("Possibilities") else {
        warn!("Possibilities missing from config, using default weights");
        return SpawnTable::default();
    };

    let defaults = SpawnWeights::default();
    let mut weights = SpawnWeights::default();
    for category in ObstacleCategory::ALL {
        weights.set(category, read_f32(possibilities, category.name(), defaults.get(category)));
    }

    match SpawnTable::new(weights) {
        Ok(table) => table,
        Err(e) => {
            warn!("Invalid weight table: {}, using default weights", e);
            SpawnTable::default()
        }
    }
}

fn read_f32(object: &Value, key: &str, fallback: f32) -> f32 {
    match object.get(key).and_then(number) {
        Some(value) if value.is_finite() => value as f32,
        _ => {
            warn!("{} parse failed, using {}", key, fallback);
            fallback
        }
    }
}

fn read_u32(object: &Value, key: &str, fallback: u32) -> u32 {
    match object.get(key).and_then(number) {
        Some(value) if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 => {
            value.round() as u32
        }
        _ => {
            warn!("{} parse failed, using {}", key, fallback);
            fallback
        }
    }
}

/// Camera dimensions must be strictly positive to give a usable region
fn read_positive_f32(object: &Value, key: &str, fallback: f32) -> f32 {
    match read_f32(object, key, fallback) {
        value if value > 0.0 => value,
        value => {
            warn!("{} must be positive, got {}, using {}", key, value, fallback);
            fallback
        }
    }
}

fn read_positive_u32(object: &Value, key: &str, fallback: u32) -> u32 {
    match read_u32(object, key, fallback) {
        0 => {
            warn!("{} must be positive, using {}", key, fallback);
            fallback
        }
        value => value,
    }
}

/// Numbers may also arrive as strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
