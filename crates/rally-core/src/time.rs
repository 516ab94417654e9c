//! Time system for the Rally engine
//!
//! Tracks session time for the tick loop and drives periodic work such as
//! spaced obstacle spawns.

use serde::{Deserialize, Serialize};

/// Configuration for game time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// How many in-game seconds pass per real second
    pub time_scale: f32,
    /// Maximum delta time accepted for a single tick
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: 0.25,
        }
    }
}

/// Game time tracking
#[derive(Debug, Clone, Default)]
pub struct GameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Time since session start in seconds
    pub total_time: f64,
    /// Delta time for this tick (clamped and scaled)
    pub delta_time: f32,
    /// Tick counter
    pub frame_count: u64,
}

impl GameTime {
    /// Create a new game time with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance by the raw delta since the previous tick
    pub fn update(&mut self, raw_delta: f32) {
        self.frame_count += 1;
        self.delta_time = raw_delta.clamp(0.0, self.config.max_delta_time) * self.config.time_scale;
        self.total_time += self.delta_time as f64;
    }
}

/// Fires once every time accumulated time strictly exceeds the period
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    period: f32,
    elapsed: f32,
}

impl PeriodicTimer {
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    /// Time accumulated since the timer last fired
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Accumulate `delta`; returns true and restarts when the period is exceeded
    pub fn tick(&mut self, delta: f32) -> bool {
        self.elapsed += delta.max(0.0);
        if self.elapsed > self.period {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Accumulate `delta` without firing; the caller decides when to reset
    pub fn accumulate(&mut self, delta: f32) -> f32 {
        self.elapsed += delta.max(0.0);
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
