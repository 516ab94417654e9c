//! Rally Core - Core types and utilities for the Rally engine
//!
//! This crate provides the foundational types shared by the streaming subsystems:
//! - Ground-plane math (re-exported from glam)
//! - Anchor pose, integer grid cells, and rectangles
//! - Game time and periodic timers
//! - The key-value persistence interface

pub mod store;
pub mod time;
pub mod types;

pub use glam::Vec2;
pub use store::{KeyValueStore, MemoryStore, StoredValue, ValueKind, ValueTypeError};
pub use time::{GameTime, PeriodicTimer, TimeConfig};
pub use types::{normalize_heading, Crossing, GridCoord, Pose, Rect};
