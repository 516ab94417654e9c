//! Weighted category selection
//!
//! A uniform draw over `[0, total)` is walked against the running sum of the
//! weights; the first category whose cumulative weight exceeds the draw wins.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::category::ObstacleCategory;

/// Per-category spawn weights as configured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpawnWeights {
    pub tree: f32,
    pub bush: f32,
    pub puddle: f32,
    pub stone: f32,
}

impl Default for SpawnWeights {
    fn default() -> Self {
        Self {
            tree: 10.0,
            bush: 30.0,
            puddle: 10.0,
            stone: 50.0,
        }
    }
}

impl SpawnWeights {
    pub fn get(&self, category: ObstacleCategory) -> f32 {
        match category {
            ObstacleCategory::Tree => self.tree,
            ObstacleCategory::Bush => self.bush,
            ObstacleCategory::Puddle => self.puddle,
            ObstacleCategory::Stone => self.stone,
        }
    }

    pub fn set(&mut self, category: ObstacleCategory, weight: f32) {
        match category {
            ObstacleCategory::Tree => self.tree = weight,
            ObstacleCategory::Bush => self.bush = weight,
            ObstacleCategory::Puddle => self.puddle = weight,
            ObstacleCategory::Stone => self.stone = weight,
        }
    }

    pub fn total(&self) -> f32 {
        ObstacleCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Reasons a weight table cannot drive selection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("weight for {category} is negative ({weight})")]
    Negative {
        category: ObstacleCategory,
        weight: f32,
    },

    #[error("weight for {0} is not a finite number")]
    NotFinite(ObstacleCategory),

    #[error("weights sum to zero, no category can be selected")]
    ZeroTotal,
}

/// Validated, immutable weight table
///
/// Construction guarantees every draw selects a category.
#[derive(Debug, Clone)]
pub struct SpawnTable {
    weights: SpawnWeights,
    total: f32,
}

impl SpawnTable {
    pub fn new(weights: SpawnWeights) -> Result<Self, WeightError> {
        for category in ObstacleCategory::ALL {
            let weight = weights.get(category);
            if !weight.is_finite() {
                return Err(WeightError::NotFinite(category));
            }
            if weight < 0.0 {
                return Err(WeightError::Negative { category, weight });
            }
        }
        let total = weights.total();
        if total <= 0.0 || !total.is_finite() {
            return Err(WeightError::ZeroTotal);
        }
        Ok(Self { weights, total })
    }

    pub fn weights(&self) -> SpawnWeights {
        self.weights
    }

    /// Upper bound of the draw range
    pub fn total(&self) -> f32 {
        self.total
    }

    /// Expected share of draws landing on `category`
    pub fn probability(&self, category: ObstacleCategory) -> f32 {
        self.weights.get(category) / self.total
    }

    /// Category selected by a draw in `[0, total)`
    pub fn select(&self, draw: f32) -> ObstacleCategory {
        let mut cumulative = 0.0;
        let mut last_positive = ObstacleCategory::Stone;
        for category in ObstacleCategory::ALL {
            let weight = self.weights.get(category);
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_positive = category;
            if draw < cumulative {
                return category;
            }
        }
        // Only reachable through float rounding at the top of the range
        last_positive
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> ObstacleCategory {
        let draw = rng.gen_range(0.0..self.total);
        self.select(draw)
    }
}

impl Default for SpawnTable {
    fn default() -> Self {
        let weights = SpawnWeights::default();
        Self {
            total: weights.total(),
            weights,
        }
    }
}
