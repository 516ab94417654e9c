//! Closed set of scenery categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of scenery object the population engine spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObstacleCategory {
    Tree,
    Bush,
    Puddle,
    Stone,
}

impl ObstacleCategory {
    /// Every category, in weight-walk order
    pub const ALL: [ObstacleCategory; 4] = [
        ObstacleCategory::Tree,
        ObstacleCategory::Bush,
        ObstacleCategory::Puddle,
        ObstacleCategory::Stone,
    ];

    /// Symbolic name used in saves and config files
    pub fn name(self) -> &'static str {
        match self {
            ObstacleCategory::Tree => "Tree",
            ObstacleCategory::Bush => "Bush",
            ObstacleCategory::Puddle => "Puddle",
            ObstacleCategory::Stone => "Stone",
        }
    }
}

impl fmt::Display for ObstacleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A persisted name did not match any category
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown obstacle category '{0}'")]
pub struct ParseCategoryError(pub String);

impl FromStr for ObstacleCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObstacleCategory::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}
