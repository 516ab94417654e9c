//! Visibility window used to cull obstacles every tick

use glam::Vec2;
use rally_core::Rect;

/// Rectangle around the anchor inside which obstacles stay active
///
/// The half-extent is the region extent scaled by a coefficient above 1, so
/// objects stay live slightly past the viewport edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityWindow {
    rect: Rect,
}

impl VisibilityWindow {
    pub fn around(anchor: Vec2, extent: Vec2, coefficient: f32) -> Self {
        Self {
            rect: Rect::from_center(anchor, extent * coefficient),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.rect.contains(point)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }
}
