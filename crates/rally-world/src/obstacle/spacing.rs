//! Farthest-point candidate selection
//!
//! Scores every candidate by the distance to its nearest existing neighbor
//! and keeps the best one. This is a greedy approximation over a handful of
//! random candidates, not an exact farthest-point search.

use glam::Vec2;

/// Winning candidate and its distance to the nearest existing point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacingChoice {
    pub position: Vec2,
    pub nearest_distance: f32,
}

/// Distance from `point` to the closest of `existing`; infinite when empty
pub fn nearest_distance(point: Vec2, existing: &[Vec2]) -> f32 {
    existing
        .iter()
        .map(|other| point.distance(*other))
        .fold(f32::INFINITY, f32::min)
}

/// Candidate with the largest nearest-neighbor distance; ties keep the first
pub fn farthest_candidate(candidates: &[Vec2], existing: &[Vec2]) -> Option<SpacingChoice> {
    let mut best: Option<SpacingChoice> = None;
    for candidate in candidates {
        let distance = nearest_distance(*candidate, existing);
        match best {
            Some(current) if distance <= current.nearest_distance => {}
            _ => {
                best = Some(SpacingChoice {
                    position: *candidate,
                    nearest_distance: distance,
                })
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_candidate_farthest_from_cluster() {
        let existing = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let candidates = [Vec2::new(0.5, 0.5), Vec2::new(5.0, 5.0), Vec2::new(2.0, 0.0)];
        let choice = farthest_candidate(&candidates, &existing).unwrap();
        assert_eq!(choice.position, Vec2::new(5.0, 5.0));
        let expected = Vec2::new(5.0, 5.0).distance(Vec2::new(1.0, 0.0));
        assert!((choice.nearest_distance - expected).abs() < 1e-5);
    }

    #[test]
    fn test_no_existing_points_means_unbounded_spacing() {
        let candidates = [Vec2::new(3.0, 1.0), Vec2::new(-2.0, 4.0)];
        let choice = farthest_candidate(&candidates, &[]).unwrap();
        assert_eq!(choice.position, candidates[0]);
        assert!(choice.nearest_distance.is_infinite());
    }

    #[test]
    fn test_no_candidates() {
        assert!(farthest_candidate(&[], &[Vec2::ZERO]).is_none());
    }
}
