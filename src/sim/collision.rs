//! Point and wall tests for circular targets
//!
//! The play field is the unit square; targets are circles that bounce off
//! its edges.

use glam::Vec2;

use crate::consts::FIELD_SIZE;

/// Result of a wall check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Surface normal at collision (pointing back into the field)
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Whether `point` lies on or inside the circle
#[inline]
pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    point.distance_squared(center) <= radius * radius
}

/// Check a circle against the field edges.
///
/// Reports the deepest single-axis overlap; corners resolve over two ticks.
pub fn circle_wall_collision(pos: Vec2, radius: f32) -> CollisionResult {
    let candidates = [
        (radius - pos.x, Vec2::X),
        (pos.x + radius - FIELD_SIZE, Vec2::NEG_X),
        (radius - pos.y, Vec2::Y),
        (pos.y + radius - FIELD_SIZE, Vec2::NEG_Y),
    ];

    let mut best = CollisionResult::miss();
    for (penetration, normal) in candidates {
        if penetration > 0.0 && penetration > best.penetration {
            best = CollisionResult {
                hit: true,
                normal,
                penetration,
            };
        }
    }
    best
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_circle() {
        let center = Vec2::new(0.5, 0.5);
        assert!(point_in_circle(Vec2::new(0.5, 0.5), center, 0.05));
        assert!(point_in_circle(Vec2::new(0.54, 0.5), center, 0.05));
        assert!(!point_in_circle(Vec2::new(0.56, 0.5), center, 0.05));
    }

    #[test]
    fn test_wall_collision() {
        // Inside - no collision
        assert!(!circle_wall_collision(Vec2::new(0.5, 0.5), 0.05).hit);

        // Poking through the left edge
        let result = circle_wall_collision(Vec2::new(0.02, 0.5), 0.05);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::X);
        assert!((result.penetration - 0.03).abs() < 1e-6);

        // Top edge
        let result = circle_wall_collision(Vec2::new(0.5, 0.99), 0.05);
        assert_eq!(result.normal, Vec2::NEG_Y);
    }

    #[test]
    fn test_reflect_velocity() {
        // Moving left, hits left wall (normal pointing right)
        let reflected = reflect_velocity(Vec2::new(-1.0, 0.5), Vec2::X);
        assert!((reflected.x - 1.0).abs() < 1e-6);
        assert!((reflected.y - 0.5).abs() < 1e-6);
    }
}
