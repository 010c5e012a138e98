//! Planar geometry helpers shared by the collision resolver and the particle simulation

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point or direction in canvas space. Positive y points down the screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalize_or_zero(self) -> Vec2 {
        let length = self.length();
        if length == 0.0 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / length, self.y / length)
        }
    }

    /// Rotates the vector by 90 degrees: `(x, y) -> (-y, x)`
    pub fn perpendicular(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    /// Point `t` of the way from `self` towards `other`
    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Vec2::new(x, y)
    }
}

/// Projects `point` onto the segment and clamps the projection to its endpoints.
///
/// A zero-length segment has no direction to project on, so its start is returned.
pub fn closest_point_on_segment(point: Vec2, start: Vec2, end: Vec2) -> Vec2 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared == 0.0 {
        return start;
    }

    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    start + segment * t
}

/// Solves for the intersection parameters of segments `p1→p2` and `q1→q2`.
///
/// Returns `(s, t)` where `s` runs along `q` and `t` along `p`, or `None` when
/// the segments are parallel (including when either has zero length).
fn intersection_parameters(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<(f32, f32)> {
    let d1 = p2 - p1;
    let d2 = q2 - q1;

    let denominator = -d2.x * d1.y + d1.x * d2.y;
    if denominator == 0.0 {
        return None;
    }

    let s = (-d1.y * (p1.x - q1.x) + d1.x * (p1.y - q1.y)) / denominator;
    let t = (d2.x * (p1.y - q1.y) - d2.y * (p1.x - q1.x)) / denominator;
    Some((s, t))
}

/// True when segment `p1→p2` crosses segment `q1→q2`, endpoints included.
/// Parallel segments never intersect.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    match intersection_parameters(p1, p2, q1, q2) {
        Some((s, t)) => (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t),
        None => false,
    }
}

/// Where the path `from→to` meets the wall segment, or `to` if it never does
pub fn collision_point(from: Vec2, to: Vec2, wall_start: Vec2, wall_end: Vec2) -> Vec2 {
    match intersection_parameters(from, to, wall_start, wall_end) {
        Some((s, t)) if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) => from.lerp(to, t),
        _ => to,
    }
}

/// Unit normal of the segment (its direction rotated 90 degrees).
/// Zero-length segments yield the zero vector.
pub fn reflection_normal(p1: Vec2, p2: Vec2) -> Vec2 {
    (p2 - p1).perpendicular().normalize_or_zero()
}

/// Mirrors `velocity` about the line with unit normal `normal`
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - normal * (2.0 * velocity.dot(normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_closest_point_projects_inside_segment() {
        let closest =
            closest_point_on_segment(Vec2::new(5.0, 3.0), Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(closest, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_closest_point_clamps_to_endpoints() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(Vec2::new(-4.0, 2.0), start, end), start);
        assert_eq!(closest_point_on_segment(Vec2::new(25.0, -1.0), start, end), end);
    }

    #[test]
    fn test_closest_point_zero_length_segment() {
        let anchor = Vec2::new(3.0, 4.0);
        let closest = closest_point_on_segment(Vec2::new(100.0, -7.0), anchor, anchor);
        assert_eq!(closest, anchor);
        assert!(!closest.x.is_nan() && !closest.y.is_nan());
    }

    #[test]
    fn test_closest_point_is_no_farther_than_endpoints() {
        let start = Vec2::new(-3.0, 2.0);
        let end = Vec2::new(7.0, 9.0);
        let segment = end - start;

        for i in 0..20 {
            for j in 0..20 {
                let point = Vec2::new(i as f32 * 1.7 - 12.0, j as f32 * 1.3 - 8.0);
                let closest = closest_point_on_segment(point, start, end);

                let t = (closest - start).dot(segment) / segment.length_squared();
                assert!((-1e-5..=1.0 + 1e-5).contains(&t));

                let distance = point.distance(closest);
                assert!(distance <= point.distance(start) + 1e-4);
                assert!(distance <= point.distance(end) + 1e-4);
            }
        }
    }

    #[test]
    fn test_segments_intersect_crossing() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
        ));
    }

    #[test]
    fn test_segments_intersect_disjoint() {
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(6.0, -3.0),
        ));
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        ));
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 5.0),
            Vec2::new(10.0, 5.0),
        ));
    }

    #[test]
    fn test_collision_point() {
        let hit = collision_point(
            Vec2::new(5.0, -5.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );
        assert_approx_eq!(hit.x, 5.0, 1e-5);
        assert_approx_eq!(hit.y, 0.0, 1e-5);

        let miss_end = Vec2::new(5.0, -1.0);
        let miss = collision_point(
            Vec2::new(5.0, -5.0),
            miss_end,
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );
        assert_eq!(miss, miss_end);
    }

    #[test]
    fn test_reflection_normal_is_unit_and_perpendicular() {
        let p1 = Vec2::new(1.0, 1.0);
        let p2 = Vec2::new(4.0, 5.0);
        let normal = reflection_normal(p1, p2);

        assert_approx_eq!(normal.length(), 1.0, 1e-6);
        assert_approx_eq!(normal.dot(p2 - p1), 0.0, 1e-6);
    }

    #[test]
    fn test_reflection_normal_zero_length_segment() {
        let p = Vec2::new(2.0, 2.0);
        assert_eq!(reflection_normal(p, p), Vec2::ZERO);
    }

    #[test]
    fn test_reflect_off_horizontal_wall() {
        let normal = reflection_normal(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let reflected = reflect(Vec2::new(3.0, 4.0), normal);
        assert_approx_eq!(reflected.x, 3.0, 1e-6);
        assert_approx_eq!(reflected.y, -4.0, 1e-6);
    }
}
