//! Wall obstacles, canvas bounds and the point-vs-wall blocking test

use crate::geometry::{closest_point_on_segment, Vec2};
use crate::ENTITY_RADIUS;

/// An immutable polyline obstacle. Every consecutive pair of points is a rigid segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    points: Vec<Vec2>,
}

impl Wall {
    /// Builds a wall from at least two points
    pub fn new(points: Vec<Vec2>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    /// A single-segment wall, as produced by the two-click drawing gesture
    pub fn segment(start: Vec2, end: Vec2) -> Self {
        Self {
            points: vec![start, end],
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// The playable rectangle `[0, width) × [0, height)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Vec2) -> bool {
        position.x >= 0.0 && position.x < self.width && position.y >= 0.0 && position.y < self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Decides whether an entity may occupy `candidate`.
///
/// Each wall segment is shifted by the entity radius along both axes and the
/// candidate is blocked when it lies closer than one radius to the shifted
/// segment. This approximates circle-vs-segment contact; it is not a true
/// Minkowski sum. Positions outside the canvas are always blocked.
pub fn is_blocked(candidate: Vec2, walls: &[Wall], canvas: Canvas) -> bool {
    let bias = Vec2::new(ENTITY_RADIUS, ENTITY_RADIUS);

    let hits_wall = walls.iter().any(|wall| {
        wall.segments().any(|(start, end)| {
            let closest = closest_point_on_segment(candidate, start + bias, end + bias);
            candidate.distance(closest) < ENTITY_RADIUS
        })
    });

    hits_wall || !canvas.contains(candidate)
}
