//! Free-flying particles that bounce off the canvas edges and wall segments

use crate::collision::{Canvas, Wall};
use crate::geometry::{collision_point, reflect, reflection_normal, segments_intersect, Vec2};

/// Lowest speed handed out by [`spawn_speed_ramp`]
pub const MIN_SPAWN_SPEED: f32 = 50.0;
/// Speed range covered by [`spawn_speed_ramp`]
pub const SPAWN_SPEED_RANGE: f32 = 450.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Set for the step after a wall bounce so the particle can leave the wall
    collided: bool,
}

impl Particle {
    /// Creates a particle moving at `speed` along `angle` (radians)
    pub fn new(position: Vec2, speed: f32, angle: f32) -> Self {
        Self {
            position,
            velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
            collided: false,
        }
    }

    /// Advances the particle by `dt` seconds
    pub fn update(&mut self, dt: f32, canvas: Canvas, walls: &[Wall]) {
        let mut next = self.position + self.velocity * dt;

        if next.x < 0.0 || next.x > canvas.width {
            self.velocity.x = -self.velocity.x;
            next.x = next.x.clamp(0.0, canvas.width);
        }
        if next.y < 0.0 || next.y > canvas.height {
            self.velocity.y = -self.velocity.y;
            next.y = next.y.clamp(0.0, canvas.height);
        }

        if self.collided {
            self.collided = false;
        } else {
            let from = self.position;
            let hit = walls
                .iter()
                .flat_map(|wall| wall.segments())
                .find(|&(start, end)| segments_intersect(from, next, start, end));

            if let Some((start, end)) = hit {
                self.collided = true;
                self.velocity = reflect(self.velocity, reflection_normal(start, end));
                next = collision_point(from, next, start, end);
            }
        }

        self.position = next;
    }
}

/// `count` particles spaced evenly from `start` to `end`, all sharing one heading
pub fn spawn_along_line(start: Vec2, end: Vec2, count: usize, speed: f32, angle: f32) -> Vec<Particle> {
    (0..count)
        .map(|i| {
            let t = if count > 1 {
                i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            Particle::new(start.lerp(end, t), speed, angle)
        })
        .collect()
}

/// `count` particles from one origin with headings spread evenly between two angles
pub fn spawn_fan(origin: Vec2, start_angle: f32, end_angle: f32, count: usize, speed: f32) -> Vec<Particle> {
    let increment = if count > 1 {
        (end_angle - start_angle) / (count - 1) as f32
    } else {
        0.0
    };

    (0..count)
        .map(|i| Particle::new(origin, speed, start_angle + i as f32 * increment))
        .collect()
}

/// `count` particles from one origin sharing a heading, with speeds rising from [`MIN_SPAWN_SPEED`]
pub fn spawn_speed_ramp(origin: Vec2, angle: f32, count: usize) -> Vec<Particle> {
    if count == 0 {
        return Vec::new();
    }

    let increment = SPAWN_SPEED_RANGE / count as f32;
    (0..count)
        .map(|i| Particle::new(origin, MIN_SPAWN_SPEED + i as f32 * increment, angle))
        .collect()
}
