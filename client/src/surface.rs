//! The presentation and input surface the frame loop draws through

use crate::input::HeldKeys;
use shared::Vec2;

/// Half-extent of the camera at zoom 1, a 16:9 window onto the canvas
const VIEW_HALF_WIDTH: f32 = 16.0;
const VIEW_HALF_HEIGHT: f32 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    CloseRequested,
    /// Primary click, already mapped into canvas coordinates
    Click(Vec2),
    RemoveLastWall,
    ClearWalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    Wall,
    WallAnchor,
    LocalEntity,
    RemoteEntity,
    Particle,
}

/// Overlay statistics drawn in screen space
#[derive(Debug, Clone, PartialEq)]
pub struct HudStats {
    pub fps: f32,
    pub remote_entities: usize,
    pub walls: usize,
    pub label: String,
}

/// Rectangle of the canvas shown on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Vec2,
    pub half_extent: Vec2,
}

impl Viewport {
    /// A camera centred on `target`, `scale` times the base 32×18 window
    pub fn follow(target: Vec2, scale: f32) -> Self {
        Self {
            center: target,
            half_extent: Vec2::new(VIEW_HALF_WIDTH * scale, VIEW_HALF_HEIGHT * scale),
        }
    }

    /// A camera showing the entire canvas
    pub fn whole(width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(width / 2.0, height / 2.0),
            half_extent: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.half_extent.x
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half_extent.y
    }

    pub fn width(&self) -> f32 {
        self.half_extent.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_extent.y * 2.0
    }
}

pub trait Surface {
    /// Movement keys held right now
    fn held_keys(&self) -> HeldKeys;

    fn poll_event(&mut self) -> Option<SurfaceEvent>;

    /// Seconds elapsed since the previous frame
    fn frame_time(&self) -> f32;

    fn set_viewport(&mut self, viewport: &Viewport);

    fn draw_polyline(&mut self, points: &[Vec2], style: DrawStyle);

    fn draw_circle(&mut self, center: Vec2, radius: f32, style: DrawStyle);

    fn draw_hud(&mut self, hud: &HudStats);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_viewport_bounds() {
        let viewport = Viewport::follow(Vec2::new(640.0, 360.0), 5.0);

        assert_eq!(viewport.left(), 560.0);
        assert_eq!(viewport.top(), 315.0);
        assert_eq!(viewport.width(), 160.0);
        assert_eq!(viewport.height(), 90.0);
    }

    #[test]
    fn test_whole_viewport() {
        let viewport = Viewport::whole(1280.0, 720.0);
        assert_eq!(viewport.left(), 0.0);
        assert_eq!(viewport.top(), 0.0);
        assert_eq!(viewport.width(), 1280.0);
    }
}
