use crate::input::{Direction, HeldKeys};
use crate::surface::{DrawStyle, HudStats, Surface, SurfaceEvent, Viewport};
use macroquad::prelude::*;
use shared::Vec2;
use std::collections::VecDeque;

const WALL_THICKNESS: f32 = 1.0;

/// Macroquad-backed surface. Must only be used from the thread running the
/// macroquad event loop.
pub struct MacroquadSurface {
    events: VecDeque<SurfaceEvent>,
    camera: Camera2D,
}

impl MacroquadSurface {
    pub fn new() -> Self {
        prevent_quit();
        Self {
            events: VecDeque::new(),
            camera: camera_for(&Viewport::whole(screen_width(), screen_height())),
        }
    }

    /// Gathers this frame's window events and clears the backbuffer
    pub fn begin_frame(&mut self) {
        if is_quit_requested() {
            self.events.push_back(SurfaceEvent::CloseRequested);
        }

        if is_mouse_button_pressed(MouseButton::Left) {
            self.events.push_back(SurfaceEvent::Click(self.pointer()));
        }

        if is_key_pressed(KeyCode::Backspace) {
            self.events.push_back(SurfaceEvent::RemoveLastWall);
        }
        if is_key_pressed(KeyCode::Delete) {
            self.events.push_back(SurfaceEvent::ClearWalls);
        }

        clear_background(BLACK);
    }

    /// Mouse position in canvas coordinates under the current camera
    pub fn pointer(&self) -> Vec2 {
        let (x, y) = mouse_position();
        let world = self.camera.screen_to_world(vec2(x, y));
        Vec2::new(world.x, world.y)
    }
}

impl Default for MacroquadSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn camera_for(viewport: &Viewport) -> Camera2D {
    Camera2D {
        target: vec2(viewport.center.x, viewport.center.y),
        zoom: vec2(2.0 / viewport.width(), 2.0 / viewport.height()),
        ..Default::default()
    }
}

fn color_of(style: DrawStyle) -> Color {
    match style {
        DrawStyle::Wall => WHITE,
        DrawStyle::WallAnchor => YELLOW,
        DrawStyle::LocalEntity => RED,
        DrawStyle::RemoteEntity | DrawStyle::Particle => GREEN,
    }
}

impl Surface for MacroquadSurface {
    fn held_keys(&self) -> HeldKeys {
        [
            (KeyCode::W, Direction::Up),
            (KeyCode::A, Direction::Left),
            (KeyCode::S, Direction::Down),
            (KeyCode::D, Direction::Right),
        ]
        .into_iter()
        .filter(|(key, _)| is_key_down(*key))
        .map(|(_, direction)| direction)
        .collect()
    }

    fn poll_event(&mut self) -> Option<SurfaceEvent> {
        self.events.pop_front()
    }

    fn frame_time(&self) -> f32 {
        get_frame_time()
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.camera = camera_for(viewport);
        set_camera(&self.camera);
    }

    fn draw_polyline(&mut self, points: &[Vec2], style: DrawStyle) {
        let color = color_of(style);
        for pair in points.windows(2) {
            draw_line(
                pair[0].x,
                pair[0].y,
                pair[1].x,
                pair[1].y,
                WALL_THICKNESS,
                color,
            );
        }
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, style: DrawStyle) {
        macroquad::shapes::draw_circle(center.x, center.y, radius, color_of(style));
    }

    fn draw_hud(&mut self, hud: &HudStats) {
        set_default_camera();

        draw_text(&format!("FPS: {:.1}", hud.fps), 10.0, 20.0, 20.0, WHITE);
        draw_text(&hud.label, 10.0, 40.0, 16.0, WHITE);
        draw_text(
            &format!("{} remote / {} walls", hud.remote_entities, hud.walls),
            10.0,
            58.0,
            16.0,
            Color::from_rgba(136, 136, 136, 255),
        );

        set_camera(&self.camera);
    }
}
