//! Per-frame work on the main thread: events, FPS, camera and draw calls

use crate::input::WallDraft;
use crate::surface::{DrawStyle, HudStats, Surface, SurfaceEvent, Viewport};
use crate::world::SharedWorld;
use log::info;
use shared::ENTITY_RADIUS;
use std::sync::Arc;

/// Window over which the frame rate is averaged, in seconds
pub const FPS_WINDOW: f32 = 0.5;

/// Frame rate averaged over the last complete [`FPS_WINDOW`]
#[derive(Debug, Default)]
pub struct FpsCounter {
    frames: u32,
    elapsed: f32,
    fps: f32,
}

impl FpsCounter {
    /// Records a frame lasting `dt` seconds and returns the current estimate
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.frames += 1;
        self.elapsed += dt;

        if self.elapsed >= FPS_WINDOW {
            self.fps = self.frames as f32 / self.elapsed;
            self.frames = 0;
            self.elapsed = 0.0;
        }

        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Close,
}

pub struct FrameLoop {
    world: Arc<SharedWorld>,
    fps: FpsCounter,
    zoom: f32,
    draft: WallDraft,
    label: String,
}

impl FrameLoop {
    pub fn new(world: Arc<SharedWorld>, zoom: f32, label: impl Into<String>) -> Self {
        Self {
            world,
            fps: FpsCounter::default(),
            zoom,
            draft: WallDraft::default(),
            label: label.into(),
        }
    }

    /// Runs one frame. Remote positions drawn here are consumed, so the next
    /// frame only shows what arrives in between.
    pub fn frame<S: Surface>(&mut self, surface: &mut S) -> FrameOutcome {
        self.world.keys().publish(surface.held_keys());

        let mut outcome = FrameOutcome::Continue;
        while let Some(event) = surface.poll_event() {
            match event {
                SurfaceEvent::CloseRequested => outcome = FrameOutcome::Close,
                SurfaceEvent::Click(point) => {
                    if let Some(wall) = self.draft.click(point) {
                        info!("Wall added from {:?} to {:?}", wall.points()[0], point);
                        self.world.add_wall(wall);
                    }
                }
                SurfaceEvent::RemoveLastWall => {
                    self.world.remove_last_wall();
                }
                SurfaceEvent::ClearWalls => self.world.clear_walls(),
            }
        }

        let fps = self.fps.tick(surface.frame_time());

        let local = self.world.local_position();
        surface.set_viewport(&Viewport::follow(local, self.zoom));

        let walls = self.world.with_walls(|walls| {
            for wall in walls {
                surface.draw_polyline(wall.points(), DrawStyle::Wall);
            }
            walls.len()
        });
        if let Some(anchor) = self.draft.anchor() {
            surface.draw_circle(anchor, 1.0, DrawStyle::WallAnchor);
        }

        let remote = self.world.remote().drain();
        for position in &remote {
            surface.draw_circle(*position, ENTITY_RADIUS, DrawStyle::RemoteEntity);
        }

        surface.draw_circle(local, ENTITY_RADIUS, DrawStyle::LocalEntity);

        surface.draw_hud(&HudStats {
            fps,
            remote_entities: remote.len(),
            walls,
            label: self.label.clone(),
        });

        outcome
    }
}
