//! Offline bouncing-particle playground.
//!
//! Click twice to draw a wall, `1`/`2`/`3` spawn a line, fan or speed ramp of
//! particles at the pointer, `C` clears particles, Backspace removes the last
//! wall and Delete clears every wall.

use clap::Parser;
use client::frame::FpsCounter;
use client::input::WallDraft;
use client::pool::WorkerPool;
use client::rendering::MacroquadSurface;
use client::surface::{DrawStyle, HudStats, Surface, SurfaceEvent, Viewport};
use log::{error, info};
use macroquad::input::{is_key_pressed, KeyCode};
use macroquad::window::{next_frame, Conf};
use shared::particles::{spawn_along_line, spawn_fan, spawn_speed_ramp, Particle};
use shared::{Canvas, Vec2, Wall, CANVAS_HEIGHT, CANVAS_WIDTH};
use std::f32::consts::PI;
use std::sync::Arc;

const PARTICLE_RADIUS: f32 = 2.0;
const CHUNK_SIZE: usize = 512;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Particles per spawn
    #[arg(short = 'n', long, default_value_t = 100)]
    count: usize,

    /// Initial particle speed in pixels per second
    #[arg(long, default_value_t = 200.0)]
    speed: f32,

    /// Heading in degrees for line and ramp spawns
    #[arg(long, default_value_t = 45.0)]
    angle: f32,

    /// Worker threads for the simulation step (0 = one per core)
    #[arg(long, default_value_t = 0)]
    workers: usize,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Particle Sandbox".to_owned(),
        window_width: CANVAS_WIDTH as i32,
        window_height: CANVAS_HEIGHT as i32,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let canvas = Canvas::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let angle = args.angle.to_radians();
    let pool = if args.workers == 0 {
        WorkerPool::with_available_parallelism(64)
    } else {
        WorkerPool::new(args.workers, 64)
    };
    info!("Stepping particles on {} workers", pool.worker_count());

    let mut surface = MacroquadSurface::new();
    let mut fps = FpsCounter::default();
    let mut draft = WallDraft::default();
    let mut walls: Vec<Wall> = Vec::new();
    let mut particles: Vec<Particle> = Vec::new();

    loop {
        surface.begin_frame();

        let mut closing = false;
        while let Some(event) = surface.poll_event() {
            match event {
                SurfaceEvent::CloseRequested => closing = true,
                SurfaceEvent::Click(point) => {
                    if let Some(wall) = draft.click(point) {
                        walls.push(wall);
                    }
                }
                SurfaceEvent::RemoveLastWall => {
                    walls.pop();
                }
                SurfaceEvent::ClearWalls => walls.clear(),
            }
        }
        if closing {
            break;
        }

        let origin = surface.pointer();
        if is_key_pressed(KeyCode::Key1) {
            let end = origin + Vec2::new(200.0, 0.0);
            particles.extend(spawn_along_line(origin, end, args.count, args.speed, angle));
        }
        if is_key_pressed(KeyCode::Key2) {
            particles.extend(spawn_fan(origin, 0.0, PI, args.count, args.speed));
        }
        if is_key_pressed(KeyCode::Key3) {
            particles.extend(spawn_speed_ramp(origin, angle, args.count));
        }
        if is_key_pressed(KeyCode::C) {
            particles.clear();
        }

        let dt = surface.frame_time();
        let shared_walls = Arc::new(walls.clone());
        particles = match pool.map_chunks(std::mem::take(&mut particles), CHUNK_SIZE, move |chunk| {
            for particle in chunk {
                particle.update(dt, canvas, &shared_walls);
            }
        }) {
            Ok(stepped) => stepped,
            Err(e) => {
                error!("Simulation step failed: {}", e);
                break;
            }
        };

        surface.set_viewport(&Viewport::whole(canvas.width, canvas.height));
        for wall in &walls {
            surface.draw_polyline(wall.points(), DrawStyle::Wall);
        }
        if let Some(anchor) = draft.anchor() {
            surface.draw_circle(anchor, PARTICLE_RADIUS, DrawStyle::WallAnchor);
        }
        for particle in &particles {
            surface.draw_circle(particle.position, PARTICLE_RADIUS, DrawStyle::Particle);
        }

        surface.draw_hud(&HudStats {
            fps: fps.tick(dt),
            remote_entities: 0,
            walls: walls.len(),
            label: format!("{} particles", particles.len()),
        });

        next_frame().await;
    }

    pool.shutdown();
    info!("Sandbox closed");
}
