use clap::Parser;
use client::config::{Args, ClientConfig};
use client::frame::{FrameLoop, FrameOutcome};
use client::network::{Connection, Session};
use client::rendering::MacroquadSurface;
use client::world::SharedWorld;
use log::{error, info};
use macroquad::window::{next_frame, Conf};
use shared::IdGenerator;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn window_conf(config: &ClientConfig) -> Conf {
    Conf {
        window_title: "Particle Link".to_owned(),
        window_width: config.canvas.width as i32,
        window_height: config.canvas.height as i32,
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::from(Args::parse());
    let runtime = Runtime::new()?;

    info!("Connecting to: {}", config.server);
    let mut ids = IdGenerator::default();
    let connection = match runtime.block_on(Connection::connect(&config.server, &mut ids)) {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to {}: {}", config.server, e);
            std::process::exit(1);
        }
    };
    let label = format!("{} @ {}", connection.id(), connection.peer());

    let world = Arc::new(SharedWorld::new(config.canvas));
    let session = Session::start(runtime.handle(), connection, Arc::clone(&world), &config);

    info!("Controls: WASD to move, click twice to draw a wall, Backspace/Delete to remove walls");

    macroquad::Window::from_config(
        window_conf(&config),
        run(runtime, session, world, config.zoom, label),
    );

    Ok(())
}

async fn run(runtime: Runtime, session: Session, world: Arc<SharedWorld>, zoom: f32, label: String) {
    let mut surface = MacroquadSurface::new();
    let mut frames = FrameLoop::new(world, zoom, label);

    loop {
        surface.begin_frame();
        if frames.frame(&mut surface) == FrameOutcome::Close {
            break;
        }
        next_frame().await;
    }

    runtime.block_on(session.shutdown());
    info!("Client stopped");
}
