//! Command-line configuration for the client

use clap::Parser;
use shared::{Canvas, CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_PORT, MOVE_SPEED};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    pub server: String,

    /// Canvas width
    #[arg(short = 'w', long, default_value_t = CANVAS_WIDTH)]
    pub width: f32,

    /// Canvas height (no short flag to avoid conflict with --help)
    #[arg(long, default_value_t = CANVAS_HEIGHT)]
    pub height: f32,

    /// Controller polling interval in milliseconds
    #[arg(long, default_value_t = 10)]
    pub poll_ms: u64,

    /// Distance moved per controller tick
    #[arg(long, default_value_t = MOVE_SPEED)]
    pub speed: f32,

    /// Camera zoom factor
    #[arg(short = 'z', long, default_value_t = 5.0)]
    pub zoom: f32,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub canvas: Canvas,
    pub poll_interval: Duration,
    pub speed: f32,
    pub zoom: f32,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            server: args.server,
            canvas: Canvas::new(args.width, args.height),
            poll_interval: Duration::from_millis(args.poll_ms.max(1)),
            speed: args.speed,
            zoom: args.zoom,
        }
    }
}
