//! Logic shared by the client, the server and the particle sandbox

pub mod collision;
pub mod geometry;
pub mod particles;
pub mod protocol;

pub use collision::{is_blocked, Canvas, Wall};
pub use geometry::Vec2;
pub use protocol::{ClientId, IdGenerator, PositionRecord, RecordDecoder, REMOTE_RECORD_LEN};

/// Radius of every entity and particle, also the bias used when testing against walls
pub const ENTITY_RADIUS: f32 = 5.0;
pub const CANVAS_WIDTH: f32 = 1280.0;
pub const CANVAS_HEIGHT: f32 = 720.0;
/// Distance the local entity moves per controller tick
pub const MOVE_SPEED: f32 = 5.0;
pub const DEFAULT_PORT: u16 = 55555;
