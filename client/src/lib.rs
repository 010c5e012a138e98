//! # Particle Link Client
//!
//! Client side of a small networked particle playground. A locally controlled
//! entity moves around a walled canvas while its position is streamed to a
//! server, and the positions the server relays back are drawn alongside it.
//!
//! ## Tasks
//!
//! Three things run at once:
//!
//! - **Render loop** (main thread): drains window events, publishes the held
//!   movement keys, draws walls, remote entities and the local entity through
//!   a camera that follows the local entity, and consumes the remote buffer.
//! - **Controller** (tokio task): on a fixed interval, turns held keys into
//!   moves validated by the collision resolver and sends the resulting
//!   position as a text record.
//! - **Receiver** (tokio task): reads 8-byte binary position records into the
//!   shared remote buffer until the connection drops or shutdown is signalled.
//!
//! All shared state lives in [`world::SharedWorld`]; the socket is split so
//! the controller only writes and the receiver only reads.
//!
//! ## Module Organization
//!
//! - `config`: command-line arguments
//! - `controller`: local entity state machine and the `PositionSink` seam
//! - `frame`: per-frame logic and the FPS counter
//! - `input`: held-key snapshots and the wall drawing gesture
//! - `network`: connection, send path, receive loop and session lifecycle
//! - `pool`: general-purpose worker pool
//! - `rendering`: macroquad implementation of the drawing surface
//! - `surface`: the drawing/input surface trait
//! - `world`: shared state

pub mod config;
pub mod controller;
pub mod frame;
pub mod input;
pub mod network;
pub mod pool;
pub mod rendering;
pub mod surface;
pub mod world;
