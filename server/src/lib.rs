//! # Position Relay Server
//!
//! The peer that particle-link clients stream their positions to. Every
//! client sends undelimited text records (`"<id> <x> <y>"`) whenever its
//! entity moves; the server remembers the last position of each connection
//! and, on a fixed tick, sends every client the positions of all the others
//! as 8-byte binary records.
//!
//! ## Architecture
//!
//! - **Accept loop**: admits connections up to the configured capacity and
//!   numbers them. Record identifiers cannot tell clients apart because every
//!   client process generates the same first identifier.
//! - **Reader task** (per connection): feeds a `RecordDecoder`. A record is
//!   only complete once the next one begins, so an idle read flushes the
//!   trailing record.
//! - **Writer task** (per connection): drains an unbounded outbox onto the
//!   socket so a slow client never stalls the tick loop.
//! - **Tick loop**: builds one frame of binary records per client.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Connection numbering, capacity limits, last known positions and outboxes.
//!
//! ### Network Module (`network`)
//! Listener, per-connection tasks and the broadcast tick.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:55555", Duration::from_millis(16), 32).await?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     server.run(shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod network;
