//! Integration tests across the shared, client and server crates
//!
//! These tests drive real loopback sockets: the client transport against a
//! scripted peer, and full client sessions against the relay server.

use assert_approx_eq::assert_approx_eq;
use client::config::ClientConfig;
use client::frame::{FrameLoop, FrameOutcome};
use client::input::{Direction, HeldKeys};
use client::network::{receive_positions, Connection, ReceiveExit, SendOutcome, Session};
use client::surface::{DrawStyle, HudStats, Surface, SurfaceEvent, Viewport};
use client::world::SharedWorld;
use server::client_manager::ClientManager;
use server::network::Server;
use shared::protocol::encode_remote_position;
use shared::{is_blocked, Canvas, IdGenerator, PositionRecord, Vec2, Wall, ENTITY_RADIUS};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::{watch, RwLock};
use tokio::time::{sleep, timeout, Instant};

const CANVAS: Canvas = Canvas::new(1280.0, 720.0);

/// Records draw calls in place of a window
#[derive(Default)]
struct RecordingSurface {
    events: VecDeque<SurfaceEvent>,
    circles: Vec<(Vec2, DrawStyle)>,
    hud: Option<HudStats>,
}

impl RecordingSurface {
    fn circles_of(&self, style: DrawStyle) -> Vec<Vec2> {
        self.circles
            .iter()
            .filter(|(_, s)| *s == style)
            .map(|(p, _)| *p)
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn held_keys(&self) -> HeldKeys {
        HeldKeys::NONE
    }

    fn poll_event(&mut self) -> Option<SurfaceEvent> {
        self.events.pop_front()
    }

    fn frame_time(&self) -> f32 {
        1.0 / 60.0
    }

    fn set_viewport(&mut self, _viewport: &Viewport) {}

    fn draw_polyline(&mut self, _points: &[Vec2], _style: DrawStyle) {}

    fn draw_circle(&mut self, center: Vec2, _radius: f32, style: DrawStyle) {
        self.circles.push((center, style));
    }

    fn draw_hud(&mut self, hud: &HudStats) {
        self.hud = Some(hud.clone());
    }
}

fn config_for(server: String) -> ClientConfig {
    ClientConfig {
        server,
        canvas: CANVAS,
        poll_interval: Duration::from_millis(10),
        speed: 5.0,
        zoom: 5.0,
    }
}

/// Polls `condition` every 10ms until it holds or two seconds pass
async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}

async fn start_server(max_clients: usize) -> (String, watch::Sender<bool>, Arc<RwLock<ClientManager>>) {
    let server = Server::bind("127.0.0.1:0", Duration::from_millis(10), max_clients)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let clients = server.clients();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(server.run(shutdown_rx));
    (addr, shutdown_tx, clients)
}

/// TRANSPORT TESTS AGAINST A SCRIPTED PEER
mod transport_tests {
    use super::*;

    /// One position out, one remote position in, shown for exactly one frame
    #[tokio::test]
    async fn end_to_end_single_remote_position() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let peer = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut text = [0u8; 8];
            stream.read_exact(&mut text).await.unwrap();

            let record = encode_remote_position(Vec2::new(30.0, 40.0)).unwrap();
            stream.write_all(&record).await.unwrap();
            (String::from_utf8(text.to_vec()).unwrap(), stream)
        });

        let mut ids = IdGenerator::default();
        let connection = Connection::connect(&addr, &mut ids).await.unwrap();
        let (id, mut sink, reader) = connection.into_parts();
        assert_eq!(id.as_str(), "A1");

        let outcome = sink.send(&PositionRecord::new(id, Vec2::new(10.0, 20.0)));
        assert!(matches!(outcome, SendOutcome::Sent));

        let (text, _stream) = peer.await.unwrap();
        let echoed = text.parse::<PositionRecord>().unwrap();
        assert_approx_eq!(echoed.position.x, 10.0);
        assert_approx_eq!(echoed.position.y, 20.0);

        let world = Arc::new(SharedWorld::with_spawn(CANVAS, Vec2::new(100.0, 100.0)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let receiver = tokio::spawn(receive_positions(reader, Arc::clone(&world), shutdown_rx));

        assert!(eventually(|| world.remote().len() == 1).await);

        let mut frames = FrameLoop::new(Arc::clone(&world), 5.0, "A1");
        let mut surface = RecordingSurface::default();
        assert_eq!(frames.frame(&mut surface), FrameOutcome::Continue);
        assert_eq!(surface.circles_of(DrawStyle::RemoteEntity), vec![Vec2::new(30.0, 40.0)]);
        assert_eq!(surface.circles_of(DrawStyle::LocalEntity), vec![Vec2::new(100.0, 100.0)]);

        surface.circles.clear();
        frames.frame(&mut surface);
        assert!(surface.circles_of(DrawStyle::RemoteEntity).is_empty());
        assert_eq!(surface.hud.unwrap().remote_entities, 0);

        shutdown_tx.send(true).unwrap();
        assert!(matches!(receiver.await.unwrap(), ReceiveExit::Shutdown));
    }

    /// The receive task ends on its own when the peer goes away
    #[tokio::test]
    async fn peer_close_ends_receive_task() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let peer = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let connection = Connection::connect(&addr, &mut IdGenerator::default())
            .await
            .unwrap();
        let (_id, _sink, reader) = connection.into_parts();
        peer.await.unwrap();

        let world = Arc::new(SharedWorld::new(CANVAS));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let exit = timeout(
            Duration::from_secs(2),
            receive_positions(reader, Arc::clone(&world), shutdown_rx),
        )
        .await
        .unwrap();

        assert!(matches!(exit, ReceiveExit::Disconnected(_)));
        assert!(world.remote().is_empty());
    }
}

/// CLIENT SESSIONS AGAINST THE RELAY SERVER
mod relay_tests {
    use super::*;

    /// Two clients with the same identifier still see each other
    #[tokio::test]
    async fn clients_see_each_other() {
        let (addr, shutdown, clients) = start_server(8).await;
        let config = config_for(addr.clone());

        let first_world = Arc::new(SharedWorld::with_spawn(CANVAS, Vec2::new(100.0, 100.0)));
        let second_world = Arc::new(SharedWorld::with_spawn(CANVAS, Vec2::new(500.0, 300.0)));

        let first = Connection::connect(&addr, &mut IdGenerator::default()).await.unwrap();
        let second = Connection::connect(&addr, &mut IdGenerator::default()).await.unwrap();
        assert_eq!(first.id(), second.id());

        let first = Session::start(&Handle::current(), first, Arc::clone(&first_world), &config);
        let second = Session::start(&Handle::current(), second, Arc::clone(&second_world), &config);

        assert!(
            eventually(|| first_world
                .remote()
                .drain()
                .contains(&Vec2::new(500.0, 300.0)))
            .await
        );
        assert!(
            eventually(|| second_world
                .remote()
                .drain()
                .contains(&Vec2::new(100.0, 100.0)))
            .await
        );

        first.shutdown().await;
        second.shutdown().await;

        assert!(eventually(|| clients.try_read().map_or(false, |c| c.is_empty())).await);
        shutdown.send(true).unwrap();
    }

    /// Holding a key moves the entity and the move reaches the other client
    #[tokio::test]
    async fn movement_is_relayed() {
        let (addr, shutdown, _clients) = start_server(8).await;
        let config = config_for(addr.clone());

        let mover = Arc::new(SharedWorld::with_spawn(CANVAS, Vec2::new(200.0, 200.0)));
        let watcher = Arc::new(SharedWorld::new(CANVAS));

        let mover_session = Session::start(
            &Handle::current(),
            Connection::connect(&addr, &mut IdGenerator::default()).await.unwrap(),
            Arc::clone(&mover),
            &config,
        );
        let watcher_session = Session::start(
            &Handle::current(),
            Connection::connect(&addr, &mut IdGenerator::default()).await.unwrap(),
            Arc::clone(&watcher),
            &config,
        );

        mover.keys().publish(HeldKeys::NONE.with(Direction::Right));
        assert!(eventually(|| mover.local_position().x >= 250.0).await);
        mover.keys().publish(HeldKeys::NONE);

        assert!(
            eventually(|| watcher
                .remote()
                .drain()
                .iter()
                .any(|p| p.x >= 250.0 && p.y == 200.0))
            .await
        );

        mover_session.shutdown().await;
        watcher_session.shutdown().await;
        shutdown.send(true).unwrap();
    }

    /// Connections beyond capacity are closed straight away
    #[tokio::test]
    async fn full_server_closes_extra_connection() {
        let (addr, shutdown, clients) = start_server(1).await;

        let _admitted = Connection::connect(&addr, &mut IdGenerator::default()).await.unwrap();
        let extra = Connection::connect(&addr, &mut IdGenerator::default()).await.unwrap();
        let (_id, _sink, reader) = extra.into_parts();

        let (_tx, rx) = watch::channel(false);
        let exit = timeout(
            Duration::from_secs(2),
            receive_positions(reader, Arc::new(SharedWorld::new(CANVAS)), rx),
        )
        .await
        .unwrap();

        assert!(matches!(exit, ReceiveExit::Disconnected(_)));
        assert_eq!(clients.read().await.len(), 1);
        shutdown.send(true).unwrap();
    }
}

/// COLLISION PROPERTIES
mod collision_tests {
    use super::*;

    #[test]
    fn horizontal_wall_blocks_only_nearby_positions() {
        let walls = vec![Wall::segment(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0))];

        assert!(is_blocked(Vec2::new(50.0, ENTITY_RADIUS / 2.0), &walls, CANVAS));
        assert!(!is_blocked(Vec2::new(50.0, ENTITY_RADIUS * 2.0), &walls, CANVAS));
    }

    #[test]
    fn canvas_edges_block() {
        for candidate in [
            Vec2::new(-1.0, 10.0),
            Vec2::new(10.0, -1.0),
            Vec2::new(1280.0, 10.0),
            Vec2::new(10.0, 720.0),
        ] {
            assert!(is_blocked(candidate, &[], CANVAS), "{:?} should be blocked", candidate);
        }
        assert!(!is_blocked(Vec2::new(0.0, 0.0), &[], CANVAS));
    }
}
