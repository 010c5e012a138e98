//! TCP transport: fire-and-forget text records out, fixed-size binary records in

use crate::config::ClientConfig;
use crate::controller::{run_controller, Controller, PositionSink};
use crate::world::SharedWorld;
use log::{debug, error, info, log, warn, Level};
use shared::protocol::decode_remote_position;
use shared::{ClientId, IdGenerator, PositionRecord, REMOTE_RECORD_LEN};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The single long-lived connection to the server, split by direction
pub struct Connection {
    id: ClientId,
    peer: SocketAddr,
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Connects and assigns this client its identifier
    pub async fn connect(addr: &str, ids: &mut IdGenerator) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();

        let id = ids.next_id();
        info!("Connected to {} as {}", peer, id);

        Ok(Connection {
            id,
            peer,
            reader,
            writer,
        })
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn into_parts(self) -> (ClientId, TcpPositionSink, OwnedReadHalf) {
        (self.id, TcpPositionSink::new(self.writer), self.reader)
    }
}

/// Result of one best-effort write
#[derive(Debug)]
pub enum SendOutcome {
    Sent,
    /// The socket buffer was full; the record was dropped
    WouldBlock,
    /// Only `n` bytes made it into the socket buffer. The rest is held back
    /// and written ahead of the next record so the stream stays well formed.
    Partial(usize),
    Failed(io::Error),
}

impl SendOutcome {
    /// Level a send result is logged at. Dropped records are routine.
    pub fn log_level(&self) -> Level {
        match self {
            SendOutcome::Sent | SendOutcome::WouldBlock => Level::Debug,
            SendOutcome::Partial(_) => Level::Warn,
            SendOutcome::Failed(_) => Level::Error,
        }
    }
}

/// Write half of the connection. Writes never wait for socket readiness.
pub struct TcpPositionSink {
    writer: OwnedWriteHalf,
    unsent: Vec<u8>,
}

impl TcpPositionSink {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer,
            unsent: Vec::new(),
        }
    }

    pub fn send(&mut self, record: &PositionRecord) -> SendOutcome {
        let writer = &self.writer;
        write_record(&mut self.unsent, record.encode().as_bytes(), |bytes| {
            writer.try_write(bytes)
        })
    }

    /// Writes any held-back tail, then shuts down the write direction so the
    /// server sees end of stream
    pub async fn close(mut self) -> io::Result<()> {
        if !self.unsent.is_empty() {
            self.writer.write_all(&self.unsent).await?;
        }
        self.writer.shutdown().await
    }
}

/// Writes `record` behind any tail left by an earlier partial write.
///
/// A would-block drops `record` but keeps the tail, since the peer has
/// already seen the start of that record.
fn write_record<F>(unsent: &mut Vec<u8>, record: &[u8], write: F) -> SendOutcome
where
    F: FnOnce(&[u8]) -> io::Result<usize>,
{
    let tail_len = unsent.len();
    unsent.extend_from_slice(record);

    match write(&unsent[..]) {
        Ok(written) if written == unsent.len() => {
            unsent.clear();
            SendOutcome::Sent
        }
        Ok(written) => {
            unsent.drain(..written);
            SendOutcome::Partial(written)
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
            unsent.truncate(tail_len);
            SendOutcome::WouldBlock
        }
        Err(e) => {
            unsent.clear();
            SendOutcome::Failed(e)
        }
    }
}

impl PositionSink for TcpPositionSink {
    fn submit(&mut self, record: &PositionRecord) {
        let outcome = self.send(record);
        let level = outcome.log_level();
        match outcome {
            SendOutcome::Sent => log!(level, "Sent {}", record),
            SendOutcome::WouldBlock => log!(level, "Socket busy, dropped {}", record),
            SendOutcome::Partial(written) => {
                log!(level, "Partial write of {} ({} bytes)", record, written)
            }
            SendOutcome::Failed(e) => log!(level, "Failed to send position data: {}", e),
        }
    }
}

/// Why the receive loop stopped
#[derive(Debug)]
pub enum ReceiveExit {
    Shutdown,
    Disconnected(io::Error),
}

/// Reads binary position records into the remote buffer until the stream
/// fails or shutdown is signalled. There is no reconnect.
pub async fn receive_positions<R: AsyncRead + Unpin>(
    mut reader: R,
    world: Arc<SharedWorld>,
    mut shutdown: watch::Receiver<bool>,
) -> ReceiveExit {
    let mut record = [0u8; REMOTE_RECORD_LEN];

    loop {
        if *shutdown.borrow() {
            return ReceiveExit::Shutdown;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => return ReceiveExit::Shutdown,
            result = reader.read_exact(&mut record) => match result {
                Ok(_) => match decode_remote_position(&record) {
                    Ok(position) => {
                        debug!("Received remote position {:?}", position);
                        world.remote().push(position);
                    }
                    Err(e) => warn!("Undecodable position record: {}", e),
                },
                Err(e) => {
                    error!("Error receiving particle position: {}", e);
                    return ReceiveExit::Disconnected(e);
                }
            }
        }
    }
}

/// The controller and receive tasks of one connected client
pub struct Session {
    shutdown: watch::Sender<bool>,
    controller: JoinHandle<Controller<TcpPositionSink>>,
    receiver: JoinHandle<ReceiveExit>,
}

impl Session {
    /// Announces the starting position and spawns both tasks on `runtime`
    pub fn start(
        runtime: &Handle,
        connection: Connection,
        world: Arc<SharedWorld>,
        config: &ClientConfig,
    ) -> Self {
        let (id, sink, reader) = connection.into_parts();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut controller = Controller::new(id, Arc::clone(&world), sink, config.speed);
        controller.announce();

        let controller = runtime.spawn(run_controller(
            controller,
            config.poll_interval,
            shutdown_rx.clone(),
        ));
        let receiver = runtime.spawn(receive_positions(reader, world, shutdown_rx));

        Session {
            shutdown,
            controller,
            receiver,
        }
    }

    /// Stops both tasks, closes the connection and waits for them to finish
    pub async fn shutdown(self) {
        info!("Shutting down session");
        let _ = self.shutdown.send(true);

        match self.controller.await {
            Ok(controller) => {
                if let Err(e) = controller.into_sink().close().await {
                    debug!("Closing write half: {}", e);
                }
            }
            Err(e) => error!("Controller task panicked: {}", e),
        }

        match self.receiver.await {
            Ok(exit) => info!("Receive task ended: {:?}", exit),
            Err(e) => error!("Receive task panicked: {}", e),
        }
    }
}
