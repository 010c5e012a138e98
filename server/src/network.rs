//! TCP relay: accepts clients, decodes their text records and broadcasts
//! everyone else's position back on a fixed tick

use crate::client_manager::ClientManager;
use log::{debug, error, info, warn};
use shared::protocol::{encode_remote_position, ParseRecordError};
use shared::{PositionRecord, RecordDecoder};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::{interval, timeout, MissedTickBehavior};

/// How long a connection may stay quiet before its trailing record is flushed
pub const IDLE_FLUSH: Duration = Duration::from_millis(50);

const READ_BUFFER_SIZE: usize = 1024;

/// Relay server state shared by the accept loop, connection tasks and the tick loop
pub struct Server {
    listener: TcpListener,
    clients: Arc<RwLock<ClientManager>>,
    tick_duration: Duration,
}

impl Server {
    pub async fn bind(addr: &str, tick_duration: Duration, max_clients: usize) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            tick_duration,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn clients(&self) -> Arc<RwLock<ClientManager>> {
        Arc::clone(&self.clients)
    }

    /// Accepts connections and broadcasts positions until `shutdown` turns true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick: u64 = 0;

        info!("Server started successfully");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Server shutting down");
                        break;
                    }
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.admit(stream, addr).await,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                _ = tick_interval.tick() => {
                    tick += 1;
                    let sent = broadcast_positions(&self.clients).await;

                    if tick % 60 == 0 && sent > 0 {
                        debug!("Tick {}: {} position records sent", tick, sent);
                    }
                }
            }
        }

        Ok(())
    }

    /// Registers the connection and spawns its reader and writer tasks
    async fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr, outbox_tx)
        };

        let Some(client_id) = client_id else {
            warn!("Rejecting {}: server full", addr);
            return;
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        let (reader, writer) = stream.into_split();
        tokio::spawn(write_frames(writer, outbox_rx));

        let clients = Arc::clone(&self.clients);
        tokio::spawn(async move {
            if let Err(e) = read_records(reader, client_id, &clients, IDLE_FLUSH).await {
                debug!("Client {} read error: {}", client_id, e);
            }
            clients.write().await.remove_client(&client_id);
        });
    }
}

/// Sends every client the positions of all others. Returns the number of
/// binary records queued.
pub async fn broadcast_positions(clients: &RwLock<ClientManager>) -> usize {
    let clients = clients.read().await;
    let mut sent = 0;

    for client_id in clients.client_ids() {
        let others = clients.others_positions(client_id);
        if others.is_empty() {
            continue;
        }

        let mut frame = Vec::with_capacity(others.len() * shared::REMOTE_RECORD_LEN);
        for position in &others {
            match encode_remote_position(*position) {
                Ok(bytes) => frame.extend_from_slice(&bytes),
                Err(e) => error!("Failed to encode position {:?}: {}", position, e),
            }
        }

        if clients.send(client_id, frame) {
            sent += others.len();
        }
    }

    sent
}

/// Reads the text stream of one client until it closes.
///
/// The last record of a burst only becomes complete when the next one starts,
/// so a read that stays idle for `idle_flush` applies it early. It stays
/// buffered since its tail may still be in flight, and is applied again once
/// complete.
pub async fn read_records<R>(
    mut reader: R,
    client_id: u32,
    clients: &RwLock<ClientManager>,
    idle_flush: Duration,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = RecordDecoder::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut idle_applied = false;

    loop {
        match timeout(idle_flush, reader.read(&mut buffer)).await {
            Err(_) => {
                if !idle_applied {
                    // Errors wait for the complete record
                    if let Some(Ok(record)) = decoder.peek() {
                        clients.write().await.update_position(client_id, record);
                    }
                    idle_applied = true;
                }
            }
            Ok(Ok(0)) => {
                if let Some(last) = decoder.flush() {
                    apply(clients, client_id, last).await;
                }
                return Ok(());
            }
            Ok(Ok(n)) => {
                idle_applied = false;
                for result in decoder.push(&buffer[..n]) {
                    apply(clients, client_id, result).await;
                }
            }
            Ok(Err(e)) => return Err(e),
        }
    }
}

async fn apply(
    clients: &RwLock<ClientManager>,
    client_id: u32,
    result: Result<PositionRecord, ParseRecordError>,
) {
    match result {
        Ok(record) => {
            clients.write().await.update_position(client_id, record);
        }
        Err(e) => warn!("Client {} sent a malformed record: {}", client_id, e),
    }
}

/// Drains a client's outbox onto its socket until the outbox closes
pub async fn write_frames<W>(mut writer: W, mut outbox: mpsc::UnboundedReceiver<Vec<u8>>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = outbox.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            debug!("Stopping writer: {}", e);
            break;
        }
    }
    let _ = writer.shutdown().await;
}
