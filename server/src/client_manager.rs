//! Registry of connected clients and their last reported positions
//!
//! Clients are keyed by a connection number assigned on accept. The
//! identifier inside a client's text records is kept for logging only, since
//! independent client processes all start counting from the same value.

use log::{debug, info};
use shared::{ClientId, PositionRecord, Vec2};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// Outbound byte frames queued for a client's writer task
pub type Outbox = mpsc::UnboundedSender<Vec<u8>>;

/// A connected client
#[derive(Debug)]
pub struct Client {
    /// Connection number assigned by the server
    pub id: u32,
    pub addr: SocketAddr,
    /// Last time a record arrived from this client
    pub last_seen: Instant,
    /// Identifier the client put in its most recent record
    pub reported_id: Option<ClientId>,
    /// Last known position; `None` until the first record arrives
    pub position: Option<Vec2>,
    outbox: Outbox,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr, outbox: Outbox) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            reported_id: None,
            position: None,
            outbox,
        }
    }

    /// Stores the record's position and refreshes the activity time
    pub fn apply(&mut self, record: PositionRecord) {
        self.last_seen = Instant::now();
        self.position = Some(record.position);
        self.reported_id = Some(record.id);
    }
}

/// Every connected client, capped at `max_clients`
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a connection. Returns `None` when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr, outbox: Outbox) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, outbox));

        Some(client_id)
    }

    /// Drops a client and its outbox, which ends its writer task
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} ({}) disconnected", client.id, client.addr);
            true
        } else {
            false
        }
    }

    /// Records a position update. Returns false for unknown clients.
    pub fn update_position(&mut self, client_id: u32, record: PositionRecord) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                debug!("Client {} reported {}", client_id, record);
                client.apply(record);
                true
            }
            None => false,
        }
    }

    pub fn position(&self, client_id: u32) -> Option<Vec2> {
        self.clients.get(&client_id).and_then(|c| c.position)
    }

    /// Known positions of every client except `client_id`, ordered by connection number
    pub fn others_positions(&self, client_id: u32) -> Vec<Vec2> {
        let mut others: Vec<(u32, Vec2)> = self
            .clients
            .values()
            .filter(|c| c.id != client_id)
            .filter_map(|c| c.position.map(|p| (c.id, p)))
            .collect();
        others.sort_by_key(|(id, _)| *id);
        others.into_iter().map(|(_, p)| p).collect()
    }

    pub fn client_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.clients.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Queues a frame for a client. Returns false if the client is gone or
    /// its writer has already stopped.
    pub fn send(&self, client_id: u32, frame: Vec<u8>) -> bool {
        self.clients
            .get(&client_id)
            .map_or(false, |c| c.outbox.send(frame).is_ok())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
