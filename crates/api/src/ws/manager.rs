use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use farmlink_core::types::{PeerId, Timestamp};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Outbound frames buffered per peer before new ones are dropped.
pub const DEFAULT_PEER_QUEUE_CAPACITY: usize = 256;

/// Channel sender half for pushing messages to a peer.
pub type WsSender = mpsc::Sender<Message>;

/// Metadata for a single connected peer.
pub struct WsConnection {
    /// Channel sender for outbound messages to this peer.
    pub sender: WsSender,
    /// When this peer connected.
    pub connected_at: Timestamp,
}

/// Registry of every connected peer.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Sends never block: each peer owns a
/// bounded queue drained by its own sender task, and a peer whose queue is
/// full loses the frame instead of stalling everyone else.
pub struct WsManager {
    connections: RwLock<HashMap<PeerId, WsConnection>>,
    queue_capacity: usize,
}

impl WsManager {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_PEER_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a peer.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the peer's sink. Registering an id twice replaces
    /// the previous queue.
    pub async fn add(&self, conn_id: PeerId) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a peer by its ID, returning its registration if it existed.
    pub async fn remove(&self, conn_id: &str) -> Option<WsConnection> {
        self.connections.write().await.remove(conn_id)
    }

    /// Queue a message for every peer except `except`.
    ///
    /// Closed peers are skipped silently (they are cleaned up when their
    /// receive loop ends). Peers with a full queue drop the message.
    /// Returns the number of peers the message was queued for.
    pub async fn broadcast_except(&self, except: &str, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for (id, conn) in conns.iter() {
            if id == except {
                continue;
            }
            match conn.sender.try_send(message.clone()) {
                Ok(()) => count += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(peer_id = %id, "Peer queue full, dropping frame");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
        count
    }

    /// Return the current number of registered peers.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every peer, then clear the registry.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.try_send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every peer.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.try_send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
