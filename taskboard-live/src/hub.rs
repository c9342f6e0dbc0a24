//! Fan-out of raw payloads to every live client connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;

use crate::config::DEFAULT_CONNECTION_CAPACITY;
use crate::error::LiveError;

/// Anything that can push bytes to one client.
///
/// `send` must not block: a transport that cannot take the payload right now
/// reports an error and the payload is dropped for that client only.
pub trait Connection: Send + Sync {
    fn send(&self, payload: &[u8]) -> Result<(), LiveError>;
}

/// Something that publishes payloads; the watcher only needs this.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, payload: &[u8]);
}

impl<B: Broadcaster + ?Sized> Broadcaster for Arc<B> {
    fn broadcast(&self, payload: &[u8]) {
        (**self).broadcast(payload)
    }
}

/// Handle returned by [`BroadcastHub::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Registry of live connections.
///
/// Registration changes take the write lock; broadcasts take the read lock
/// and never mutate the registry. Dead connections leave through their own
/// session teardown calling [`BroadcastHub::unregister`].
#[derive(Default)]
pub struct BroadcastHub {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, Arc<dyn Connection>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection: Arc<dyn Connection>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let total = {
            let mut connections = self.connections.write().unwrap_or_else(PoisonError::into_inner);
            connections.insert(id, connection);
            connections.len()
        };
        tracing::info!(connection = id.0, total, "live client connected");
        id
    }

    /// Remove a connection. Unknown or already removed ids are a no-op.
    pub fn unregister(&self, id: ConnectionId) {
        let removed = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            tracing::info!(connection = id.0, "live client disconnected");
        }
    }

    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Broadcaster for BroadcastHub {
    fn broadcast(&self, payload: &[u8]) {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        for (id, connection) in connections.iter() {
            if let Err(err) = connection.send(payload) {
                tracing::debug!(connection = id.0, error = %err, "failed to push payload");
            }
        }
    }
}

/// In-process connection backed by a bounded channel.
///
/// The receiving half belongs to whatever drives the client transport; when
/// it is dropped, sends fail with [`LiveError::ConnectionClosed`].
pub struct ChannelConnection {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelConnection {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<Vec<u8>>) {
        Self::with_capacity(DEFAULT_CONNECTION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Arc::new(Self { tx }), rx)
    }
}

impl Connection for ChannelConnection {
    fn send(&self, payload: &[u8]) -> Result<(), LiveError> {
        self.tx.try_send(payload.to_vec()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => LiveError::ConnectionSaturated,
            mpsc::error::TrySendError::Closed(_) => LiveError::ConnectionClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_without_connections_is_fine() {
        let hub = BroadcastHub::new();
        hub.broadcast(b"nobody listening");
        assert!(hub.is_empty());
    }

    #[test]
    fn broadcast_reaches_every_open_connection() {
        let hub = BroadcastHub::new();
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (conn, rx) = ChannelConnection::new();
            hub.register(conn);
            receivers.push(rx);
        }

        hub.broadcast(b"hello");

        for rx in &mut receivers {
            assert_eq!(rx.try_recv().expect("delivered"), b"hello".to_vec());
        }
    }

    #[test]
    fn closed_connection_does_not_block_others() {
        let hub = BroadcastHub::new();
        let (dead, dead_rx) = ChannelConnection::new();
        let (live, mut live_rx) = ChannelConnection::new();
        hub.register(dead);
        hub.register(live);
        drop(dead_rx);

        hub.broadcast(b"still here");

        assert_eq!(live_rx.try_recv().expect("delivered"), b"still here".to_vec());
        assert_eq!(hub.len(), 2, "broadcast must not prune the registry");
    }

    #[test]
    fn saturated_connection_drops_payload_only_for_itself() {
        let hub = BroadcastHub::new();
        let (slow, mut slow_rx) = ChannelConnection::with_capacity(1);
        let (fast, mut fast_rx) = ChannelConnection::new();
        hub.register(slow);
        hub.register(fast);

        hub.broadcast(b"one");
        hub.broadcast(b"two");

        assert_eq!(slow_rx.try_recv().expect("first"), b"one".to_vec());
        assert!(slow_rx.try_recv().is_err(), "second payload dropped");
        assert_eq!(fast_rx.try_recv().expect("first"), b"one".to_vec());
        assert_eq!(fast_rx.try_recv().expect("second"), b"two".to_vec());
    }

    #[test]
    fn unregister_stops_delivery_and_is_idempotent() {
        let hub = BroadcastHub::new();
        let (conn, mut rx) = ChannelConnection::new();
        let id = hub.register(conn);

        hub.unregister(id);
        hub.unregister(id);
        hub.broadcast(b"after");

        assert!(rx.try_recv().is_err());
        assert!(hub.is_empty());
    }

    #[test]
    fn unregister_unknown_id_is_a_noop() {
        let hub = BroadcastHub::new();
        let (conn, _rx) = ChannelConnection::new();
        hub.register(conn);

        hub.unregister(ConnectionId(999));
        assert_eq!(hub.len(), 1);
    }
}
