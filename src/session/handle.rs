//! Shared session handle
//!
//! The connection task owns the session state machine; the registry only
//! needs to reach a session's outbound queue and counters. `SessionHandle` is
//! that shared part, held as `Arc<SessionHandle>` by both sides.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Outbound side of a session
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    peer_addr: SocketAddr,
    started_at: SystemTime,
    in_bytes: AtomicU64,
    out_bytes: AtomicU64,
    outbox: mpsc::UnboundedSender<Bytes>,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>, peer_addr: SocketAddr, outbox: mpsc::UnboundedSender<Bytes>) -> Self {
        Self {
            id: id.into(),
            peer_addr,
            started_at: SystemTime::now(),
            in_bytes: AtomicU64::new(0),
            out_bytes: AtomicU64::new(0),
            outbox,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Queue bytes for the writer task
    ///
    /// Returns false once the writer has gone away. Queued bytes are written
    /// in order.
    pub fn send(&self, data: Bytes) -> bool {
        self.outbox.send(data).is_ok()
    }

    pub fn add_in_bytes(&self, n: u64) {
        self.in_bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_out_bytes(&self, n: u64) {
        self.out_bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn in_bytes(&self) -> u64 {
        self.in_bytes.load(Ordering::Relaxed)
    }

    pub fn out_bytes(&self) -> u64 {
        self.out_bytes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_and_counters() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new("a1", "127.0.0.1:5000".parse().unwrap(), tx);

        assert!(handle.send(Bytes::from_static(b"one")));
        assert!(handle.send(Bytes::from_static(b"two")));
        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"one"));
        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"two"));

        handle.add_in_bytes(10);
        handle.add_out_bytes(4);
        handle.add_out_bytes(4);
        assert_eq!(handle.in_bytes(), 10);
        assert_eq!(handle.out_bytes(), 8);
        assert_eq!(handle.id(), "a1");
        assert_eq!(handle.peer_addr().port(), 5000);
    }

    #[test]
    fn test_send_after_writer_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle::new("a2", "127.0.0.1:5000".parse().unwrap(), tx);
        drop(rx);
        assert!(!handle.send(Bytes::from_static(b"lost")));
    }
}
