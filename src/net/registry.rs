//! Live connection tracking and fan-out

use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type ConnectionMap = HashMap<SocketAddr, Arc<Connection>>;

/// Write half of one client connection plus the player it controls
pub struct Connection {
    addr: SocketAddr,
    writer: Mutex<BoxedWriter>,
    /// Username of the controlled player; the world owns the player itself
    player: SyncMutex<Option<String>>,
}

impl Connection {
    pub fn new<W>(addr: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            addr,
            writer: Mutex::new(Box::new(writer)),
            player: SyncMutex::new(None),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Write one newline-terminated message
    pub async fn send(&self, payload: &[u8]) -> io::Result<()> {
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        if !payload.ends_with(b"\n") {
            line.push(b'\n');
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await
    }

    /// Close the write half
    pub async fn shutdown(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }

    pub fn controlled_player(&self) -> Option<String> {
        self.player.lock().clone()
    }

    pub fn set_controlled_player(&self, username: &str) {
        *self.player.lock() = Some(username.to_string());
    }

    /// Drop the back-reference if it points at `username`
    pub fn release_player(&self, username: &str) -> bool {
        let mut player = self.player.lock();
        if player.as_deref() == Some(username) {
            *player = None;
            true
        } else {
            false
        }
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// All live connections keyed by remote address.
///
/// The same lock guards register, unregister and broadcast iteration, so a
/// connection is never written to after removal.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<ConnectionMap>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, conn: Arc<Connection>) {
        self.connections.lock().await.insert(conn.addr(), conn);
    }

    pub async fn unregister(&self, addr: &SocketAddr) -> Option<Arc<Connection>> {
        self.connections.lock().await.remove(addr)
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Take the registry lock.
    ///
    /// World changes that touch back-references, and every snapshot that is
    /// fanned out, happen while the returned guard is held so that clients
    /// observe them in one order.
    pub async fn lock(&self) -> Connections<'_> {
        Connections {
            map: self.connections.lock().await,
        }
    }
}

/// Locked view of the registry
pub struct Connections<'a> {
    map: MutexGuard<'a, ConnectionMap>,
}

impl Connections<'_> {
    /// Clear every back-reference to a deleted player
    pub fn release_player(&self, username: &str) {
        for conn in self.map.values() {
            conn.release_player(username);
        }
    }

    /// Write `payload` to every connection, one at a time.
    ///
    /// A failed write is logged and skipped; the rest still get the message.
    pub async fn broadcast(&self, payload: &[u8]) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (addr, conn) in self.map.iter() {
            match conn.send(payload).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(addr = %addr, error = %e, "Broadcast write failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
