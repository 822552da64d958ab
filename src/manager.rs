//! The process-wide registry of live connections: add, remove, and
//! broadcast, under a readers-writer discipline so broadcasts may proceed
//! concurrently with each other while never observing a partially-updated
//! map during add/remove.

use crate::config::WebSocketConfig;
use crate::connection::{Connection, PendingConnection};
use crate::receive;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A single instance is expected to live for the process's lifetime, but
/// nothing here requires a singleton — construct as many as a test or a
/// multi-tenant server needs.
#[derive(Default)]
pub struct Manager {
    connections: RwLock<HashMap<Uuid, Arc<Connection>>>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `pending.connection`, spawns its receive loop over
    /// `pending.input`, and fires `on_connection_established` once the loop
    /// has been started.
    pub async fn add(
        self: &Arc<Self>,
        pending: PendingConnection,
        request: crate::request::ParsedRequest,
        config: WebSocketConfig,
    ) {
        let PendingConnection { connection, input } = pending;

        {
            let mut guard = self.connections.write().await;
            guard.insert(connection.id(), Arc::clone(&connection));
        }

        let manager = Arc::clone(self);
        let loop_connection = Arc::clone(&connection);
        tokio::spawn(async move {
            receive::run(loop_connection, input, config, manager).await;
        });

        connection
            .handler()
            .on_connection_established(Arc::clone(&connection), &request)
            .await;
    }

    /// Removes `id` from the registry, then closes the connection
    /// (tolerant of an already-closed connection).
    pub async fn remove(&self, id: Uuid) {
        let removed = {
            let mut guard = self.connections.write().await;
            guard.remove(&id)
        };

        if let Some(connection) = removed {
            connection.close().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Sends `text` to every currently-registered connection. A send
    /// failure on one recipient is logged and does not prevent delivery to
    /// the rest.
    pub async fn broadcast_text(&self, text: &str) {
        let guard = self.connections.read().await;
        for connection in guard.values() {
            if let Err(err) = connection.send_text(text).await {
                log::warn!("connection {}: broadcast_text failed: {err}", connection.id());
            }
        }
    }

    /// Sends `data` to every currently-registered connection. A send
    /// failure on one recipient is logged and does not prevent delivery to
    /// the rest.
    pub async fn broadcast_binary(&self, data: &[u8]) {
        let guard = self.connections.read().await;
        for connection in guard.values() {
            if let Err(err) = connection.send_binary(data).await {
                log::warn!("connection {}: broadcast_binary failed: {err}", connection.id());
            }
        }
    }
}
