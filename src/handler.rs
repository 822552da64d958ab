//! The user-supplied message handler. Expressed as a record of optional
//! callbacks rather than an inheritance hierarchy: every hook defaults to a
//! no-op, so implementors only override what they care about.

use crate::connection::Connection;
use crate::message::{BinaryMessage, CloseMessage, TextMessage};
use crate::request::ParsedRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared across every `Connection` it is bound to — construct one handler
/// per server and hand the same `Arc` to every upgrade.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    /// Called once a connection has been registered and its receive loop
    /// spawned.
    async fn on_connection_established(&self, _connection: Arc<Connection>, _request: &ParsedRequest) {}

    /// Called once per fully reassembled text message.
    async fn on_text_message(&self, _message: TextMessage) {}

    /// Called once per fully reassembled binary message.
    async fn on_binary_message(&self, _message: BinaryMessage) {}

    /// Called when the peer's close frame is observed, before the
    /// connection is removed from the registry.
    async fn on_close_message(&self, _message: CloseMessage) {}

    /// Called after the connection has been closed and removed from the
    /// registry.
    async fn on_connection_closed(&self, _connection: Arc<Connection>) {}
}

/// A handler that implements every hook as a no-op. Useful as a placeholder
/// or in tests that only exercise the codec and registry.
#[derive(Debug, Default)]
pub struct NoopHandler;

#[async_trait]
impl ConnectionHandler for NoopHandler {}
