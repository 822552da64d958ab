//! The shared, registrable handle to a live WebSocket connection.
//!
//! A `Connection` is deliberately small: identity, the output half (guarded
//! by a write-mutex shared between the receive loop and any broadcast
//! caller — see the design notes on output-stream sharing), and the user
//! handler. The input half is never shared; it is owned exclusively by the
//! connection's receive-loop task, which is why it isn't a field here (see
//! [`PendingConnection`]).

use crate::close_code::CloseCode;
use crate::codec;
use crate::error::Error;
use crate::handler::ConnectionHandler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use uuid::Uuid;

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub struct Connection {
    id: Uuid,
    output: Mutex<BoxedWriter>,
    handler: Arc<dyn ConnectionHandler>,
    closed: AtomicBool,
}

impl Connection {
    pub(crate) fn new(output: BoxedWriter, handler: Arc<dyn ConnectionHandler>) -> Self {
        Self {
            id: Uuid::new_v4(),
            output: Mutex::new(output),
            handler,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn handler(&self) -> &Arc<dyn ConnectionHandler> {
        &self.handler
    }

    pub async fn send_text(&self, text: &str) -> Result<(), Error> {
        codec::write_text(&mut *self.output.lock().await, text).await
    }

    pub async fn send_binary(&self, payload: &[u8]) -> Result<(), Error> {
        codec::write_binary(&mut *self.output.lock().await, payload).await
    }

    pub async fn send_close(&self, code: CloseCode, reason: &str) -> Result<(), Error> {
        codec::write_close(&mut *self.output.lock().await, code, reason).await
    }

    pub(crate) async fn send_pong(&self, payload: &[u8]) -> Result<(), Error> {
        codec::write_pong(&mut *self.output.lock().await, payload).await
    }

    /// Idempotent-on-effect shutdown: best-effort `Close(Normal, "")`, then
    /// release of the output half, then the `on_connection_closed` hook.
    /// Safe to call concurrently — only the caller that flips `closed` from
    /// false to true performs the shutdown sequence.
    pub async fn close(self: &Arc<Self>) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        if let Err(err) = self.send_close(CloseCode::Normal, "").await {
            log::warn!("connection {}: best-effort close frame failed: {err}", self.id);
        }

        if let Err(err) = tokio::io::AsyncWriteExt::shutdown(&mut *self.output.lock().await).await {
            log::warn!("connection {}: error shutting down output stream: {err}", self.id);
        }

        self.handler.on_connection_closed(Arc::clone(self)).await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A freshly upgraded connection, not yet registered with the [`crate::manager::Manager`].
/// `Manager::add` consumes this: it registers `connection`, spawns the
/// receive loop over `input`, and then fires `on_connection_established`.
pub struct PendingConnection {
    pub connection: Arc<Connection>,
    pub(crate) input: BoxedReader,
}
