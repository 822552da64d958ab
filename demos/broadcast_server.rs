//! Relays every text message received on any connection to every
//! currently-registered connection, including the sender.

use async_trait::async_trait;
use log::*;
use std::sync::Arc;
use tokio::net::TcpListener;
use wsgrove::connection::Connection;
use wsgrove::handler::ConnectionHandler;
use wsgrove::handshake::accept_async;
use wsgrove::manager::Manager;
use wsgrove::message::TextMessage;

struct BroadcastHandler {
    manager: Arc<Manager>,
}

#[async_trait]
impl ConnectionHandler for BroadcastHandler {
    async fn on_connection_established(
        &self,
        connection: Arc<Connection>,
        _request: &wsgrove::request::ParsedRequest,
    ) {
        info!("connection {} joined, {} total", connection.id(), self.manager.len().await);
    }

    async fn on_text_message(&self, message: TextMessage) {
        info!("connection {}: {}", message.connection.id(), message.text);
        self.manager.broadcast_text(&message.text).await;
    }

    async fn on_connection_closed(&self, connection: Arc<Connection>) {
        info!("connection {} left, {} remaining", connection.id(), self.manager.len().await);
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let addr = "127.0.0.1:9003";
    let listener = TcpListener::bind(addr).await.expect("can't listen");
    info!("listening on {addr}");

    let manager = Manager::shared();
    let handler: Arc<dyn ConnectionHandler> = Arc::new(BroadcastHandler {
        manager: Arc::clone(&manager),
    });

    while let Ok((stream, peer)) = listener.accept().await {
        info!("peer address: {peer}");
        let manager = Arc::clone(&manager);
        let handler = Arc::clone(&handler);

        tokio::spawn(async move {
            match accept_async(stream, handler).await {
                Ok((pending, request)) => {
                    manager
                        .add(pending, request, wsgrove::config::WebSocketConfig::default())
                        .await;
                }
                Err(err) => error!("handshake with {peer} failed: {err}"),
            }
        });
    }
}
