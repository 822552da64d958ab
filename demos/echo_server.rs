//! Echoes every text and binary message back to the connection that sent it.

use async_trait::async_trait;
use log::*;
use std::sync::Arc;
use tokio::net::TcpListener;
use wsgrove::connection::Connection;
use wsgrove::handler::ConnectionHandler;
use wsgrove::handshake::accept_async;
use wsgrove::manager::Manager;
use wsgrove::message::{BinaryMessage, TextMessage};

struct EchoHandler;

#[async_trait]
impl ConnectionHandler for EchoHandler {
    async fn on_connection_established(
        &self,
        connection: Arc<Connection>,
        _request: &wsgrove::request::ParsedRequest,
    ) {
        info!("connection {} established", connection.id());
    }

    async fn on_text_message(&self, message: TextMessage) {
        if let Err(err) = message.connection.send_text(&message.text).await {
            error!("connection {}: failed to echo text: {err}", message.connection.id());
        }
    }

    async fn on_binary_message(&self, message: BinaryMessage) {
        if let Err(err) = message.connection.send_binary(&message.data).await {
            error!("connection {}: failed to echo binary: {err}", message.connection.id());
        }
    }

    async fn on_connection_closed(&self, connection: Arc<Connection>) {
        info!("connection {} closed", connection.id());
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let addr = "127.0.0.1:9002";
    let listener = TcpListener::bind(addr).await.expect("can't listen");
    info!("listening on {addr}");

    let manager = Manager::shared();
    let handler: Arc<dyn ConnectionHandler> = Arc::new(EchoHandler);

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
