use crate::close_code::CloseCode;
use crate::connection::Connection;
use std::sync::Arc;

/// A reassembled text message, delivered to
/// [`ConnectionHandler::on_text_message`](crate::handler::ConnectionHandler::on_text_message).
#[derive(Debug, Clone)]
pub struct TextMessage {
    pub connection: Arc<Connection>,
    pub text: String,
}

/// A reassembled binary message, delivered to
/// [`ConnectionHandler::on_binary_message`](crate::handler::ConnectionHandler::on_binary_message).
#[derive(Debug, Clone)]
pub struct BinaryMessage {
    pub connection: Arc<Connection>,
    pub data: Vec<u8>,
}

/// The peer's close frame, delivered to
/// [`ConnectionHandler::on_close_message`](crate::handler::ConnectionHandler::on_close_message)
/// before the connection is removed from the registry.
#[derive(Debug, Clone)]
pub struct CloseMessage {
    pub connection: Arc<Connection>,
    pub code: CloseCode,
    pub reason: Option<String>,
}
