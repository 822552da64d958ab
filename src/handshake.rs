//! Validates an incoming HTTP request as a WebSocket upgrade, writes the
//! `101 Switching Protocols` response (or a `405`/`400` rejection), and
//! constructs a [`PendingConnection`] ready for [`crate::manager::Manager::add`].

use crate::connection::{Connection, PendingConnection};
use crate::error::Error;
use crate::handler::ConnectionHandler;
use crate::request::{HttpRequestHead, ParsedRequest};
use base64::prelude::*;
use sha1::{Digest, Sha1};
use std::sync::Arc;
use tokio::io::{split, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Derives the `Sec-WebSocket-Accept` value from a client's
/// `Sec-WebSocket-Key`, per RFC 6455 §1.3.
pub fn accept_key(client_key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(client_key.as_bytes());
    sha1.update(WEBSOCKET_GUID.as_bytes());
    BASE64_STANDARD.encode(sha1.finalize())
}

/// Reads the upgrade request off `stream`, validates it, and on success
/// writes the `101` response and returns a connection ready for
/// registration. On rejection, writes the matching `405`/`400` response and
/// returns `Err` without ever constructing a `Connection`.
pub async fn accept_async<S>(
    stream: S,
    handler: Arc<dyn ConnectionHandler>,
) -> Result<(PendingConnection, ParsedRequest), Error>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (read_half, mut write_half) = split(stream);
    let mut reader = BufReader::new(read_half);

    let request = ParsedRequest::read_from(&mut reader).await?;

    if request.method() != "GET" {
        write_plain_text_error(
            &mut write_half,
            405,
            "Method Not Allowed",
            "Only GET requests are allowed.",
        )
        .await?;
        return Err(Error::MethodNotAllowed(request.method().to_string()));
    }

    let client_key = request.header("Sec-WebSocket-Key").unwrap_or("");
    if client_key.is_empty() {
        write_plain_text_error(
            &mut write_half,
            400,
            "Bad Request",
            "Missing Sec-WebSocket-Key header.",
        )
        .await?;
        return Err(Error::MissingSecWebSocketKey);
    }

    let accept = accept_key(client_key);
    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\
         \r\n"
    );
    write_half.write_all(response.as_bytes()).await?;
    write_half.flush().await?;

    let connection = Arc::new(Connection::new(Box::new(write_half), handler));
    let pending = PendingConnection {
        connection,
        input: Box::new(reader),
    };

    Ok((pending, request))
}

async fn write_plain_text_error<W: AsyncWrite + Unpin>(
    writer: &mut W,
    status: u16,
    reason: &str,
    body: &str,
) -> Result<(), Error> {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {len}\r\n\
         \r\n\
         {body}",
        len = body.len()
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
