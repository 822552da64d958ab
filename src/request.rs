//! The HTTP request side of the upgrade is, per the library's scope, an
//! external collaborator — the host HTTP/1.1 pipeline already owns request
//! parsing. [`HttpRequestHead`] is the contract this crate actually needs
//! from it: a method and case-insensitive, multi-valued header lookup.
//!
//! [`ParsedRequest`] is a small concrete implementation of that contract,
//! good enough to drive the handshake directly off a raw stream (and to
//! exercise it in tests without a full HTTP server). A host server with its
//! own request type should implement `HttpRequestHead` for it instead.

use crate::error::Error;
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::time::{timeout, Duration};

const REQUEST_HEADER_TIMEOUT: Duration = Duration::from_secs(10);

/// The contract the upgrade handler needs from an inbound HTTP request.
pub trait HttpRequestHead {
    fn method(&self) -> &str;

    /// The first value of `name` (case-insensitive). Most headers relevant
    /// to the handshake, including `Sec-WebSocket-Key`, are single-valued.
    fn header(&self, name: &str) -> Option<&str>;

    /// All values of `name` (case-insensitive), for headers such as
    /// `Connection` that RFC 6455 allows to be comma-separated or repeated.
    fn header_values(&self, name: &str) -> Vec<&str> {
        self.header(name).into_iter().collect()
    }
}

/// A request line plus headers, read directly off the upgrade stream.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    headers: HashMap<String, String>,
}

impl ParsedRequest {
    /// Reads an HTTP/1.1 request line and headers (up to the blank line
    /// terminator) off `reader`. Does not read a body — none is expected,
    /// or relevant, for a GET upgrade request.
    pub async fn read_from<R: AsyncRead + Unpin>(reader: &mut BufReader<R>) -> Result<Self, Error> {
        let mut lines = Vec::new();
        timeout(REQUEST_HEADER_TIMEOUT, async {
            loop {
                let mut line = String::new();
                let bytes_read = reader
                    .read_line(&mut line)
                    .await
                    .map_err(Error::from)?;
                if bytes_read == 0 {
                    break;
                }
                let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
                let blank = trimmed.is_empty();
                lines.push(trimmed);
                if blank {
                    break;
                }
            }
            Ok::<(), Error>(())
        })
        .await
        .map_err(|_elapsed| Error::MalformedHttpRequest)??;

        let mut iter = lines.into_iter();
        let request_line = iter.next().ok_or(Error::MalformedHttpRequest)?;
        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or(Error::MalformedHttpRequest)?
            .to_string();
        let path = parts
            .next()
            .ok_or(Error::MalformedHttpRequest)?
            .to_string();
        let version = parts.next().unwrap_or("HTTP/1.1").to_string();

        let mut headers = HashMap::new();
        for line in iter {
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        Ok(ParsedRequest {
            method,
            path,
            version,
            headers,
        })
    }
}

impl HttpRequestHead for ParsedRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}
