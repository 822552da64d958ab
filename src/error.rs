use std::string::FromUtf8Error;
use thiserror::Error;

/// All failure modes surfaced by this crate, per the error policy in the
/// library's design notes: protocol errors and I/O errors terminate the
/// offending connection; invalid-argument errors are surfaced synchronously
/// to the caller without touching the connection; handshake rejections never
/// produce a `Connection` at all.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reserved bit set on incoming frame")]
    RsvNotZero,

    #[error("invalid opcode `{0:#x}` on the wire")]
    InvalidOpcode(u8),

    #[error("control frame fragmented (FIN=0)")]
    ControlFrameFragmented,

    #[error("control frame payload exceeds 125 bytes")]
    ControlFramePayloadTooLarge,

    #[error("text payload is not valid UTF-8: {source}")]
    InvalidUtf8 {
        #[from]
        source: FromUtf8Error,
    },

    #[error("continuation frame received with no fragmented message in progress")]
    InvalidContinuationFrame,

    #[error("text/binary frame received while a fragmented message is already in progress")]
    FragmentedMessageInProgress,

    #[error("frame payload of {actual} bytes exceeds the configured max frame size of {limit}")]
    MaxFrameSizeExceeded { actual: usize, limit: usize },

    #[error("reassembled message of {actual} bytes exceeds the configured max message size of {limit}")]
    MaxMessageSizeExceeded { actual: usize, limit: usize },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("short write: expected {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },

    #[error("close reason of {actual} bytes exceeds the 123-byte limit for control frames")]
    CloseReasonTooLong { actual: usize },

    #[error("close code {0:?} is reserved for local signalling and must not be sent on the wire")]
    ReservedCloseCode(crate::close_code::CloseCode),

    #[error("missing or empty Sec-WebSocket-Key header")]
    MissingSecWebSocketKey,

    #[error("method `{0}` is not allowed; only GET upgrades are supported")]
    MethodNotAllowed(String),

    #[error("malformed HTTP/1.1 request line or headers")]
    MalformedHttpRequest,

    #[error("connection registry channel closed unexpectedly")]
    RegistryClosed,
}
