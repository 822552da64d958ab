/// Tunables for the frame codec and receive loop. No extension-negotiation
/// fields are carried here — permessage-deflate and friends are out of scope.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketConfig {
    /// Upper bound on a single frame's payload length, checked as soon as the
    /// length field is decoded (before the payload itself is read).
    pub max_frame_size: usize,
    /// Upper bound on a fully reassembled message, checked as each
    /// continuation fragment is appended.
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            max_frame_size: 16 << 20,
            max_message_size: 64 << 20,
        }
    }
}
