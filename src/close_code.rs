/// RFC 6455 §7.4 close status codes.
///
/// `NoCode`, `ClosedAbnormally` and `TlsHandshakeFailure` are reserved for
/// local signalling — they must never appear on the wire, and
/// [`crate::codec::write_close`] rejects attempts to send them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Normal,
    GoingAway,
    ProtocolError,
    UnacceptableData,
    NoCode,
    ClosedAbnormally,
    InconsistentData,
    PolicyViolation,
    MessageTooBig,
    ExtensionNegotiationFailure,
    UnexpectedCondition,
    TlsHandshakeFailure,
    /// Any other (application-defined or unrecognized) code, carried verbatim.
    Other(u16),
}

impl CloseCode {
    /// Codes that must never be written to the wire (RFC 6455 §7.4.1).
    pub fn is_reserved_local(&self) -> bool {
        matches!(
            self,
            CloseCode::NoCode | CloseCode::ClosedAbnormally | CloseCode::TlsHandshakeFailure
        )
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnacceptableData,
            1005 => CloseCode::NoCode,
            1006 => CloseCode::ClosedAbnormally,
            1007 => CloseCode::InconsistentData,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::ExtensionNegotiationFailure,
            1011 => CloseCode::UnexpectedCondition,
            1015 => CloseCode::TlsHandshakeFailure,
            other => CloseCode::Other(other),
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> u16 {
        match code {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnacceptableData => 1003,
            CloseCode::NoCode => 1005,
            CloseCode::ClosedAbnormally => 1006,
            CloseCode::InconsistentData => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::ExtensionNegotiationFailure => 1010,
            CloseCode::UnexpectedCondition => 1011,
            CloseCode::TlsHandshakeFailure => 1015,
            CloseCode::Other(code) => code,
        }
    }
}
