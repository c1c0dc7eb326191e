//! Errors raised while encoding or decoding frames.

/// Failures of the protocol layer.
///
/// A `ProtocolError` always means the bytes were the problem. The
/// connection handler answers a decode failure with an error event and
/// keeps the connection open.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An outbound value could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was malformed, named an unknown event, or was
    /// missing a field.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A frame decoded but is not acceptable, e.g. a binary frame that is
    /// not UTF-8.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
