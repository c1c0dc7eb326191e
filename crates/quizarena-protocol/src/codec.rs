//! Turning envelopes into frames and back.
//!
//! The rest of the server only ever holds typed events. A [`Codec`] sits at
//! the connection edge: the reader decodes `Envelope<ClientEvent>` from each
//! inbound frame, the writer encodes `Envelope<ServerEvent>` for each
//! outbound one.
//!
//! [`JsonCodec`] is the only implementation today. Browsers speak it
//! natively and frames stay readable in DevTools.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a single codec value is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame body.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses a frame body.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] on malformed input, unknown event
    /// names or missing fields.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Enabled by the `json` feature.
///
/// ```rust
/// use quizarena_protocol::{ClientEvent, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{ "seq": 1, "event": { "event": "list_rooms" } }"#;
/// let envelope: Envelope<ClientEvent> = codec.decode(bytes).unwrap();
/// assert_eq!(envelope.event, ClientEvent::ListRooms);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
