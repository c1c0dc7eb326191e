/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The protocol handshake with a new peer failed.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake {
        peer: std::net::SocketAddr,
        reason: String,
    },
}

impl TransportError {
    /// `true` for errors that concern one peer only. The listener is
    /// still usable after them.
    pub fn is_per_connection(&self) -> bool {
        matches!(self, Self::Handshake { .. } | Self::SendFailed(_) | Self::ReceiveFailed(_))
    }
}
