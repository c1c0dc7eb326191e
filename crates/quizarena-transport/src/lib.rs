//! Transport abstraction layer for Quizarena.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the network protocol that carries frames to players.
//!
//! A connection is split into a [`FrameSink`] and a [`FrameStream`] right
//! after it is accepted, so that a writer task and a reader task can own
//! one half each without sharing a lock.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketSink, WebSocketStream, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    ///
    /// A failed handshake is an error for that one connection only; the
    /// transport keeps listening.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// The address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// A freshly accepted connection, not yet split.
pub trait Connection: Send + 'static {
    type Sink: FrameSink;
    type Stream: FrameStream;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// The remote address of the peer.
    fn peer_addr(&self) -> SocketAddr;

    /// Splits the connection into its sending and receiving halves.
    fn split(self) -> (Self::Sink, Self::Stream);
}

/// The sending half of a connection.
pub trait FrameSink: Send + 'static {
    /// Sends one frame. Valid UTF-8 goes out as a text frame, anything
    /// else as binary.
    fn send(&mut self, data: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a close frame and flushes.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// The receiving half of a connection.
pub trait FrameStream: Send + 'static {
    /// Receives the next data frame. Control frames are skipped.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;
}
