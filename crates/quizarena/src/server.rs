//! `QuizarenaServer` builder and server loop.
//!
//! This is the entry point for running a trivia server. It ties together
//! all the layers: transport → protocol → room.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use quizarena_protocol::{Codec, JsonCodec, PlayerId};
use quizarena_room::{
    MatchQueue, NullRecorder, QuestionProvider, RoomConfig, RoomRegistry, ScoreRecorder,
};
use quizarena_transport::{Transport, WebSocketTransport};
use tokio::time::Instant;

use crate::handler::handle_connection;
use crate::{QuizarenaError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry locks its own room map briefly and never while waiting on a
/// room, so handlers share it directly.
pub(crate) struct ServerState<P, C> {
    pub(crate) rooms: RoomRegistry<P>,
    pub(crate) queue: MatchQueue,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
    next_player_id: AtomicU64,
    started: Instant,
}

impl<P, C> ServerState<P, C> {
    /// Hands out connection-scoped player ids, starting at 1.
    pub(crate) fn assign_player_id(&self) -> PlayerId {
        PlayerId(self.next_player_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Milliseconds since the server started.
    pub(crate) fn server_time(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Quizarena server.
///
/// # Example
///
/// ```rust,ignore
/// use quizarena::prelude::*;
///
/// let server = QuizarenaServer::builder()
///     .bind("0.0.0.0:8080")
///     .recorder(Arc::new(MemoryLeaderboard::default()))
///     .build(InMemoryQuestionBank::from_json(&json)?)
///     .await?;
/// server.run().await
/// ```
pub struct QuizarenaServerBuilder {
    config: ServerConfig,
    recorder: Arc<dyn ScoreRecorder>,
}

impl QuizarenaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            recorder: Arc::new(NullRecorder),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn room_retention(mut self, retention: Duration) -> Self {
        self.config.room_retention = retention;
        self
    }

    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Where final scores of finished games go. Discarded by default.
    pub fn recorder(mut self, recorder: Arc<dyn ScoreRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Binds the listener and builds the server around `provider`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<P: QuestionProvider>(
        self,
        provider: P,
    ) -> Result<QuizarenaServer<P, JsonCodec>, QuizarenaError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let registry = RoomRegistry::new(Arc::new(provider))
            .with_recorder(self.recorder)
            .with_config(self.config.room.clone());

        let state = Arc::new(ServerState {
            rooms: registry,
            queue: MatchQueue::new(),
            codec: JsonCodec,
            config: self.config,
            next_player_id: AtomicU64::new(1),
            started: Instant::now(),
        });

        Ok(QuizarenaServer { transport, state })
    }
}

impl Default for QuizarenaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quizarena server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizarenaServer<P, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<P, C>>,
}

impl QuizarenaServer<(), JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> QuizarenaServerBuilder {
        QuizarenaServerBuilder::new()
    }
}

impl<P, C> QuizarenaServer<P, C>
where
    P: QuestionProvider,
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, QuizarenaError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Starts the finished-room reaper, then accepts incoming connections
    /// and spawns a handler task for each. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), QuizarenaError> {
        tracing::info!(addr = %self.local_addr()?, "Quizarena server running");
        let reaper = tokio::spawn(reap_rooms(Arc::clone(&self.state)));
        let _reaper = AbortOnDrop(reaper.abort_handle());

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) if e.is_per_connection() => {
                    tracing::debug!(error = %e, "connection rejected");
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodically destroys finished rooms past their retention window.
async fn reap_rooms<P: QuestionProvider, C>(state: Arc<ServerState<P, C>>) {
    let mut interval = tokio::time::interval(state.config.reaper_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let reaped = state.rooms.reap_finished(state.config.room_retention).await;
        tracing::trace!(reaped, "reaper pass");
    }
}

struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
