//! Per-connection handler: greeting, event routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign a `PlayerId` and send `welcome`
//!   2. Spawn a writer task that drains the player's outbound channel
//!   3. Loop: receive envelopes → dispatch to the registry or a room
//!   4. On close or idle timeout, disconnect the player from its room

use std::sync::Arc;
use std::time::Duration;

use quizarena_protocol::{ClientEvent, Codec, Envelope, PlayerId, ServerEvent};
use quizarena_room::{
    PlayerSender, QuestionProvider, QueueStatus, QueuedPlayer, RoomError, sanitize_name,
};
use quizarena_transport::{Connection, FrameSink, FrameStream, WebSocketConnection};
use tokio::sync::mpsc;

use crate::QuizarenaError;
use crate::server::ServerState;

/// How long a closing connection may keep flushing queued events.
const WRITER_GRACE: Duration = Duration::from_secs(5);

/// Drop guard that takes a player out of its room and the match queue
/// when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task to tell the room.
struct PlayerGuard<P: QuestionProvider, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<P, C>>,
}

impl<P: QuestionProvider, C: Codec> Drop for PlayerGuard<P, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        self.state.queue.cancel(player_id);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let room = state.rooms.disconnect(player_id).await;
            tracing::debug!(%player_id, room_id = ?room, "player cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<P, C>>,
) -> Result<(), QuizarenaError>
where
    P: QuestionProvider,
    C: Codec + Clone,
{
    let conn_id = conn.id();
    let player_id = state.assign_player_id();
    tracing::info!(%conn_id, %player_id, peer = %conn.peer_addr(), "player connected");

    let (sink, mut stream) = conn.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(sink, rx, Arc::clone(&state), player_id));

    let _ = tx.send(ServerEvent::Welcome {
        player_id,
        server_time: state.server_time(),
    });
    let guard = PlayerGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let result = read_frames(&mut stream, &state, player_id, &tx).await;

    drop(guard);
    drop(tx);
    // The room drops its copy of the sender on disconnect; give the writer
    // a moment to flush, then stop it regardless.
    let abort = writer.abort_handle();
    if tokio::time::timeout(WRITER_GRACE, writer).await.is_err() {
        tracing::debug!(%player_id, "writer did not finish in time");
        abort.abort();
    }
    result
}

/// Reads frames until the peer closes, errors, or goes idle.
async fn read_frames<P, C, S>(
    stream: &mut S,
    state: &Arc<ServerState<P, C>>,
    player_id: PlayerId,
    tx: &PlayerSender,
) -> Result<(), QuizarenaError>
where
    P: QuestionProvider,
    C: Codec,
    S: FrameStream,
{
    loop {
        let data = match tokio::time::timeout(state.config.idle_timeout, stream.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Err(e.into());
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                return Ok(());
            }
        };

        let envelope: Envelope<ClientEvent> = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                let _ = tx.send(ServerEvent::error(400, format!("invalid message: {e}")));
                continue;
            }
        };
        tracing::trace!(%player_id, seq = envelope.seq, "frame received");

        if let Err(e) = dispatch(state, player_id, tx, envelope.event).await {
            tracing::debug!(%player_id, error = %e, "request rejected");
            let _ = tx.send(ServerEvent::error(e.code(), e.to_string()));
        }
    }
}

/// Encodes outbound events into envelopes and writes them to the socket.
///
/// Ends when every sender for this player is gone or the socket fails.
async fn write_frames<P, C, S>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    state: Arc<ServerState<P, C>>,
    player_id: PlayerId,
) where
    C: Codec,
    S: FrameSink,
{
    let mut seq: u64 = 1;
    while let Some(event) = rx.recv().await {
        let envelope = Envelope::new(next_seq(&mut seq), state.server_time(), event);
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = sink.send(bytes).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            return;
        }
    }
    let _ = sink.close().await;
}

/// Routes one client event. Replies that are not room broadcasts go
/// straight to `tx`.
async fn dispatch<P, C>(
    state: &Arc<ServerState<P, C>>,
    player_id: PlayerId,
    tx: &PlayerSender,
    event: ClientEvent,
) -> Result<(), RoomError>
where
    P: QuestionProvider,
    C: Codec,
{
    match event {
        ClientEvent::CreateRoom { host_name, options } => {
            let room_id = state
                .rooms
                .create_room(player_id, &host_name, &options, tx.clone())?;
            state.queue.cancel(player_id);
            tracing::debug!(%player_id, %room_id, "create_room handled");
        }

        ClientEvent::JoinRoom {
            room_id,
            player_name,
        } => {
            state
                .rooms
                .join_room(room_id, player_id, &player_name, tx.clone())
                .await?;
            state.queue.cancel(player_id);
        }

        ClientEvent::ConfigureRoom { room_id, options } => {
            state
                .rooms
                .handle_for(player_id, room_id)?
                .configure(player_id, options)
                .await?;
        }

        ClientEvent::StartGame { room_id } => {
            state
                .rooms
                .handle_for(player_id, room_id)?
                .start(player_id)
                .await?;
        }

        ClientEvent::SubmitAnswer {
            room_id,
            answer,
            question_index,
            ..
        } => {
            state
                .rooms
                .handle_for(player_id, room_id)?
                .submit(player_id, question_index, answer)
                .await?;
        }

        ClientEvent::UseLifeline { room_id, lifeline } => {
            state
                .rooms
                .handle_for(player_id, room_id)?
                .use_lifeline(player_id, lifeline)
                .await?;
        }

        ClientEvent::LeaveRoom { room_id } => {
            state.rooms.handle_for(player_id, room_id)?;
            state.rooms.leave_room(player_id).await?;
        }

        ClientEvent::ListRooms => {
            let rooms = state.rooms.list_rooms().await;
            let _ = tx.send(ServerEvent::RoomList { rooms });
        }

        ClientEvent::QueueMatch { player_name } => {
            if let Some(room_id) = state.rooms.player_room(player_id) {
                return Err(RoomError::AlreadyInRoom(player_id, room_id));
            }
            let player = QueuedPlayer {
                player_id,
                name: sanitize_name(&player_name, player_id),
                sender: tx.clone(),
            };
            match state.queue.enqueue(player) {
                QueueStatus::Queued { position } => {
                    let _ = tx.send(ServerEvent::Queued { position });
                }
                QueueStatus::AlreadyQueued => {
                    return Err(RoomError::InvalidState("already waiting for a match".into()));
                }
                QueueStatus::Matched(first, second) => start_match(state, first, second).await?,
            }
        }

        ClientEvent::CancelQueue => {
            if !state.queue.cancel(player_id) {
                return Err(RoomError::InvalidState("not waiting for a match".into()));
            }
            let _ = tx.send(ServerEvent::QueueCancelled);
        }

        ClientEvent::Heartbeat { client_time } => {
            let _ = tx.send(ServerEvent::HeartbeatAck {
                client_time,
                server_time: state.server_time(),
            });
        }
    }
    Ok(())
}

/// Seats a matched pair in a new head-to-head room and starts it.
async fn start_match<P: QuestionProvider, C>(
    state: &Arc<ServerState<P, C>>,
    first: QueuedPlayer,
    second: QueuedPlayer,
) -> Result<(), RoomError> {
    let host = first.player_id;
    let first_tx = first.sender.clone();
    let second_tx = second.sender.clone();
    let (first_name, second_name) = (first.name.clone(), second.name.clone());

    let room_id = match state.rooms.create_match(first, second).await {
        Ok(room_id) => room_id,
        Err(e) => {
            let _ = first_tx.send(ServerEvent::error(e.code(), e.to_string()));
            return Err(e);
        }
    };
    let handle = state.rooms.handle_for(host, room_id)?;

    let _ = first_tx.send(ServerEvent::MatchFound {
        room_id,
        opponent: second_name,
    });
    let _ = second_tx.send(ServerEvent::MatchFound {
        room_id,
        opponent: first_name,
    });
    tracing::info!(%room_id, %host, "match room created");

    if let Err(e) = handle.start(host).await {
        tracing::warn!(%room_id, error = %e, "match room failed to start");
        let _ = first_tx.send(ServerEvent::error(e.code(), e.to_string()));
        let _ = second_tx.send(ServerEvent::error(e.code(), e.to_string()));
    }
    Ok(())
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
