//! Named events exchanged between clients and the server.
//!
//! Both enums use `#[serde(tag = "event", rename_all = "snake_case")]`, so
//! a join request looks like:
//!
//! ```json
//! { "event": "join_room", "room_id": 123456, "player_name": "ana" }
//! ```
//!
//! Every frame on the wire is wrapped in an [`Envelope`] carrying a
//! sequence number and a timestamp.

use serde::{Deserialize, Serialize};

use crate::types::{
    Lifeline, Outcome, ParticipantResult, ParticipantView, PlayerId,
    QuestionView, RoomId, RoomListEntry, RoomOptions, RoomSettings, Standing,
};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client can ask for. The sender's identity is implicit
/// (it is the connection the frame arrived on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Open a new room with the sender as host.
    CreateRoom {
        host_name: String,
        #[serde(default)]
        options: RoomOptions,
    },

    /// Join an existing room that is still in its lobby.
    JoinRoom { room_id: RoomId, player_name: String },

    /// Host-only: change the lobby settings.
    ConfigureRoom { room_id: RoomId, options: RoomOptions },

    /// Host-only: load questions and start the game.
    StartGame { room_id: RoomId },

    /// Answer the current question.
    ///
    /// `question_index` lets the server drop answers aimed at a question
    /// that is no longer live. `client_timestamp` is informational only;
    /// timing is always measured on the server.
    SubmitAnswer {
        room_id: RoomId,
        answer: String,
        #[serde(default)]
        question_index: Option<usize>,
        #[serde(default)]
        client_timestamp: Option<u64>,
    },

    /// Spend a lifeline on the current question.
    UseLifeline { room_id: RoomId, lifeline: Lifeline },

    /// Leave the room.
    LeaveRoom { room_id: RoomId },

    /// List rooms that can still be joined.
    ListRooms,

    /// Wait for a head-to-head opponent.
    QueueMatch { player_name: String },

    /// Stop waiting for an opponent.
    CancelQueue,

    /// Keep-alive. Echoed back with the server time.
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First frame on every connection: who you are.
    Welcome { player_id: PlayerId, server_time: u64 },

    /// Sent to the creator of a room.
    RoomCreated {
        room_id: RoomId,
        host_id: PlayerId,
        settings: RoomSettings,
        participants: Vec<ParticipantView>,
    },

    /// Sent to a player who just joined.
    RoomJoined {
        room_id: RoomId,
        host_id: PlayerId,
        settings: RoomSettings,
        participants: Vec<ParticipantView>,
    },

    /// Sent to the other members when someone joins.
    ParticipantJoined { participant: ParticipantView },

    /// Someone left or lost their connection.
    ParticipantLeft { player_id: PlayerId, name: String },

    /// The host role moved.
    HostChanged { host_id: PlayerId },

    /// The lobby settings changed.
    RoomConfigured {
        settings: RoomSettings,
        participants: Vec<ParticipantView>,
    },

    /// Questions are loaded; the first one follows immediately.
    GameStarted {
        total_questions: usize,
        participants: Vec<ParticipantView>,
    },

    /// A question is live. Never carries the correct answer.
    NewQuestion(QuestionView),

    /// Your answer was recorded. `late` means it arrived after the
    /// deadline and was recorded as a timeout.
    AnswerAccepted { question_index: usize, late: bool },

    /// Someone else answered (without saying what).
    ParticipantAnswered {
        question_index: usize,
        player_id: PlayerId,
    },

    /// Your personal result, sent when the answer is revealed.
    AnswerResult {
        question_index: usize,
        correct: bool,
        points: u32,
        score: u32,
        correct_answer: String,
    },

    /// The reveal: correct answer plus everyone's result.
    QuestionResult {
        question_index: usize,
        correct_answer: String,
        results: Vec<ParticipantResult>,
        next_in_secs: u64,
    },

    /// Running scores, highest first.
    ScoreboardUpdate { standings: Vec<Standing> },

    /// Final scores, highest first, and the winner determination.
    GameOver {
        standings: Vec<Standing>,
        outcome: Outcome,
    },

    /// The options hidden by a lifeline, sent to its user only.
    LifelineApplied {
        question_index: usize,
        lifeline: Lifeline,
        removed: Vec<String>,
    },

    /// You are waiting for an opponent.
    Queued { position: usize },

    /// You left the matchmaking queue.
    QueueCancelled,

    /// An opponent was found and both players are seated in `room_id`.
    MatchFound { room_id: RoomId, opponent: String },

    /// Joinable rooms.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Reply to a heartbeat.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// A request was rejected. `code` follows HTTP conventions.
    Error { code: u16, message: String },
}

impl ServerEvent {
    /// Shorthand for building an error event.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The frame wrapper. Every message on the wire is an envelope:
///
/// ```text
/// ┌──────────────────────────────┐
/// │ seq: 42                      │  ← per-direction counter
/// │ timestamp: 15000             │  ← ms since the sender started
/// │ event: { "event": ..., ... } │
/// └──────────────────────────────┘
/// ```
///
/// `seq` and `timestamp` default to 0 so that hand-written test clients
/// can send bare `{ "event": ... }` objects inside an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<E> {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub event: E,
}

impl<E> Envelope<E> {
    pub fn new(seq: u64, timestamp: u64, event: E) -> Self {
        Self {
            seq,
            timestamp,
            event,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
