//! Trivia rooms for Quizarena.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns a
//! [`GameRoom`] state machine, its participants, and its clock.
//!
//! # Key types
//!
//! - [`GameRoom`]: the pure rules: phases, answers, scoring, departures
//! - [`RoomRegistry`]: creates/destroys rooms, routes players
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`MatchQueue`]: pairs players for head-to-head games
//! - [`QuestionProvider`] / [`ScoreRecorder`]: the outside world

mod bot;
mod config;
mod engine;
mod error;
mod manager;
mod matchmaking;
mod outcome;
mod participant;
mod question;
mod recorder;
mod room;
mod scoring;

pub use bot::{BotChoice, BotPolicy, BotTuning};
pub use config::{
    default_settings, resolve_settings, AnswerGate, ModePolicy, Phase, RoomConfig,
};
pub use engine::{Departure, Effect, GameRoom, StartRequest};
pub use error::{ProviderError, RoomError};
pub use manager::RoomRegistry;
pub use matchmaking::{MatchQueue, QueueStatus, QueuedPlayer};
pub use outcome::{determine_outcome, sort_standings};
pub use participant::{AnswerSlot, BotProfile, Participant, ParticipantKind, sanitize_name};
pub use question::{InMemoryQuestionBank, Question, QuestionProvider};
pub use recorder::{MemoryLeaderboard, NullRecorder, ScoreRecord, ScoreRecorder};
pub use room::{PlayerSender, RoomHandle, RoomInfo};
pub use scoring::ScoringRule;
