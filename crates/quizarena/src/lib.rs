//! # Quizarena
//!
//! Real-time multiplayer trivia server.
//!
//! Players connect over WebSocket, gather in rooms, and race through timed
//! multiple-choice questions against each other or against bots. Every
//! room runs as its own actor; this crate wires rooms to connections.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizarena::prelude::*;
//!
//! # async fn serve() -> Result<(), QuizarenaError> {
//! quizarena::init_logging("info");
//! let bank = InMemoryQuestionBank::from_json(r#"[
//!     { "prompt": "2 + 2?", "correct_answer": "4",
//!       "incorrect_answers": ["3", "5", "22"] }
//! ]"#).map_err(RoomError::from)?;
//! let server = QuizarenaServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(bank)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::QuizarenaError;
pub use server::{QuizarenaServer, QuizarenaServerBuilder};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (for example
/// `"info"` or `"quizarena_room=debug"`) is used. Calling this twice is
/// harmless: the second call leaves the first subscriber in place.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub mod prelude {
    pub use crate::{QuizarenaError, QuizarenaServer, QuizarenaServerBuilder, ServerConfig};
    pub use quizarena_protocol::{
        BotDifficulty, ClientEvent, Envelope, GameMode, Lifeline, PlayerId, RoomId,
        RoomOptions, ServerEvent,
    };
    pub use quizarena_room::{
        InMemoryQuestionBank, MemoryLeaderboard, ProviderError, Question, QuestionProvider,
        RoomConfig, RoomError, ScoreRecord, ScoreRecorder,
    };
}
