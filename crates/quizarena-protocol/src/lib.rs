//! Wire protocol for Quizarena.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`PlayerId`], [`RoomId`], [`QuestionView`], [`Outcome`], ...):
//!   identities and the views clients are allowed to see.
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`Envelope`]): the named
//!   events of the game.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or rooms.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<Event>) → Room (game state)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, Envelope, ServerEvent};
pub use types::{
    BotDifficulty, GameMode, Lifeline, Outcome, ParticipantResult,
    ParticipantView, PlayerId, QuestionView, Recipient, RoomId, RoomListEntry,
    RoomOptions, RoomSettings, Standing,
};
