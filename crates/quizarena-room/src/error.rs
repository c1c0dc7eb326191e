//! Error types for the room layer.

use quizarena_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
///
/// Every variant rejects the request without mutating the room. The
/// connection handler turns them into `error` events using [`code`](Self::code).
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Every participant slot is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player already belongs to a room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not a member of this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// Only the host may do this.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// The game has already started (or finished).
    #[error("room {0} has already started")]
    AlreadyStarted(RoomId),

    /// The room is in a phase that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The provider returned no questions for the requested categories.
    #[error("no questions available for the selected categories")]
    NoQuestions,

    /// The lifeline was already spent this game.
    #[error("lifeline already used")]
    LifelineUsed,

    /// The question provider failed.
    #[error("question provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// HTTP-style status code carried by the outbound `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::RoomFull(_) | Self::AlreadyInRoom(..) | Self::AlreadyStarted(_) => 409,
            Self::LifelineUsed => 409,
            Self::NotInRoom(..) | Self::InvalidState(_) => 400,
            Self::NotHost(_) => 403,
            Self::NoQuestions => 422,
            Self::Provider(_) => 502,
            Self::Unavailable(_) => 503,
        }
    }
}

/// Failures reported by a [`QuestionProvider`](crate::QuestionProvider).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The backing store could not be reached.
    #[error("question source unavailable: {0}")]
    Unavailable(String),

    /// The backing store returned data that isn't a question.
    #[error("malformed question data: {0}")]
    Malformed(String),
}
