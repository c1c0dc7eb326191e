//! Core value types shared by the server and its clients.
//!
//! Everything in this module travels on the wire at some point, so each
//! type derives `Serialize`/`Deserialize` and its JSON shape is pinned by
//! the tests at the bottom of the file.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant (human or bot).
///
/// Humans get ids handed out by the server when their connection is
/// accepted. Bots get ids from a reserved range starting at
/// [`PlayerId::BOT_BASE`], so a bot id can never collide with a human one.
///
/// `#[serde(transparent)]` serializes `PlayerId(42)` as just `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// First id of the range reserved for bots.
    pub const BOT_BASE: u64 = 1 << 40;

    /// Builds the id of the `seq`-th bot of a room.
    pub fn bot(seq: u64) -> Self {
        Self(Self::BOT_BASE + seq)
    }

    /// Returns `true` if this id lies in the bot range.
    pub fn is_bot(self) -> bool {
        self.0 >= Self::BOT_BASE
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bot() {
            write!(f, "B-{}", self.0 - Self::BOT_BASE)
        } else {
            write!(f, "P-{}", self.0)
        }
    }
}

/// A unique identifier for a room.
///
/// Rooms are addressed by a six-digit code that players can read out to
/// each other, so the registry draws it at random (and checks it against
/// live rooms) instead of counting up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl RoomId {
    /// Smallest valid room code.
    pub const MIN: u32 = 100_000;
    /// Largest valid room code.
    pub const MAX: u32 = 999_999;
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an outbound event?
// ---------------------------------------------------------------------------

/// Addresses an outbound event inside a room.
///
/// The room engine never talks to sockets. It returns `(Recipient, event)`
/// pairs and the room actor fans them out to the members' channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member of the room.
    All,

    /// One specific member.
    Player(PlayerId),

    /// Every member except the given one.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Game configuration
// ---------------------------------------------------------------------------

/// How a room is played. One engine serves all three; the mode only
/// selects capacity, the all-answered rule, and the pause between
/// questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// One human, no bots.
    Solo,
    /// Exactly two participants; the second may be a bot.
    HeadToHead,
    /// Up to eight participants, humans and bots mixed.
    #[default]
    Multiplayer,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solo => write!(f, "solo"),
            Self::HeadToHead => write!(f, "head_to_head"),
            Self::Multiplayer => write!(f, "multiplayer"),
        }
    }
}

/// How good a bot is. Maps to an accuracy and a thinking-time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// One-shot helpers a player may spend during a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifeline {
    /// Hides two of the three incorrect options for the current question.
    FiftyFifty,
}

/// Host-supplied room options. Every field is optional; missing fields
/// keep their current value and out-of-range values are clamped, never
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomOptions {
    pub mode: Option<GameMode>,
    pub bot_count: Option<u32>,
    pub bot_difficulty: Option<BotDifficulty>,
    pub categories: Option<Vec<String>>,
    pub time_per_question: Option<u64>,
    pub total_questions: Option<u32>,
    pub max_participants: Option<usize>,
}

/// The effective settings of a room after clamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub mode: GameMode,
    pub bot_count: u32,
    pub bot_difficulty: BotDifficulty,
    pub categories: Vec<String>,
    pub time_per_question_secs: u64,
    pub total_questions: u32,
    pub max_participants: usize,
}

// ---------------------------------------------------------------------------
// Views: what clients get to see
// ---------------------------------------------------------------------------

/// Public view of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub player_id: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub is_host: bool,
    pub connected: bool,
    pub score: u32,
}

/// A question as broadcast to clients.
///
/// Carries no correct answer: the reveal is a
/// separate event ([`ServerEvent::QuestionResult`](crate::ServerEvent)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    /// Zero-based index used by clients to tag their submissions.
    pub question_index: usize,
    /// One-based number for display.
    pub number: usize,
    pub total: usize,
    pub text: String,
    /// All four options in a per-broadcast random order.
    pub options: Vec<String>,
    pub category: String,
    pub duration_secs: u64,
}

/// How one participant fared on one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantResult {
    pub player_id: PlayerId,
    pub name: String,
    /// `None` when the participant timed out.
    pub answer: Option<String>,
    pub correct: bool,
    pub points: u32,
    pub score: u32,
}

/// One line of a scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub score: u32,
}

/// Who won.
///
/// `#[serde(tag = "kind")]` gives `{ "kind": "complete_draw", "score": 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// One participant has the strictly highest score (or is alone).
    Winner {
        player_id: PlayerId,
        name: String,
        score: u32,
    },
    /// Two or more participants, all on the same score.
    CompleteDraw { score: u32 },
    /// Several participants share the top score, others are behind.
    PartialDraw { players: Vec<PlayerId>, score: u32 },
    /// Nobody was left to rank.
    NoParticipants,
}

/// A summary of a joinable room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub mode: GameMode,
    pub host_name: String,
    pub participant_count: usize,
    pub max_participants: usize,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_display_distinguishes_bots() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(PlayerId::bot(2).to_string(), "B-2");
    }

    #[test]
    fn test_bot_ids_never_overlap_human_ids() {
        assert!(PlayerId::bot(0).is_bot());
        assert!(!PlayerId(PlayerId::BOT_BASE - 1).is_bot());
    }

    #[test]
    fn test_room_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RoomId(123_456)).unwrap();
        assert_eq!(json, "123456");
        assert_eq!(RoomId(123_456).to_string(), "R-123456");
    }

    #[test]
    fn test_game_mode_is_snake_case() {
        let json = serde_json::to_string(&GameMode::HeadToHead).unwrap();
        assert_eq!(json, "\"head_to_head\"");
        assert_eq!(GameMode::default(), GameMode::Multiplayer);
    }

    #[test]
    fn test_room_options_missing_fields_default_to_none() {
        let opts: RoomOptions =
            serde_json::from_str(r#"{"time_per_question": 20}"#).unwrap();
        assert_eq!(opts.time_per_question, Some(20));
        assert!(opts.mode.is_none());
        assert!(opts.categories.is_none());
    }

    #[test]
    fn test_outcome_is_internally_tagged() {
        let json = serde_json::to_value(Outcome::CompleteDraw { score: 0 }).unwrap();
        assert_eq!(json["kind"], "complete_draw");
        assert_eq!(json["score"], 0);

        let json = serde_json::to_value(Outcome::Winner {
            player_id: PlayerId(3),
            name: "ana".into(),
            score: 180,
        })
        .unwrap();
        assert_eq!(json["kind"], "winner");
        assert_eq!(json["player_id"], 3);
    }

    #[test]
    fn test_question_view_has_no_correct_answer_field() {
        let view = QuestionView {
            question_index: 0,
            number: 1,
            total: 5,
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
            category: "math".into(),
            duration_secs: 15,
        };
        let json = serde_json::to_value(&view).unwrap();
        let fields: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert!(fields.iter().all(|k| !k.contains("correct")));
    }
}
