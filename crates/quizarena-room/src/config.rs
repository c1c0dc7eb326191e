//! Room configuration, settings clamping, and the phase machine.

use std::time::Duration;

use quizarena_protocol::{BotDifficulty, GameMode, RoomOptions, RoomSettings};
use serde::{Deserialize, Serialize};

use crate::{BotPolicy, ScoringRule};

/// Seconds allowed per question.
pub const TIME_PER_QUESTION_SECS: std::ops::RangeInclusive<u64> = 5..=60;
pub const DEFAULT_TIME_PER_QUESTION_SECS: u64 = 15;

/// Questions per game.
pub const TOTAL_QUESTIONS: std::ops::RangeInclusive<u32> = 5..=50;
pub const DEFAULT_TOTAL_QUESTIONS: u32 = 10;

/// Seats in a multiplayer room.
pub const MULTIPLAYER_CAPACITY: std::ops::RangeInclusive<usize> = 2..=8;

/// Wildcard category meaning "any".
pub const ANY_CATEGORY: &str = "all";

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Server-side knobs shared by every room the registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub scoring: ScoringRule,
    pub bot_policy: BotPolicy,
    /// Capacity of each room actor's mailbox.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringRule::default(),
            bot_policy: BotPolicy::default(),
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The settings a fresh room of `mode` starts with.
pub fn default_settings(mode: GameMode) -> RoomSettings {
    RoomSettings {
        mode,
        bot_count: 0,
        bot_difficulty: BotDifficulty::default(),
        categories: vec![ANY_CATEGORY.to_string()],
        time_per_question_secs: DEFAULT_TIME_PER_QUESTION_SECS,
        total_questions: DEFAULT_TOTAL_QUESTIONS,
        max_participants: mode_capacity(mode),
    }
}

fn mode_capacity(mode: GameMode) -> usize {
    match mode {
        GameMode::Solo => 1,
        GameMode::HeadToHead => 2,
        GameMode::Multiplayer => *MULTIPLAYER_CAPACITY.end(),
    }
}

/// Applies host options on top of `base`.
///
/// Missing fields keep their value from `base`, out-of-range values are
/// clamped, and mode constraints are enforced last. `humans` is the number
/// of humans already seated; capacity never drops below it and bots only
/// fill the seats that are left.
pub fn resolve_settings(base: &RoomSettings, options: &RoomOptions, humans: usize) -> RoomSettings {
    let mode = options.mode.unwrap_or(base.mode);
    let mode_changed = mode != base.mode;

    let time_per_question_secs = options
        .time_per_question
        .unwrap_or(base.time_per_question_secs)
        .clamp(*TIME_PER_QUESTION_SECS.start(), *TIME_PER_QUESTION_SECS.end());
    let total_questions = options
        .total_questions
        .unwrap_or(base.total_questions)
        .clamp(*TOTAL_QUESTIONS.start(), *TOTAL_QUESTIONS.end());

    let categories = match &options.categories {
        Some(requested) => normalize_categories(requested),
        None => base.categories.clone(),
    };

    let max_participants = match mode {
        GameMode::Solo | GameMode::HeadToHead => mode_capacity(mode),
        GameMode::Multiplayer => {
            let fallback = if mode_changed {
                mode_capacity(mode)
            } else {
                base.max_participants
            };
            options
                .max_participants
                .unwrap_or(fallback)
                .clamp(*MULTIPLAYER_CAPACITY.start(), *MULTIPLAYER_CAPACITY.end())
                .max(humans)
        }
    };

    let requested_bots = options.bot_count.unwrap_or(base.bot_count) as usize;
    let bot_count = match mode {
        GameMode::Solo => 0,
        _ => requested_bots.min(max_participants.saturating_sub(humans.max(1))),
    } as u32;

    RoomSettings {
        mode,
        bot_count,
        bot_difficulty: options.bot_difficulty.unwrap_or(base.bot_difficulty),
        categories,
        time_per_question_secs,
        total_questions,
        max_participants,
    }
}

/// Trims, lowercases and dedups category names. An empty list, or one
/// naming the wildcard, becomes `["all"]`.
fn normalize_categories(requested: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in requested {
        let name = raw.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        if name == ANY_CATEGORY {
            return vec![ANY_CATEGORY.to_string()];
        }
        if !out.contains(&name) {
            out.push(name);
        }
    }
    if out.is_empty() {
        out.push(ANY_CATEGORY.to_string());
    }
    out
}

// ---------------------------------------------------------------------------
// ModePolicy
// ---------------------------------------------------------------------------

/// Whose answers a question waits for before revealing early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerGate {
    /// Connected humans only.
    HumansOnly,
    /// Every connected participant, bots included.
    Everyone,
}

/// The per-mode rules one engine is parameterized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    /// Participants (humans plus bots) needed to start, and to keep going.
    pub min_participants: usize,
    pub gate: AnswerGate,
    /// Pause between a reveal and the next question.
    pub reveal_delay: Duration,
}

impl ModePolicy {
    pub fn for_settings(settings: &RoomSettings) -> Self {
        match settings.mode {
            GameMode::Solo => Self {
                min_participants: 1,
                gate: AnswerGate::HumansOnly,
                reveal_delay: Duration::from_secs(2),
            },
            GameMode::HeadToHead => Self {
                min_participants: 2,
                gate: AnswerGate::Everyone,
                reveal_delay: if settings.bot_count > 0 {
                    Duration::from_secs(2)
                } else {
                    Duration::from_secs(5)
                },
            },
            GameMode::Multiplayer => Self {
                min_participants: 2,
                gate: AnswerGate::HumansOnly,
                reveal_delay: Duration::from_secs(5),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room. The single authoritative state field.
///
/// ```text
/// Waiting → InQuestion ⇄ Revealing
///               │           │
///               └───────────┴──→ Finished
/// ```
///
/// `Finished` is terminal. An active game can jump straight to it when
/// too many participants leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    InQuestion,
    Revealing,
    Finished,
}

impl Phase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while a game is being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InQuestion | Self::Revealing)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        use Phase::*;
        matches!(
            (self, target),
            (Waiting, InQuestion)
                | (InQuestion, Revealing)
                | (InQuestion, Finished)
                | (Revealing, InQuestion)
                | (Revealing, Finished)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::InQuestion => write!(f, "InQuestion"),
            Self::Revealing => write!(f, "Revealing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> RoomOptions {
        RoomOptions::default()
    }

    #[test]
    fn test_phase_can_transition_to() {
        assert!(Phase::Waiting.can_transition_to(Phase::InQuestion));
        assert!(Phase::Revealing.can_transition_to(Phase::InQuestion));
        assert!(Phase::InQuestion.can_transition_to(Phase::Finished));
        assert!(!Phase::Waiting.can_transition_to(Phase::Revealing));
        assert!(!Phase::Finished.can_transition_to(Phase::Waiting));
        assert!(!Phase::Finished.can_transition_to(Phase::InQuestion));
    }

    #[test]
    fn test_phase_is_joinable_only_while_waiting() {
        assert!(Phase::Waiting.is_joinable());
        assert!(!Phase::InQuestion.is_joinable());
        assert!(!Phase::Revealing.is_joinable());
        assert!(!Phase::Finished.is_joinable());
    }

    #[test]
    fn test_resolve_settings_clamps_time_and_count() {
        let base = default_settings(GameMode::Multiplayer);
        let opts = RoomOptions {
            time_per_question: Some(1),
            total_questions: Some(500),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 1);
        assert_eq!(s.time_per_question_secs, 5);
        assert_eq!(s.total_questions, 50);

        let opts = RoomOptions {
            time_per_question: Some(600),
            total_questions: Some(0),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 1);
        assert_eq!(s.time_per_question_secs, 60);
        assert_eq!(s.total_questions, 5);
    }

    #[test]
    fn test_resolve_settings_missing_fields_keep_base() {
        let mut base = default_settings(GameMode::Multiplayer);
        base.time_per_question_secs = 20;
        let s = resolve_settings(&base, &options(), 1);
        assert_eq!(s, base);
    }

    #[test]
    fn test_resolve_settings_solo_has_no_bots() {
        let base = default_settings(GameMode::Multiplayer);
        let opts = RoomOptions {
            mode: Some(GameMode::Solo),
            bot_count: Some(3),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 1);
        assert_eq!(s.bot_count, 0);
        assert_eq!(s.max_participants, 1);
    }

    #[test]
    fn test_resolve_settings_head_to_head_allows_one_bot() {
        let base = default_settings(GameMode::Multiplayer);
        let opts = RoomOptions {
            mode: Some(GameMode::HeadToHead),
            bot_count: Some(4),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 1);
        assert_eq!(s.max_participants, 2);
        assert_eq!(s.bot_count, 1);
    }

    #[test]
    fn test_resolve_settings_bots_fill_only_free_seats() {
        let base = default_settings(GameMode::Multiplayer);
        let opts = RoomOptions {
            max_participants: Some(4),
            bot_count: Some(7),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 3);
        assert_eq!(s.max_participants, 4);
        assert_eq!(s.bot_count, 1);
    }

    #[test]
    fn test_resolve_settings_capacity_never_below_seated_humans() {
        let base = default_settings(GameMode::Multiplayer);
        let opts = RoomOptions {
            max_participants: Some(2),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 5);
        assert_eq!(s.max_participants, 5);
    }

    #[test]
    fn test_resolve_settings_switching_back_to_multiplayer_restores_capacity() {
        let solo = default_settings(GameMode::Solo);
        let opts = RoomOptions {
            mode: Some(GameMode::Multiplayer),
            ..options()
        };
        let s = resolve_settings(&solo, &opts, 1);
        assert_eq!(s.max_participants, 8);
    }

    #[test]
    fn test_categories_normalized_and_wildcard_wins() {
        let base = default_settings(GameMode::Multiplayer);
        let opts = RoomOptions {
            categories: Some(vec![" Science ".into(), "science".into(), "History".into()]),
            ..options()
        };
        let s = resolve_settings(&base, &opts, 1);
        assert_eq!(s.categories, vec!["science".to_string(), "history".to_string()]);

        let opts = RoomOptions {
            categories: Some(vec!["science".into(), "ALL".into()]),
            ..options()
        };
        assert_eq!(resolve_settings(&base, &opts, 1).categories, vec!["all".to_string()]);

        let opts = RoomOptions {
            categories: Some(vec![]),
            ..options()
        };
        assert_eq!(resolve_settings(&base, &opts, 1).categories, vec!["all".to_string()]);
    }

    #[test]
    fn test_mode_policy_reveal_delays() {
        let solo = default_settings(GameMode::Solo);
        assert_eq!(ModePolicy::for_settings(&solo).reveal_delay, Duration::from_secs(2));

        let mut h2h = default_settings(GameMode::HeadToHead);
        assert_eq!(ModePolicy::for_settings(&h2h).reveal_delay, Duration::from_secs(5));
        h2h.bot_count = 1;
        assert_eq!(ModePolicy::for_settings(&h2h).reveal_delay, Duration::from_secs(2));
        assert_eq!(ModePolicy::for_settings(&h2h).gate, AnswerGate::Everyone);

        let multi = default_settings(GameMode::Multiplayer);
        let policy = ModePolicy::for_settings(&multi);
        assert_eq!(policy.reveal_delay, Duration::from_secs(5));
        assert_eq!(policy.min_participants, 2);
        assert_eq!(policy.gate, AnswerGate::HumansOnly);
    }
}
