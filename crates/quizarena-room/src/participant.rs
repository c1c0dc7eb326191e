//! Participants: the humans and bots seated in a room.

use std::collections::HashSet;
use std::time::Duration;

use quizarena_protocol::{BotDifficulty, Lifeline, ParticipantView, PlayerId};

/// Longest display name kept, in characters.
pub const MAX_NAME_CHARS: usize = 24;

/// What a bot brings to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotProfile {
    pub difficulty: BotDifficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    Human,
    Bot(BotProfile),
}

/// A participant's answer to the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSlot {
    Unanswered,
    Answered { value: String, elapsed: Duration },
    TimedOut,
}

impl AnswerSlot {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Unanswered)
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    pub kind: ParticipantKind,
    pub score: u32,
    pub slot: AnswerSlot,
    pub connected: bool,
    pub lifelines_used: HashSet<Lifeline>,
}

impl Participant {
    pub fn human(id: PlayerId, name: &str) -> Self {
        Self::new(id, sanitize_name(name, id), ParticipantKind::Human)
    }

    pub fn bot(id: PlayerId, name: String, difficulty: BotDifficulty) -> Self {
        Self::new(id, name, ParticipantKind::Bot(BotProfile { difficulty }))
    }

    fn new(id: PlayerId, name: String, kind: ParticipantKind) -> Self {
        Self {
            id,
            name,
            kind,
            score: 0,
            slot: AnswerSlot::Unanswered,
            connected: true,
            lifelines_used: HashSet::new(),
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.kind, ParticipantKind::Bot(_))
    }

    pub fn has_answered(&self) -> bool {
        self.slot.is_settled()
    }

    /// Records an answer. Returns `false`, leaving the slot untouched, if
    /// this question was already answered or timed out.
    pub fn submit_answer(&mut self, value: String, elapsed: Duration) -> bool {
        if self.slot.is_settled() {
            return false;
        }
        self.slot = AnswerSlot::Answered { value, elapsed };
        true
    }

    /// Records a timeout under the same once-only rule.
    pub fn record_timeout(&mut self) -> bool {
        if self.slot.is_settled() {
            return false;
        }
        self.slot = AnswerSlot::TimedOut;
        true
    }

    pub fn reset_for_next_question(&mut self) {
        self.slot = AnswerSlot::Unanswered;
    }

    /// Clears score, answer, and spent lifelines for a new game.
    pub fn reset_for_game(&mut self) {
        self.score = 0;
        self.slot = AnswerSlot::Unanswered;
        self.lifelines_used.clear();
    }

    pub fn view(&self, host_id: PlayerId) -> ParticipantView {
        ParticipantView {
            player_id: self.id,
            name: self.name.clone(),
            is_bot: self.is_bot(),
            is_host: self.id == host_id,
            connected: self.connected,
            score: self.score,
        }
    }
}

/// Trims a display name and caps its length. Blank names become
/// `Player <id>`.
pub fn sanitize_name(raw: &str, id: PlayerId) -> String {
    let trimmed: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_CHARS)
        .collect();
    let trimmed = trimmed.trim_end().to_string();
    if trimmed.is_empty() {
        format!("Player {}", id.0)
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_answer_accepted_once() {
        let mut p = Participant::human(PlayerId(1), "ana");
        assert!(p.submit_answer("Lima".into(), Duration::from_secs(2)));
        assert!(!p.submit_answer("Quito".into(), Duration::from_secs(3)));
        assert_eq!(
            p.slot,
            AnswerSlot::Answered {
                value: "Lima".into(),
                elapsed: Duration::from_secs(2)
            }
        );
    }

    #[test]
    fn test_timeout_after_answer_is_ignored() {
        let mut p = Participant::human(PlayerId(1), "ana");
        p.submit_answer("Lima".into(), Duration::from_secs(2));
        assert!(!p.record_timeout());
        assert!(matches!(p.slot, AnswerSlot::Answered { .. }));
    }

    #[test]
    fn test_answer_after_timeout_is_ignored() {
        let mut p = Participant::human(PlayerId(1), "ana");
        assert!(p.record_timeout());
        assert!(!p.submit_answer("Lima".into(), Duration::from_secs(1)));
        assert_eq!(p.slot, AnswerSlot::TimedOut);
    }

    #[test]
    fn test_reset_for_next_question_reopens_slot() {
        let mut p = Participant::human(PlayerId(1), "ana");
        p.record_timeout();
        p.reset_for_next_question();
        assert!(!p.has_answered());
    }

    #[test]
    fn test_sanitize_name_trims_and_caps() {
        assert_eq!(sanitize_name("  ana  ", PlayerId(1)), "ana");
        let long = "x".repeat(40);
        assert_eq!(sanitize_name(&long, PlayerId(1)).chars().count(), MAX_NAME_CHARS);
        assert_eq!(sanitize_name("   ", PlayerId(9)), "Player 9");
    }

    #[test]
    fn test_view_marks_host_and_bots() {
        let human = Participant::human(PlayerId(1), "ana");
        let bot = Participant::bot(PlayerId::bot(0), "Quizbot Ada".into(), BotDifficulty::Hard);
        assert!(human.view(PlayerId(1)).is_host);
        assert!(!bot.view(PlayerId(1)).is_host);
        assert!(bot.view(PlayerId(1)).is_bot);
    }
}
