//! Simulated opponents.
//!
//! A bot answers through the same submission path as a human. All the
//! bot decides is *what* to answer and *when*; the room schedules the
//! delivery and scores it like any other answer.

use std::ops::RangeInclusive;
use std::time::Duration;

use quizarena_protocol::BotDifficulty;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Accuracy and thinking time for one difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotTuning {
    /// Probability of picking the correct option, `0.0..=1.0`.
    pub accuracy: f64,
    /// Thinking time range in milliseconds.
    pub delay_ms: RangeInclusive<u64>,
}

/// Per-difficulty tuning for every bot in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotPolicy {
    pub easy: BotTuning,
    pub medium: BotTuning,
    pub hard: BotTuning,
}

impl Default for BotPolicy {
    fn default() -> Self {
        Self {
            easy: BotTuning {
                accuracy: 0.4,
                delay_ms: 3_000..=8_000,
            },
            medium: BotTuning {
                accuracy: 0.7,
                delay_ms: 2_000..=6_000,
            },
            hard: BotTuning {
                accuracy: 0.9,
                delay_ms: 1_000..=4_000,
            },
        }
    }
}

/// What a bot will answer, and after how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotChoice {
    pub answer: String,
    pub delay: Duration,
}

impl BotPolicy {
    pub fn tuning(&self, difficulty: BotDifficulty) -> &BotTuning {
        match difficulty {
            BotDifficulty::Easy => &self.easy,
            BotDifficulty::Medium => &self.medium,
            BotDifficulty::Hard => &self.hard,
        }
    }

    /// Picks an answer among `options` and a thinking time.
    ///
    /// With probability `accuracy` the answer is `correct`; otherwise it is
    /// a uniformly chosen wrong option. If `options` holds nothing but the
    /// correct answer, the bot answers correctly.
    pub fn choose<R: Rng>(
        &self,
        options: &[String],
        correct: &str,
        difficulty: BotDifficulty,
        rng: &mut R,
    ) -> BotChoice {
        let tuning = self.tuning(difficulty);
        let delay_ms = if tuning.delay_ms.is_empty() {
            *tuning.delay_ms.start()
        } else {
            rng.random_range(tuning.delay_ms.clone())
        };

        let wrong: Vec<&String> = options.iter().filter(|o| o.as_str() != correct).collect();
        let answer = if rng.random_bool(tuning.accuracy.clamp(0.0, 1.0)) {
            correct.to_string()
        } else {
            match wrong.choose(rng) {
                Some(option) => (*option).clone(),
                None => correct.to_string(),
            }
        };

        BotChoice {
            answer,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Display names handed to bots, in order.
pub(crate) fn bot_name(seq: u64) -> String {
    const NAMES: [&str; 8] = [
        "Quizbot Ada", "Quizbot Blaise", "Quizbot Carl", "Quizbot Dora",
        "Quizbot Emmy", "Quizbot Fermi", "Quizbot Grace", "Quizbot Hedy",
    ];
    NAMES[(seq as usize) % NAMES.len()].to_string()
}
