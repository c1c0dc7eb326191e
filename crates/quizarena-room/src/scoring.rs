//! Time-based scoring.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Points for a correct answer fall linearly from `ceiling` at zero
/// elapsed time to `floor` at the deadline:
///
/// ```text
/// points = max(floor, ceiling - (ceiling - floor) * elapsed / duration)
/// ```
///
/// Computed in whole milliseconds so equal inputs always give equal
/// scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub floor: u32,
    pub ceiling: u32,
}

impl Default for ScoringRule {
    fn default() -> Self {
        Self {
            floor: 10,
            ceiling: 100,
        }
    }
}

impl ScoringRule {
    /// Points for a correct answer given after `elapsed` of a question
    /// lasting `duration`.
    pub fn points(&self, elapsed: Duration, duration: Duration) -> u32 {
        let duration_ms = duration.as_millis();
        if duration_ms == 0 {
            return self.ceiling;
        }
        let elapsed_ms = elapsed.as_millis().min(duration_ms);
        let span = u128::from(self.ceiling.saturating_sub(self.floor));
        let lost = span * elapsed_ms / duration_ms;
        let points = u128::from(self.ceiling).saturating_sub(lost);
        points.max(u128::from(self.floor)) as u32
    }

    /// Points for an answer that may be wrong. Wrong answers earn nothing.
    pub fn award(&self, correct: bool, elapsed: Duration, duration: Duration) -> u32 {
        if correct { self.points(elapsed, duration) } else { 0 }
    }
}
