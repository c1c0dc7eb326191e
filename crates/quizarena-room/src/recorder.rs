//! Where final scores go.

use std::sync::Mutex;

use quizarena_protocol::GameMode;

/// One human's final score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub mode: GameMode,
}

/// Persists final scores.
///
/// Called from inside a room actor, so implementations must not block for
/// long. A recorder backed by slow storage should hand records off to its
/// own task.
pub trait ScoreRecorder: Send + Sync + 'static {
    fn record(&self, record: ScoreRecord);
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl ScoreRecorder for NullRecorder {
    fn record(&self, _record: ScoreRecord) {}
}

/// Keeps the best scores in memory.
#[derive(Debug)]
pub struct MemoryLeaderboard {
    capacity: usize,
    entries: Mutex<Vec<ScoreRecord>>,
}

impl MemoryLeaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// The best `n` records, highest score first.
    pub fn top(&self, n: usize) -> Vec<ScoreRecord> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryLeaderboard {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ScoreRecorder for MemoryLeaderboard {
    fn record(&self, record: ScoreRecord) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // Earlier records win ties.
        let at = entries.partition_point(|e| e.score >= record.score);
        if at >= self.capacity {
            return;
        }
        entries.insert(at, record);
        entries.truncate(self.capacity);
    }
}
