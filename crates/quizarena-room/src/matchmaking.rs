//! Head-to-head matchmaking.
//!
//! Players wait in a FIFO queue. The moment a second player arrives the
//! two at the front are paired and handed back to the caller, which
//! creates their room.

use std::collections::VecDeque;
use std::sync::Mutex;

use quizarena_protocol::PlayerId;

use crate::PlayerSender;

/// A player waiting for an opponent.
#[derive(Debug, Clone)]
pub struct QueuedPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub sender: PlayerSender,
}

/// Result of [`MatchQueue::enqueue`].
#[derive(Debug)]
pub enum QueueStatus {
    /// Waiting; `position` is one-based.
    Queued { position: usize },
    /// Paired with the player who waited longest. That player is first.
    Matched(QueuedPlayer, QueuedPlayer),
    /// This player was already waiting. Nothing changed.
    AlreadyQueued,
}

/// FIFO matchmaking queue, safe to share between connection tasks.
///
/// Uses a synchronous mutex: no operation awaits while holding it.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: Mutex<VecDeque<QueuedPlayer>>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, player: QueuedPlayer) -> QueueStatus {
        let mut waiting = self.waiting.lock().unwrap_or_else(|e| e.into_inner());
        if waiting.iter().any(|w| w.player_id == player.player_id) {
            return QueueStatus::AlreadyQueued;
        }

        // Players whose connection dropped are skipped.
        while let Some(first) = waiting.pop_front() {
            if first.sender.is_closed() {
                tracing::debug!(player_id = %first.player_id, "dropping stale queue entry");
                continue;
            }
            tracing::info!(first = %first.player_id, second = %player.player_id, "players matched");
            return QueueStatus::Matched(first, player);
        }

        tracing::debug!(player_id = %player.player_id, "player queued");
        waiting.push_back(player);
        QueueStatus::Queued {
            position: waiting.len(),
        }
    }

    /// Removes a waiting player. Returns `false` if it wasn't queued.
    pub fn cancel(&self, player_id: PlayerId) -> bool {
        let mut waiting = self.waiting.lock().unwrap_or_else(|e| e.into_inner());
        let before = waiting.len();
        waiting.retain(|w| w.player_id != player_id);
        waiting.len() != before
    }

    pub fn len(&self) -> usize {
        self.waiting.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
