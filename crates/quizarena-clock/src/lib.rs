//! Per-room timing for Quizarena.
//!
//! Two tools live here:
//!
//! - [`RoomClock`] holds at most one armed deadline (the question timer or
//!   the pause between questions) and exposes it as a future that a room
//!   actor can race against its mailbox.
//! - [`schedule`] delivers a message into a mailbox after a delay, as a
//!   detached task that can be cancelled. Rooms use it for bot answers.
//!   [`ScheduledSet`] keeps a batch of those and cancels them together.
//!
//! # Integration
//!
//! The clock is designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* handle command, maybe re-arm */ }
//!         expiry = clock.expired() => { /* deadline or reveal delay elapsed */ }
//!     }
//! }
//! ```
//!
//! All instants are [`tokio::time::Instant`], so tests can run the whole
//! game under `start_paused = true`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// RoomClock
// ---------------------------------------------------------------------------

/// What [`RoomClock::expired`] hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry<K> {
    /// The tag passed when the clock was armed.
    pub kind: K,
    /// How far past the deadline the actor got to it. Zero under a
    /// paused test clock.
    pub late_by: Duration,
}

/// Counters for a clock's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockStats {
    pub armed: u64,
    pub fired: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone)]
struct Armed<K> {
    at: Instant,
    kind: K,
}

/// A single re-armable deadline tagged with `K`.
///
/// Arming replaces whatever was armed before, so a room can never have two
/// live timers.
#[derive(Debug)]
pub struct RoomClock<K> {
    armed: Option<Armed<K>>,
    stats: ClockStats,
}

impl<K> Default for RoomClock<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RoomClock<K> {
    pub fn new() -> Self {
        Self {
            armed: None,
            stats: ClockStats::default(),
        }
    }

    /// Arms the clock to fire at `at`. Replaces any earlier deadline.
    pub fn arm_at(&mut self, at: Instant, kind: K) {
        if self.armed.is_some() {
            self.stats.cancelled += 1;
        }
        self.stats.armed += 1;
        self.armed = Some(Armed { at, kind });
        trace!(armed = self.stats.armed, "room clock armed");
    }

    /// Arms the clock to fire `delay` from now.
    pub fn arm_after(&mut self, delay: Duration, kind: K) {
        self.arm_at(Instant::now() + delay, kind);
    }

    /// Clears the deadline, returning its tag if one was armed.
    pub fn disarm(&mut self) -> Option<K> {
        let armed = self.armed.take()?;
        self.stats.cancelled += 1;
        Some(armed.kind)
    }

    /// When the clock fires, or `None` while disarmed.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|a| a.at)
    }

    pub fn stats(&self) -> ClockStats {
        self.stats
    }

    /// Waits for the armed deadline and disarms the clock.
    ///
    /// Pends forever when nothing is armed, which lets `select!` keep
    /// serving its other branches. Cancel-safe: the armed state is only
    /// taken after the sleep completes, so dropping this future inside a
    /// `select!` leaves the clock untouched.
    pub async fn expired(&mut self) -> Expiry<K> {
        let Some(at) = self.deadline() else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(at).await;

        let late_by = Instant::now().saturating_duration_since(at);
        match self.armed.take() {
            Some(armed) => {
                self.stats.fired += 1;
                trace!(late_ms = late_by.as_millis() as u64, "room clock fired");
                Expiry {
                    kind: armed.kind,
                    late_by,
                }
            }
            None => {
                // Only reachable if the clock were disarmed while this
                // future was suspended, which `&mut self` rules out.
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduled delivery
// ---------------------------------------------------------------------------

/// A pending delayed delivery started by [`schedule`].
#[derive(Debug)]
pub struct Scheduled {
    handle: AbortHandle,
}

impl Scheduled {
    /// Stops the delivery if it has not happened yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// `true` once the message was delivered, dropped, or cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Sends `msg` into `mailbox` after `delay`.
///
/// The task holds only a weak sender, so a pending delivery never keeps a
/// mailbox open. If every strong sender is gone by the time the delay
/// elapses, the message is silently dropped.
pub fn schedule<T>(delay: Duration, mailbox: mpsc::WeakSender<T>, msg: T) -> Scheduled
where
    T: Send + 'static,
{
    let task = tokio::spawn(async move {
        time::sleep(delay).await;
        let Some(tx) = mailbox.upgrade() else {
            trace!("scheduled delivery dropped, mailbox closed");
            return;
        };
        if tx.send(msg).await.is_err() {
            trace!("scheduled delivery dropped, receiver gone");
        }
    });
    Scheduled {
        handle: task.abort_handle(),
    }
}

/// A batch of [`Scheduled`] deliveries cancelled as one.
///
/// Dropping the set cancels everything still pending.
#[derive(Debug, Default)]
pub struct ScheduledSet {
    pending: Vec<Scheduled>,
}

impl ScheduledSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scheduled: Scheduled) {
        self.pending.retain(|s| !s.is_finished());
        self.pending.push(scheduled);
    }

    /// Cancels every pending delivery. Returns how many were still live.
    pub fn cancel_all(&mut self) -> usize {
        let live = self.pending.iter().filter(|s| !s.is_finished()).count();
        for s in self.pending.drain(..) {
            s.cancel();
        }
        if live > 0 {
            debug!(cancelled = live, "scheduled deliveries cancelled");
        }
        live
    }

    /// Number of deliveries not yet finished.
    pub fn len(&self) -> usize {
        self.pending.iter().filter(|s| !s.is_finished()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for ScheduledSet {
    fn drop(&mut self) {
        for s in &self.pending {
            s.cancel();
        }
    }
}
