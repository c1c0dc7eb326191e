//! Room actor: an isolated Tokio task that owns a [`GameRoom`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through a bounded mpsc mailbox. Player commands, bot answers and clock
//! expiries are handled one at a time, so the engine never sees two
//! operations interleave.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use quizarena_clock::{RoomClock, ScheduledSet, schedule};
use quizarena_protocol::{GameMode, Lifeline, PlayerId, Recipient, RoomId, RoomOptions, ServerEvent};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::engine::{Departure, Effect, GameRoom};
use crate::{Phase, QuestionProvider, RoomError, ScoreRecorder};

/// Channel sender for delivering outbound events to a player.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Timer lateness worth a warning: the actor was stuck on something.
const LATE_TIMER_WARN: Duration = Duration::from_millis(250);

/// Commands sent to a room actor through its mailbox.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: Reply<()>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<Departure>,
    },
    Disconnect {
        player_id: PlayerId,
        reply: Reply<Departure>,
    },
    Configure {
        player_id: PlayerId,
        options: RoomOptions,
        reply: Reply<()>,
    },
    Start {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    Submit {
        player_id: PlayerId,
        question_index: Option<usize>,
        answer: String,
        reply: Reply<()>,
    },
    /// A bot's scheduled answer arriving.
    BotAnswer {
        bot: PlayerId,
        question_index: usize,
        answer: String,
    },
    UseLifeline {
        player_id: PlayerId,
        lifeline: Lifeline,
        reply: Reply<()>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// What the room clock is counting down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoomTimer {
    Deadline { question_index: usize },
    Reveal { question_index: usize },
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub mode: GameMode,
    pub host_id: PlayerId,
    pub host_name: String,
    /// Seated participants, bots included once the game has started.
    pub participant_count: usize,
    pub connected_humans: usize,
    pub max_participants: usize,
    /// When the game ended, if it has.
    pub finished_at: Option<Instant>,
}

/// Handle to a running room actor.
///
/// Cheap to clone. The registry holds one per room; callers clone it out
/// so they can await a room without touching the registry.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            player_id,
            name,
            sender,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    pub async fn disconnect(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        self.request(|reply| RoomCommand::Disconnect { player_id, reply })
            .await?
    }

    pub async fn configure(
        &self,
        player_id: PlayerId,
        options: RoomOptions,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Configure {
            player_id,
            options,
            reply,
        })
        .await?
    }

    /// Fetches questions and starts the game. Resolves once the first
    /// question is out, or with the reason the start failed.
    pub async fn start(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { player_id, reply })
            .await?
    }

    pub async fn submit(
        &self,
        player_id: PlayerId,
        question_index: Option<usize>,
        answer: String,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Submit {
            player_id,
            question_index,
            answer,
            reply,
        })
        .await?
    }

    pub async fn use_lifeline(
        &self,
        player_id: PlayerId,
        lifeline: Lifeline,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::UseLifeline {
            player_id,
            lifeline,
            reply,
        })
        .await?
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<P> {
    room: GameRoom,
    /// Outbound channels of the members still listening.
    senders: HashMap<PlayerId, PlayerSender>,
    clock: RoomClock<RoomTimer>,
    bots: ScheduledSet,
    /// Weak so that pending bot answers never keep the actor alive.
    mailbox: mpsc::WeakSender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
    provider: Arc<P>,
    recorder: Arc<dyn ScoreRecorder>,
    rng: StdRng,
}

impl<P: QuestionProvider> RoomActor<P> {
    async fn run(mut self) {
        let room_id = self.room.room_id();
        tracing::info!(%room_id, "room actor started");

        let opening = self.room.opening_effects();
        self.apply(opening);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd).await {
                        break;
                    }
                }
                expiry = self.clock.expired() => {
                    if expiry.late_by >= LATE_TIMER_WARN {
                        tracing::warn!(
                            %room_id,
                            late_ms = expiry.late_by.as_millis() as u64,
                            "room timer fired late"
                        );
                    }
                    self.on_timer(expiry.kind);
                }
            }
        }

        self.bots.cancel_all();
        let stats = self.clock.stats();
        tracing::info!(
            %room_id,
            timers_armed = stats.armed,
            timers_fired = stats.fired,
            timers_cancelled = stats.cancelled,
            "room actor stopped"
        );
    }

    /// Handles one command. Returns `false` when the actor should stop.
    async fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.room.join(player_id, &name).map(|effects| {
                    self.senders.insert(player_id, sender);
                    self.apply(effects);
                });
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.room.leave(player_id, Instant::now());
                let _ = reply.send(self.settle_departure(player_id, result));
            }
            RoomCommand::Disconnect { player_id, reply } => {
                let result = self.room.disconnect(player_id, Instant::now());
                let _ = reply.send(self.settle_departure(player_id, result));
            }
            RoomCommand::Configure {
                player_id,
                options,
                reply,
            } => {
                let result = self
                    .room
                    .configure(player_id, &options)
                    .map(|effects| self.apply(effects));
                let _ = reply.send(result);
            }
            RoomCommand::Start { player_id, reply } => {
                let result = self.start(player_id).await;
                let _ = reply.send(result);
            }
            RoomCommand::Submit {
                player_id,
                question_index,
                answer,
                reply,
            } => {
                let result = self
                    .room
                    .submit_answer(player_id, question_index, answer, Instant::now())
                    .map(|effects| self.apply(effects));
                let _ = reply.send(result);
            }
            RoomCommand::BotAnswer {
                bot,
                question_index,
                answer,
            } => {
                match self.room.submit_answer(bot, Some(question_index), answer, Instant::now()) {
                    Ok(effects) => self.apply(effects),
                    Err(e) => tracing::debug!(room_id = %self.room.room_id(), %bot, error = %e, "bot answer dropped"),
                }
            }
            RoomCommand::UseLifeline {
                player_id,
                lifeline,
                reply,
            } => {
                let result = self
                    .room
                    .use_lifeline(player_id, lifeline, &mut self.rng)
                    .map(|effects| self.apply(effects));
                let _ = reply.send(result);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.room.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room.room_id(), "room shutting down");
                return false;
            }
        }
        true
    }

    async fn start(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        let request = self.room.prepare_start(player_id)?;
        let questions = self
            .provider
            .fetch(&request.categories, request.count)
            .await
            .inspect_err(|e| {
                tracing::warn!(room_id = %self.room.room_id(), error = %e, "question provider failed");
            })?;
        let effects = self.room.begin(questions, Instant::now(), &mut self.rng)?;
        self.apply(effects);
        Ok(())
    }

    fn settle_departure(
        &mut self,
        player_id: PlayerId,
        result: Result<(Departure, Vec<Effect>), RoomError>,
    ) -> Result<Departure, RoomError> {
        let (departure, effects) = result?;
        self.senders.remove(&player_id);
        self.apply(effects);
        Ok(departure)
    }

    fn on_timer(&mut self, timer: RoomTimer) {
        let now = Instant::now();
        let effects = match timer {
            RoomTimer::Deadline { question_index } => {
                self.room.deadline_elapsed(question_index, now)
            }
            RoomTimer::Reveal { question_index } => {
                self.room.reveal_delay_elapsed(question_index, now, &mut self.rng)
            }
        };
        self.apply(effects);
    }

    /// Carries out engine effects in order.
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(recipient, event) => self.dispatch(recipient, event),
                Effect::ArmDeadline { question_index, at } => {
                    self.clock.arm_at(at, RoomTimer::Deadline { question_index });
                }
                Effect::ArmRevealDelay {
                    question_index,
                    delay,
                } => {
                    self.clock.arm_after(delay, RoomTimer::Reveal { question_index });
                }
                Effect::DisarmClock => {
                    self.clock.disarm();
                }
                Effect::ScheduleBot {
                    bot,
                    question_index,
                    answer,
                    delay,
                } => {
                    self.schedule_bot(bot, question_index, answer, delay);
                }
                Effect::CancelBots => {
                    self.bots.cancel_all();
                }
                Effect::Record(record) => self.recorder.record(record),
            }
        }
    }

    fn schedule_bot(&mut self, bot: PlayerId, question_index: usize, answer: String, delay: Duration) {
        let msg = RoomCommand::BotAnswer {
            bot,
            question_index,
            answer,
        };
        self.bots.push(schedule(delay, self.mailbox.clone(), msg));
    }

    /// Sends an event to its recipients. Members whose connection is gone
    /// are skipped silently.
    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::Player(pid) => {
                if let Some(sender) = self.senders.get(&pid) {
                    let _ = sender.send(event);
                }
            }
            Recipient::AllExcept(excluded) => {
                for (pid, sender) in &self.senders {
                    if *pid != excluded {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }
}

/// Spawns a room actor for `room` and returns a handle to it.
///
/// `host_sender` receives the `RoomCreated` greeting before any command is
/// processed.
pub(crate) fn spawn_room<P: QuestionProvider>(
    room: GameRoom,
    host_sender: PlayerSender,
    provider: Arc<P>,
    recorder: Arc<dyn ScoreRecorder>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let room_id = room.room_id();

    let mut senders = HashMap::new();
    senders.insert(room.host_id(), host_sender);

    let actor = RoomActor {
        room,
        senders,
        clock: RoomClock::new(),
        bots: ScheduledSet::new(),
        mailbox: tx.downgrade(),
        receiver: rx,
        provider,
        recorder,
        rng: StdRng::from_os_rng(),
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
