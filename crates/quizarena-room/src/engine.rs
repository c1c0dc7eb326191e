//! The game-room state machine.
//!
//! [`GameRoom`] is pure and synchronous: every operation takes the current
//! time, mutates the room, and returns the [`Effect`]s the caller must carry
//! out (send events, arm the clock, schedule bots, record scores). It never
//! sleeps, spawns, or touches a socket, which keeps the rules testable
//! without a runtime. The room actor in `room.rs` is the only caller in
//! production.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use quizarena_protocol::{
    BotDifficulty, GameMode, Lifeline, ParticipantResult, ParticipantView,
    PlayerId, Recipient, RoomId, RoomOptions, RoomSettings, ServerEvent,
    Standing,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::time::Instant;

use crate::bot::bot_name;
use crate::config::{AnswerGate, ModePolicy, Phase, resolve_settings};
use crate::outcome::{determine_outcome, sort_standings};
use crate::participant::{AnswerSlot, Participant, ParticipantKind};
use crate::{BotPolicy, Question, RoomConfig, RoomError, RoomInfo, ScoreRecord, ScoringRule};

/// Something the room actor must do on the engine's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver an event to some members.
    Send(Recipient, ServerEvent),
    /// Arm the clock for the question's answer deadline.
    ArmDeadline { question_index: usize, at: Instant },
    /// Arm the clock for the pause after a reveal.
    ArmRevealDelay { question_index: usize, delay: Duration },
    DisarmClock,
    /// Deliver a bot's answer after `delay`.
    ScheduleBot {
        bot: PlayerId,
        question_index: usize,
        answer: String,
        delay: Duration,
    },
    /// Drop every pending bot answer.
    CancelBots,
    /// Hand a final score to the recorder.
    Record(ScoreRecord),
}

/// What a departure left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// No connected human remains. The registry destroys empty rooms.
    pub room_empty: bool,
}

/// The question fetch a start needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub categories: Vec<String>,
    pub count: usize,
}

pub struct GameRoom {
    room_id: RoomId,
    host_id: PlayerId,
    phase: Phase,
    settings: RoomSettings,
    policy: ModePolicy,
    participants: HashMap<PlayerId, Participant>,
    questions: Vec<Question>,
    current_index: Option<usize>,
    question_started_at: Option<Instant>,
    deadline: Option<Instant>,
    /// Highest question index already revealed. Guards against a second
    /// reveal from a racing trigger.
    revealed_through: Option<usize>,
    finished_at: Option<Instant>,
    next_bot_seq: u64,
    bot_policy: BotPolicy,
    scoring: ScoringRule,
}

impl GameRoom {
    /// A room in `Waiting` with `host_id` seated as host.
    pub fn new(
        room_id: RoomId,
        host_id: PlayerId,
        host_name: &str,
        settings: RoomSettings,
        config: &RoomConfig,
    ) -> Self {
        let mut participants = HashMap::new();
        participants.insert(host_id, Participant::human(host_id, host_name));
        let policy = ModePolicy::for_settings(&settings);
        Self {
            room_id,
            host_id,
            phase: Phase::Waiting,
            settings,
            policy,
            participants,
            questions: Vec::new(),
            current_index: None,
            question_started_at: None,
            deadline: None,
            revealed_through: None,
            finished_at: None,
            next_bot_seq: 0,
            bot_policy: config.bot_policy.clone(),
            scoring: config.scoring,
        }
    }

    /// The `RoomCreated` greeting for the host.
    pub fn opening_effects(&self) -> Vec<Effect> {
        vec![Effect::Send(
            Recipient::Player(self.host_id),
            ServerEvent::RoomCreated {
                room_id: self.room_id,
                host_id: self.host_id,
                settings: self.settings.clone(),
                participants: self.views(),
            },
        )]
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    pub fn join(&mut self, player_id: PlayerId, name: &str) -> Result<Vec<Effect>, RoomError> {
        if !self.phase.is_joinable() {
            return Err(RoomError::AlreadyStarted(self.room_id));
        }
        if self.participants.contains_key(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        let humans = self.human_count();
        if humans >= self.settings.max_participants {
            return Err(RoomError::RoomFull(self.room_id));
        }

        let participant = Participant::human(player_id, name);
        let view = participant.view(self.host_id);
        self.participants.insert(player_id, participant);

        // Bots give their seats up to humans.
        let free_seats = self.settings.max_participants - (humans + 1);
        let bots_shrunk = self.settings.bot_count as usize > free_seats;
        if bots_shrunk {
            self.settings.bot_count = free_seats as u32;
            self.policy = ModePolicy::for_settings(&self.settings);
        }

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            participants = self.participants.len(),
            "player joined"
        );

        let mut effects = vec![
            Effect::Send(
                Recipient::Player(player_id),
                ServerEvent::RoomJoined {
                    room_id: self.room_id,
                    host_id: self.host_id,
                    settings: self.settings.clone(),
                    participants: self.views(),
                },
            ),
            Effect::Send(
                Recipient::AllExcept(player_id),
                ServerEvent::ParticipantJoined { participant: view },
            ),
        ];
        if bots_shrunk {
            effects.push(Effect::Send(
                Recipient::AllExcept(player_id),
                self.configured_event(),
            ));
        }
        Ok(effects)
    }

    /// Host-only lobby reconfiguration. Values are clamped, not rejected.
    pub fn configure(
        &mut self,
        player_id: PlayerId,
        options: &RoomOptions,
    ) -> Result<Vec<Effect>, RoomError> {
        self.require_host(player_id)?;
        if !self.phase.is_joinable() {
            return Err(RoomError::AlreadyStarted(self.room_id));
        }

        let humans = self.human_count();
        let settings = resolve_settings(&self.settings, options, humans);
        if humans > settings.max_participants {
            return Err(RoomError::InvalidState(format!(
                "{humans} players are seated but {} allows {}",
                settings.mode, settings.max_participants
            )));
        }

        self.policy = ModePolicy::for_settings(&settings);
        self.settings = settings;
        tracing::debug!(room_id = %self.room_id, settings = ?self.settings, "room configured");
        Ok(vec![Effect::Send(Recipient::All, self.configured_event())])
    }

    /// Validates a start request and says which questions to fetch.
    ///
    /// Does not mutate: the caller fetches, then calls [`begin`](Self::begin).
    pub fn prepare_start(&self, player_id: PlayerId) -> Result<StartRequest, RoomError> {
        self.require_host(player_id)?;
        if !self.phase.is_joinable() {
            return Err(RoomError::AlreadyStarted(self.room_id));
        }
        let seats = self.human_count() + self.settings.bot_count as usize;
        if seats < self.policy.min_participants {
            return Err(RoomError::InvalidState(format!(
                "{} needs at least {} participants",
                self.settings.mode, self.policy.min_participants
            )));
        }
        Ok(StartRequest {
            categories: self.settings.categories.clone(),
            count: self.settings.total_questions as usize,
        })
    }

    /// Seats the bots, resets scores, and opens the first question.
    ///
    /// With no questions the room stays in `Waiting`.
    pub fn begin<R: Rng>(
        &mut self,
        mut questions: Vec<Question>,
        now: Instant,
        rng: &mut R,
    ) -> Result<Vec<Effect>, RoomError> {
        if self.phase != Phase::Waiting {
            return Err(RoomError::AlreadyStarted(self.room_id));
        }
        if questions.is_empty() {
            return Err(RoomError::NoQuestions);
        }
        questions.truncate(self.settings.total_questions as usize);
        self.questions = questions;

        for _ in 0..self.settings.bot_count {
            let seq = self.next_bot_seq;
            self.next_bot_seq += 1;
            let id = PlayerId::bot(seq);
            self.participants.insert(
                id,
                Participant::bot(id, bot_name(seq), self.settings.bot_difficulty),
            );
        }
        for participant in self.participants.values_mut() {
            participant.reset_for_game();
        }
        self.current_index = None;
        self.revealed_through = None;

        tracing::info!(
            room_id = %self.room_id,
            mode = %self.settings.mode,
            participants = self.participants.len(),
            questions = self.questions.len(),
            "game started"
        );

        let mut effects = vec![Effect::Send(
            Recipient::All,
            ServerEvent::GameStarted {
                total_questions: self.questions.len(),
                participants: self.views(),
            },
        )];
        effects.extend(self.advance(now, rng));
        Ok(effects)
    }

    // -----------------------------------------------------------------------
    // Departures
    // -----------------------------------------------------------------------

    /// Explicit leave: the participant is removed in every phase.
    pub fn leave(
        &mut self,
        player_id: PlayerId,
        now: Instant,
    ) -> Result<(Departure, Vec<Effect>), RoomError> {
        self.depart(player_id, now, true)
    }

    /// Lost connection: during a game the participant stays (with its
    /// score) but is marked disconnected; otherwise it is removed.
    pub fn disconnect(
        &mut self,
        player_id: PlayerId,
        now: Instant,
    ) -> Result<(Departure, Vec<Effect>), RoomError> {
        self.depart(player_id, now, false)
    }

    fn depart(
        &mut self,
        player_id: PlayerId,
        now: Instant,
        explicit: bool,
    ) -> Result<(Departure, Vec<Effect>), RoomError> {
        let name = if !explicit && self.phase.is_active() {
            let Some(p) = self.participants.get_mut(&player_id) else {
                return Err(RoomError::NotInRoom(player_id, self.room_id));
            };
            p.connected = false;
            p.name.clone()
        } else {
            match self.participants.remove(&player_id) {
                Some(p) => p.name,
                None => return Err(RoomError::NotInRoom(player_id, self.room_id)),
            }
        };

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            explicit,
            phase = %self.phase,
            "participant left"
        );

        let mut effects = vec![Effect::Send(
            Recipient::All,
            ServerEvent::ParticipantLeft { player_id, name },
        )];

        if player_id == self.host_id {
            if let Some(next) = self.next_host() {
                self.host_id = next;
                tracing::info!(room_id = %self.room_id, host_id = %next, "host reassigned");
                effects.push(Effect::Send(
                    Recipient::All,
                    ServerEvent::HostChanged { host_id: next },
                ));
            }
        }

        if self.connected_humans() == 0 {
            if self.phase.is_active() {
                self.enter(Phase::Finished);
                self.finished_at = Some(now);
                self.deadline = None;
                effects.push(Effect::DisarmClock);
                effects.push(Effect::CancelBots);
            }
            return Ok((Departure { room_empty: true }, effects));
        }

        if self.phase.is_active() {
            let still_playing = self.participants.values().filter(|p| p.connected).count();
            if still_playing < self.policy.min_participants {
                tracing::info!(room_id = %self.room_id, still_playing, "too few participants, ending game");
                effects.extend(self.finish(now));
            } else if self.phase == Phase::InQuestion && self.gate_satisfied() {
                effects.extend(self.reveal());
            }
        }

        Ok((Departure { room_empty: false }, effects))
    }

    // -----------------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------------

    /// Records an answer for the current question.
    ///
    /// Answers outside `InQuestion`, for another question, or repeated are
    /// dropped with no effects. An answer at or after the deadline is
    /// recorded as a timeout.
    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        question_index: Option<usize>,
        answer: String,
        now: Instant,
    ) -> Result<Vec<Effect>, RoomError> {
        if !self.participants.contains_key(&player_id) {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        }
        let Some(current) = self.current_index.filter(|_| self.phase == Phase::InQuestion) else {
            tracing::debug!(room_id = %self.room_id, %player_id, phase = %self.phase, "answer outside question dropped");
            return Ok(Vec::new());
        };
        if question_index.is_some_and(|i| i != current) {
            tracing::debug!(
                room_id = %self.room_id,
                %player_id,
                question_index = ?question_index,
                current,
                "stale answer dropped"
            );
            return Ok(Vec::new());
        }

        let late = self.deadline.is_some_and(|d| now >= d);
        let elapsed = self
            .question_started_at
            .map_or(Duration::ZERO, |s| now.saturating_duration_since(s));

        let Some(participant) = self.participants.get_mut(&player_id) else {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        };
        let accepted = if late {
            participant.record_timeout()
        } else {
            participant.submit_answer(answer, elapsed)
        };
        if !accepted {
            tracing::debug!(room_id = %self.room_id, %player_id, "duplicate answer ignored");
            return Ok(Vec::new());
        }
        let is_bot = participant.is_bot();

        tracing::trace!(
            room_id = %self.room_id,
            %player_id,
            question_index = current,
            late,
            elapsed_ms = elapsed.as_millis() as u64,
            "answer recorded"
        );

        let mut effects = Vec::new();
        if !is_bot {
            effects.push(Effect::Send(
                Recipient::Player(player_id),
                ServerEvent::AnswerAccepted {
                    question_index: current,
                    late,
                },
            ));
        }
        effects.push(Effect::Send(
            Recipient::AllExcept(player_id),
            ServerEvent::ParticipantAnswered {
                question_index: current,
                player_id,
            },
        ));

        if late || self.gate_satisfied() {
            effects.extend(self.reveal());
        }
        Ok(effects)
    }

    /// The answer deadline of `question_index` passed.
    pub fn deadline_elapsed(&mut self, question_index: usize, _now: Instant) -> Vec<Effect> {
        if self.phase != Phase::InQuestion || self.current_index != Some(question_index) {
            return Vec::new();
        }
        self.reveal()
    }

    /// The pause after revealing `question_index` is over: next question,
    /// or game over after the last one.
    pub fn reveal_delay_elapsed<R: Rng>(
        &mut self,
        question_index: usize,
        now: Instant,
        rng: &mut R,
    ) -> Vec<Effect> {
        if self.phase != Phase::Revealing || self.current_index != Some(question_index) {
            return Vec::new();
        }
        self.advance(now, rng)
    }

    /// Hides two wrong options of the current question for one human.
    pub fn use_lifeline<R: Rng>(
        &mut self,
        player_id: PlayerId,
        lifeline: Lifeline,
        rng: &mut R,
    ) -> Result<Vec<Effect>, RoomError> {
        if !self.participants.contains_key(&player_id) {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        }
        let Some(index) = self.current_index.filter(|_| self.phase == Phase::InQuestion) else {
            return Err(RoomError::InvalidState("no question in progress".into()));
        };
        let Some(question) = self.questions.get(index) else {
            return Err(RoomError::InvalidState("no question in progress".into()));
        };
        let wrong = question.incorrect_answers.clone();

        let Some(participant) = self.participants.get_mut(&player_id) else {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        };
        if participant.is_bot() {
            return Err(RoomError::InvalidState("bots cannot use lifelines".into()));
        }
        if participant.has_answered() {
            return Err(RoomError::InvalidState("question already answered".into()));
        }
        if participant.lifelines_used.contains(&lifeline) {
            return Err(RoomError::LifelineUsed);
        }

        let removed: Vec<String> = match lifeline {
            Lifeline::FiftyFifty => wrong.choose_multiple(rng, 2).cloned().collect(),
        };
        participant.lifelines_used.insert(lifeline);

        tracing::debug!(room_id = %self.room_id, %player_id, ?lifeline, question_index = index, "lifeline used");
        Ok(vec![Effect::Send(
            Recipient::Player(player_id),
            ServerEvent::LifelineApplied {
                question_index: index,
                lifeline,
                removed,
            },
        )])
    }

    fn advance<R: Rng>(&mut self, now: Instant, rng: &mut R) -> Vec<Effect> {
        let next = self.current_index.map_or(0, |i| i + 1);
        let Some(question) = self.questions.get(next) else {
            return self.finish(now);
        };

        let view = question.to_view(
            next,
            self.questions.len(),
            self.settings.time_per_question_secs,
            rng,
        );
        let correct = question.correct_answer.clone();
        let deadline = now + self.question_duration();

        self.enter(Phase::InQuestion);
        self.current_index = Some(next);
        self.question_started_at = Some(now);
        self.deadline = Some(deadline);
        for participant in self.participants.values_mut() {
            participant.reset_for_next_question();
        }

        tracing::info!(room_id = %self.room_id, question_index = next, "question opened");

        let mut bots: Vec<(PlayerId, BotDifficulty)> = self
            .participants
            .values()
            .filter(|p| p.connected)
            .filter_map(|p| match p.kind {
                ParticipantKind::Bot(profile) => Some((p.id, profile.difficulty)),
                ParticipantKind::Human => None,
            })
            .collect();
        bots.sort_by_key(|(id, _)| *id);

        let mut effects = vec![
            Effect::Send(Recipient::All, ServerEvent::NewQuestion(view.clone())),
            Effect::ArmDeadline {
                question_index: next,
                at: deadline,
            },
        ];
        for (bot, difficulty) in bots {
            let choice = self.bot_policy.choose(&view.options, &correct, difficulty, rng);
            effects.push(Effect::ScheduleBot {
                bot,
                question_index: next,
                answer: choice.answer,
                delay: choice.delay,
            });
        }
        effects
    }

    /// Scores the current question. Runs at most once per question.
    fn reveal(&mut self) -> Vec<Effect> {
        let Some(index) = self.current_index else {
            return Vec::new();
        };
        if self.phase != Phase::InQuestion || self.revealed_through.is_some_and(|r| r >= index) {
            return Vec::new();
        }
        let Some(question) = self.questions.get(index).cloned() else {
            return Vec::new();
        };

        self.revealed_through = Some(index);
        self.enter(Phase::Revealing);
        self.deadline = None;

        let duration = self.question_duration();
        let scoring = self.scoring;
        let mut ids: Vec<PlayerId> = self.participants.keys().copied().collect();
        ids.sort();

        let mut effects = vec![Effect::CancelBots];
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(p) = self.participants.get_mut(&id) else {
                continue;
            };
            p.record_timeout();
            let (answer, correct, points) = match &p.slot {
                AnswerSlot::Answered { value, elapsed } => {
                    let correct = question.is_correct(value);
                    (Some(value.clone()), correct, scoring.award(correct, *elapsed, duration))
                }
                AnswerSlot::TimedOut | AnswerSlot::Unanswered => (None, false, 0),
            };
            p.score += points;

            if !p.is_bot() && p.connected {
                effects.push(Effect::Send(
                    Recipient::Player(id),
                    ServerEvent::AnswerResult {
                        question_index: index,
                        correct,
                        points,
                        score: p.score,
                        correct_answer: question.correct_answer.clone(),
                    },
                ));
            }
            results.push(ParticipantResult {
                player_id: id,
                name: p.name.clone(),
                answer,
                correct,
                points,
                score: p.score,
            });
        }

        let delay = self.policy.reveal_delay;
        tracing::info!(room_id = %self.room_id, question_index = index, "answer revealed");

        effects.push(Effect::Send(
            Recipient::All,
            ServerEvent::QuestionResult {
                question_index: index,
                correct_answer: question.correct_answer.clone(),
                results,
                next_in_secs: delay.as_secs(),
            },
        ));
        if self.settings.mode != GameMode::Solo {
            effects.push(Effect::Send(
                Recipient::All,
                ServerEvent::ScoreboardUpdate {
                    standings: self.standings(),
                },
            ));
        }
        effects.push(Effect::ArmRevealDelay {
            question_index: index,
            delay,
        });
        effects
    }

    fn finish(&mut self, now: Instant) -> Vec<Effect> {
        if self.phase == Phase::Finished {
            return Vec::new();
        }
        self.enter(Phase::Finished);
        self.finished_at = Some(now);
        self.deadline = None;

        let standings = self.standings();
        let outcome = determine_outcome(&standings);
        tracing::info!(room_id = %self.room_id, ?outcome, "game over");

        let mut effects = vec![
            Effect::DisarmClock,
            Effect::CancelBots,
            Effect::Send(
                Recipient::All,
                ServerEvent::GameOver {
                    standings: standings.clone(),
                    outcome,
                },
            ),
        ];
        let timestamp_ms = unix_millis();
        for standing in standings.into_iter().filter(|s| !s.is_bot) {
            effects.push(Effect::Record(ScoreRecord {
                name: standing.name,
                score: standing.score,
                timestamp_ms,
                mode: self.settings.mode,
            }));
        }
        effects
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn participant(&self, player_id: PlayerId) -> Option<&Participant> {
        self.participants.get(&player_id)
    }

    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.participants.contains_key(&player_id)
    }

    /// Everyone in the room, highest score first.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .participants
            .values()
            .map(|p| Standing {
                player_id: p.id,
                name: p.name.clone(),
                is_bot: p.is_bot(),
                score: p.score,
            })
            .collect();
        sort_standings(&mut standings);
        standings
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            phase: self.phase,
            mode: self.settings.mode,
            host_id: self.host_id,
            host_name: self
                .participants
                .get(&self.host_id)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            participant_count: self.participants.len(),
            connected_humans: self.connected_humans(),
            max_participants: self.settings.max_participants,
            finished_at: self.finished_at,
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_host(&self, player_id: PlayerId) -> Result<(), RoomError> {
        if !self.participants.contains_key(&player_id) {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        }
        if player_id != self.host_id {
            return Err(RoomError::NotHost(player_id));
        }
        Ok(())
    }

    fn views(&self) -> Vec<ParticipantView> {
        let mut views: Vec<ParticipantView> = self
            .participants
            .values()
            .map(|p| p.view(self.host_id))
            .collect();
        views.sort_by_key(|v| v.player_id);
        views
    }

    fn configured_event(&self) -> ServerEvent {
        ServerEvent::RoomConfigured {
            settings: self.settings.clone(),
            participants: self.views(),
        }
    }

    fn human_count(&self) -> usize {
        self.participants.values().filter(|p| !p.is_bot()).count()
    }

    fn connected_humans(&self) -> usize {
        self.participants
            .values()
            .filter(|p| !p.is_bot() && p.connected)
            .count()
    }

    fn next_host(&self) -> Option<PlayerId> {
        self.participants
            .values()
            .filter(|p| !p.is_bot() && p.connected)
            .map(|p| p.id)
            .min()
    }

    fn enter(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase change {} -> {next}",
            self.phase
        );
        self.phase = next;
    }

    fn question_duration(&self) -> Duration {
        Duration::from_secs(self.settings.time_per_question_secs)
    }

    /// `true` when everyone whose answer the question waits for has one.
    fn gate_satisfied(&self) -> bool {
        let mut required = self
            .participants
            .values()
            .filter(|p| p.connected)
            .filter(|p| match self.policy.gate {
                AnswerGate::Everyone => true,
                AnswerGate::HumansOnly => !p.is_bot(),
            })
            .peekable();
        required.peek().is_some() && required.all(|p| p.has_answered())
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================
