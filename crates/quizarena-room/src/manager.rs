//! Room registry: creates, tracks, and routes players to rooms.
//!
//! The room map sits behind a short-lived sync lock. Every operation that
//! has to wait on a room actor clones the handle out first, so a room busy
//! fetching questions never holds up another room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::join_all;
use quizarena_protocol::{GameMode, PlayerId, RoomId, RoomListEntry, RoomOptions};
use rand::Rng;

use crate::config::{default_settings, resolve_settings};
use crate::engine::GameRoom;
use crate::room::spawn_room;
use crate::{
    NullRecorder, Phase, PlayerSender, QueuedPlayer, QuestionProvider, RoomConfig, RoomError,
    RoomHandle, RoomInfo, ScoreRecorder,
};

/// How long listing and reaping wait on one room before skipping it.
const ROOM_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Default)]
struct RoomIndex {
    rooms: HashMap<RoomId, RoomHandle>,
    /// Seated players, plus joins still waiting on the room's answer.
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomIndex {
    fn ensure_free(&self, player_id: PlayerId) -> Result<(), RoomError> {
        match self.player_rooms.get(&player_id) {
            Some(current) => Err(RoomError::AlreadyInRoom(player_id, *current)),
            None => Ok(()),
        }
    }

    fn forget(&mut self, room_id: RoomId) -> Option<RoomHandle> {
        self.player_rooms.retain(|_, rid| *rid != room_id);
        self.rooms.remove(&room_id)
    }

    fn fresh_room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let candidate = RoomId(rng.random_range(RoomId::MIN..=RoomId::MAX));
            if !self.rooms.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Owns every live room and knows which room each player is in.
///
/// The registry is the only authority for creating and destroying rooms.
/// A player can be in at most one room at a time. Shared by reference:
/// every method takes `&self`.
pub struct RoomRegistry<P> {
    index: Mutex<RoomIndex>,
    provider: Arc<P>,
    recorder: Arc<dyn ScoreRecorder>,
    config: RoomConfig,
}

impl<P: QuestionProvider> RoomRegistry<P> {
    /// An empty registry whose rooms fetch from `provider` and drop
    /// final scores.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            index: Mutex::new(RoomIndex::default()),
            provider,
            recorder: Arc::new(NullRecorder),
            config: RoomConfig::default(),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn ScoreRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_config(mut self, config: RoomConfig) -> Self {
        self.config = config;
        self
    }

    fn index(&self) -> MutexGuard<'_, RoomIndex> {
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Opens a room with `host` as its host and only member.
    ///
    /// The host receives `room_created` on `sender` once the room is up.
    pub fn create_room(
        &self,
        host: PlayerId,
        host_name: &str,
        options: &RoomOptions,
        sender: PlayerSender,
    ) -> Result<RoomId, RoomError> {
        let mut index = self.index();
        index.ensure_free(host)?;

        let room_id = index.fresh_room_id();
        let mode = options.mode.unwrap_or_default();
        let settings = resolve_settings(&default_settings(mode), options, 1);
        let room = GameRoom::new(room_id, host, host_name, settings, &self.config);
        let handle = spawn_room(
            room,
            sender,
            Arc::clone(&self.provider),
            Arc::clone(&self.recorder),
            self.config.channel_size,
        );

        index.rooms.insert(room_id, handle);
        index.player_rooms.insert(host, room_id);
        tracing::info!(%room_id, host = %host, %mode, "room created");
        Ok(room_id)
    }

    /// Seats a player in a waiting room.
    ///
    /// The seat is reserved in the index before the room is asked, so a
    /// player can never end up joining two rooms at once.
    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let handle = {
            let mut index = self.index();
            index.ensure_free(player_id)?;
            let handle = index
                .rooms
                .get(&room_id)
                .cloned()
                .ok_or(RoomError::NotFound(room_id))?;
            index.player_rooms.insert(player_id, room_id);
            handle
        };

        let joined = handle.join(player_id, name.to_string(), sender).await;

        let mut index = self.index();
        let still_reserved = index.player_rooms.get(&player_id) == Some(&room_id);
        match joined {
            Ok(()) if still_reserved => Ok(()),
            // Destroyed while the join was in flight.
            Ok(()) => Err(RoomError::Unavailable(room_id)),
            Err(e) => {
                if still_reserved {
                    index.player_rooms.remove(&player_id);
                }
                Err(e)
            }
        }
    }

    /// Removes a player from their room. Destroys the room if nobody is
    /// left in it.
    pub async fn leave_room(&self, player_id: PlayerId) -> Result<RoomId, RoomError> {
        let (room_id, handle) = {
            let mut index = self.index();
            let room_id = index.player_rooms.remove(&player_id).ok_or_else(|| {
                RoomError::InvalidState(format!("player {player_id} is not in any room"))
            })?;
            let handle = index
                .rooms
                .get(&room_id)
                .cloned()
                .ok_or(RoomError::NotFound(room_id))?;
            (room_id, handle)
        };

        let departure = handle.leave(player_id).await;
        self.settle(room_id, departure.map(|d| d.room_empty)).await?;
        Ok(room_id)
    }

    /// The player's connection is gone. Returns the room they were in.
    pub async fn disconnect(&self, player_id: PlayerId) -> Option<RoomId> {
        let (room_id, handle) = {
            let mut index = self.index();
            let room_id = index.player_rooms.remove(&player_id)?;
            (room_id, index.rooms.get(&room_id).cloned()?)
        };

        let departure = handle.disconnect(player_id).await;
        if let Err(e) = self.settle(room_id, departure.map(|d| d.room_empty)).await {
            tracing::debug!(%room_id, %player_id, error = %e, "disconnect after room went away");
        }
        Some(room_id)
    }

    /// Destroys the room if the departure emptied it or its actor is gone.
    async fn settle(
        &self,
        room_id: RoomId,
        room_empty: Result<bool, RoomError>,
    ) -> Result<(), RoomError> {
        match room_empty {
            Ok(true) => {
                let _ = self.destroy_room(room_id).await;
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(RoomError::Unavailable(id)) => {
                tracing::warn!(room_id = %id, "room actor gone, pruning");
                self.index().forget(id);
                Err(RoomError::Unavailable(id))
            }
            Err(e) => Err(e),
        }
    }

    /// A handle to `room_id`, provided `player_id` is a member of it.
    ///
    /// Callers await the returned handle, never the registry.
    pub fn handle_for(&self, player_id: PlayerId, room_id: RoomId) -> Result<RoomHandle, RoomError> {
        let index = self.index();
        let handle = index.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        if index.player_rooms.get(&player_id) != Some(&room_id) {
            return Err(RoomError::NotInRoom(player_id, room_id));
        }
        Ok(handle.clone())
    }

    /// Opens a head-to-head room for a matched pair. `first` hosts.
    pub async fn create_match(
        &self,
        first: QueuedPlayer,
        second: QueuedPlayer,
    ) -> Result<RoomId, RoomError> {
        let options = RoomOptions {
            mode: Some(GameMode::HeadToHead),
            ..RoomOptions::default()
        };
        let room_id = self.create_room(first.player_id, &first.name, &options, first.sender)?;
        if let Err(e) = self
            .join_room(room_id, second.player_id, &second.name, second.sender)
            .await
        {
            tracing::warn!(%room_id, error = %e, "match room could not seat opponent");
            let _ = self.destroy_room(room_id).await;
            return Err(e);
        }
        Ok(room_id)
    }

    /// Rooms still accepting players.
    ///
    /// Queries every room at once. Rooms that are gone or too busy to
    /// answer in time are left out.
    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let handles = self.snapshot();
        let infos = join_all(handles.iter().map(query_info)).await;

        let mut entries: Vec<RoomListEntry> = infos
            .into_iter()
            .filter_map(|info| info?.ok())
            .filter(|info| {
                info.phase.is_joinable() && info.participant_count < info.max_participants
            })
            .map(|info| RoomListEntry {
                room_id: info.room_id,
                mode: info.mode,
                host_name: info.host_name,
                participant_count: info.participant_count,
                max_participants: info.max_participants,
            })
            .collect();
        entries.sort_by_key(|e| e.room_id.0);
        entries
    }

    /// Destroys rooms that finished more than `retention` ago, rooms with
    /// nobody connected, and rooms whose actor has stopped. Returns how
    /// many were removed.
    ///
    /// A room that is merely slow to answer is left for the next pass.
    pub async fn reap_finished(&self, retention: Duration) -> usize {
        let handles = self.snapshot();
        let infos = join_all(handles.iter().map(query_info)).await;

        let doomed: Vec<RoomId> = handles
            .iter()
            .zip(infos)
            .filter_map(|(handle, info)| {
                let reap = match info {
                    _ if handle.is_closed() => true,
                    Some(Ok(info)) => {
                        let expired = info.phase == Phase::Finished
                            && info.finished_at.is_some_and(|t| t.elapsed() >= retention);
                        expired || info.connected_humans == 0
                    }
                    Some(Err(_)) => true,
                    None => false,
                };
                reap.then(|| handle.room_id())
            })
            .collect();

        for room_id in &doomed {
            let _ = self.destroy_room(*room_id).await;
        }
        if !doomed.is_empty() {
            tracing::info!(reaped = doomed.len(), remaining = self.room_count(), "idle rooms reaped");
        }
        doomed.len()
    }

    /// Shuts a room down and clears its players from the index.
    pub async fn destroy_room(&self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .index()
            .forget(room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        let _ = handle.shutdown().await;
        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room a player is currently in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.index().player_rooms.get(&player_id).copied()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.index().rooms.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.index().rooms.keys().copied().collect()
    }

    fn snapshot(&self) -> Vec<RoomHandle> {
        self.index().rooms.values().cloned().collect()
    }
}

/// `None` when the room did not answer within [`ROOM_QUERY_TIMEOUT`].
async fn query_info(handle: &RoomHandle) -> Option<Result<RoomInfo, RoomError>> {
    tokio::time::timeout(ROOM_QUERY_TIMEOUT, handle.get_info())
        .await
        .ok()
}
