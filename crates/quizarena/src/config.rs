//! Server configuration.

use std::time::Duration;

use quizarena_room::RoomConfig;

/// Tunables for a [`QuizarenaServer`](crate::QuizarenaServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// A connection that sends nothing for this long is dropped.
    pub idle_timeout: Duration,
    /// How long a finished room lingers before the reaper destroys it.
    pub room_retention: Duration,
    /// How often the reaper runs.
    pub reaper_interval: Duration,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(60),
            room_retention: Duration::from_secs(5 * 60),
            reaper_interval: Duration::from_secs(30),
            room: RoomConfig::default(),
        }
    }
}
