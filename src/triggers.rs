//! Outward trigger events
//!
//! Named events emitted to the automation layer, each carrying zero or more
//! descriptive tokens. Delivery is a broadcast bus: the hub glue subscribes,
//! and emitting with nobody listening is fine.

use tokio::sync::broadcast;
use tracing::{debug, info};

/// Events buffered per subscriber before lagging
const TRIGGER_CHANNEL_CAPACITY: usize = 32;

/// System power/lifecycle states reported by the remote target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Sleep,
    Wake,
    Restart,
    Quit,
}

impl PowerState {
    pub fn token(&self) -> &'static str {
        match self {
            PowerState::Sleep => "sleep",
            PowerState::Wake => "wake",
            PowerState::Restart => "restart",
            PowerState::Quit => "quit",
        }
    }
}

/// A named outward trigger
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    MovieStarted {
        title: String,
    },
    EpisodeStarted {
        show: String,
        season: i64,
        episode: i64,
        title: String,
    },
    SongStarted {
        artist: String,
        title: String,
    },
    Paused,
    Resumed,
    Stopped,
    MovieEnded {
        title: String,
    },
    EpisodeEnded {
        show: String,
        season: i64,
        episode: i64,
        title: String,
    },
    SongEnded {
        artist: String,
        title: String,
    },
    Reconnected {
        host: String,
    },
    PowerStateChanged {
        state: PowerState,
    },
}

impl TriggerEvent {
    /// Stable event name, as the automation layer sees it
    pub fn name(&self) -> &'static str {
        match self {
            TriggerEvent::MovieStarted { .. } => "movie_started",
            TriggerEvent::EpisodeStarted { .. } => "episode_started",
            TriggerEvent::SongStarted { .. } => "song_started",
            TriggerEvent::Paused => "paused",
            TriggerEvent::Resumed => "resumed",
            TriggerEvent::Stopped => "stopped",
            TriggerEvent::MovieEnded { .. } => "movie_ended",
            TriggerEvent::EpisodeEnded { .. } => "episode_ended",
            TriggerEvent::SongEnded { .. } => "song_ended",
            TriggerEvent::Reconnected { .. } => "reconnected",
            TriggerEvent::PowerStateChanged { .. } => "power_state_changed",
        }
    }

    /// Descriptive tokens carried by the event
    pub fn tokens(&self) -> Vec<(&'static str, String)> {
        match self {
            TriggerEvent::MovieStarted { title } | TriggerEvent::MovieEnded { title } => {
                vec![("movie_title", title.clone())]
            }
            TriggerEvent::EpisodeStarted {
                show,
                season,
                episode,
                title,
            }
            | TriggerEvent::EpisodeEnded {
                show,
                season,
                episode,
                title,
            } => vec![
                ("show_title", show.clone()),
                ("season", season.to_string()),
                ("episode", episode.to_string()),
                ("episode_title", title.clone()),
            ],
            TriggerEvent::SongStarted { artist, title }
            | TriggerEvent::SongEnded { artist, title } => vec![
                ("artist", artist.clone()),
                ("song_title", title.clone()),
            ],
            TriggerEvent::Reconnected { host } => vec![("host", host.clone())],
            TriggerEvent::PowerStateChanged { state } => {
                vec![("state", state.token().to_string())]
            }
            TriggerEvent::Paused | TriggerEvent::Resumed | TriggerEvent::Stopped => vec![],
        }
    }
}

/// Broadcast bus carrying outward triggers
#[derive(Clone)]
pub struct TriggerBus {
    tx: broadcast::Sender<TriggerEvent>,
}

impl TriggerBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(TRIGGER_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Emit an event to every subscriber
    pub fn emit(&self, event: TriggerEvent) {
        info!("🔔 Trigger: {} {:?}", event.name(), event.tokens());
        if self.tx.send(event).is_err() {
            debug!("No trigger subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.tx.subscribe()
    }
}

impl Default for TriggerBus {
    fn default() -> Self {
        Self::new()
    }
}
