//! Event Notifier
//!
//! Consumes the asynchronous notification stream of one connection and maps
//! it to outward triggers. Play events need start-vs-resume classification
//! from the current playback percentage; stop events distinguish a user stop
//! from the media ending naturally. Metadata lookups on this path are
//! best-effort: a failed lookup drops that one trigger, nothing more.

use crate::connection::Connection;
use crate::rpc::{Notification, RpcError};
use crate::triggers::{PowerState, TriggerBus, TriggerEvent};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Playback percentage above which a play event counts as a resume
const RESUME_THRESHOLD_VIDEO: f64 = 0.1;
const RESUME_THRESHOLD_AUDIO: f64 = 1.0;

pub struct EventNotifier;

impl EventNotifier {
    /// Subscribe a connection and pump its notifications into the bus.
    /// The task ends when the connection's notification channel closes.
    pub fn attach(conn: Arc<Connection>, bus: TriggerBus) -> JoinHandle<()> {
        let mut rx = conn.notifications();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(notification) => handle(&conn, &bus, notification).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Dropped {} notifications from {}", missed, conn.host());
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Notifier for {} finished", conn.host());
        })
    }
}

async fn handle(conn: &Connection, bus: &TriggerBus, notification: Notification) {
    let data = notification.data().clone();
    match notification.method.as_str() {
        "Player.OnPlay" => on_play(conn, bus, &data).await,
        "Player.OnPause" => bus.emit(TriggerEvent::Paused),
        "Player.OnStop" => on_stop(conn, bus, &data).await,
        "System.OnSleep" => bus.emit(power(PowerState::Sleep)),
        "System.OnWake" => bus.emit(power(PowerState::Wake)),
        "System.OnRestart" => bus.emit(power(PowerState::Restart)),
        "System.OnQuit" => bus.emit(power(PowerState::Quit)),
        other => debug!("Ignoring notification '{}'", other),
    }
}

fn power(state: PowerState) -> TriggerEvent {
    TriggerEvent::PowerStateChanged { state }
}

async fn on_play(conn: &Connection, bus: &TriggerBus, data: &Value) {
    let item_type = data["item"]["type"].as_str().unwrap_or_default().to_string();
    let player_id = data["player"]["playerid"].as_i64().unwrap_or(1);

    let percentage = match playback_percentage(conn, player_id).await {
        Ok(p) => p,
        Err(e) => {
            warn!("Could not fetch playback position: {}", e);
            return;
        }
    };

    if is_resume(&item_type, percentage) {
        debug!("{} at {:.1}%, treating as resume", item_type, percentage);
        bus.emit(TriggerEvent::Resumed);
        return;
    }

    match media_info(conn, &data["item"]).await {
        Some(MediaInfo::Movie { title }) => bus.emit(TriggerEvent::MovieStarted { title }),
        Some(MediaInfo::Episode {
            show,
            season,
            episode,
            title,
        }) => bus.emit(TriggerEvent::EpisodeStarted {
            show,
            season,
            episode,
            title,
        }),
        Some(MediaInfo::Song { artist, title }) => {
            bus.emit(TriggerEvent::SongStarted { artist, title })
        }
        None => debug!("No start trigger for item type '{}'", item_type),
    }
}

async fn on_stop(conn: &Connection, bus: &TriggerBus, data: &Value) {
    bus.emit(TriggerEvent::Stopped);

    // Only a natural end-of-stream gets the type-specific trigger
    if !data["end"].as_bool().unwrap_or(false) {
        return;
    }

    match media_info(conn, &data["item"]).await {
        Some(MediaInfo::Movie { title }) => bus.emit(TriggerEvent::MovieEnded { title }),
        Some(MediaInfo::Episode {
            show,
            season,
            episode,
            title,
        }) => bus.emit(TriggerEvent::EpisodeEnded {
            show,
            season,
            episode,
            title,
        }),
        Some(MediaInfo::Song { artist, title }) => {
            bus.emit(TriggerEvent::SongEnded { artist, title })
        }
        None => {}
    }
}

/// Resume threshold per item type: audio restarts report a slightly advanced
/// position, so songs get a wider window than video.
fn resume_threshold(item_type: &str) -> f64 {
    match item_type {
        "song" => RESUME_THRESHOLD_AUDIO,
        _ => RESUME_THRESHOLD_VIDEO,
    }
}

fn is_resume(item_type: &str, percentage: f64) -> bool {
    percentage > resume_threshold(item_type)
}

async fn playback_percentage(conn: &Connection, player_id: i64) -> Result<f64, RpcError> {
    let result = conn
        .call(
            "Player.GetProperties",
            json!({"playerid": player_id, "properties": ["percentage"]}),
        )
        .await?;
    Ok(result["percentage"].as_f64().unwrap_or(0.0))
}

enum MediaInfo {
    Movie {
        title: String,
    },
    Episode {
        show: String,
        season: i64,
        episode: i64,
        title: String,
    },
    Song {
        artist: String,
        title: String,
    },
}

/// Resolve descriptive tokens for an event item, fetching by id when the
/// payload has no inline metadata. `None` means the trigger is dropped.
async fn media_info(conn: &Connection, item: &Value) -> Option<MediaInfo> {
    let id = item["id"].as_i64();
    match item["type"].as_str().unwrap_or_default() {
        "movie" => {
            if let Some(title) = item["title"].as_str().filter(|t| !t.is_empty()) {
                return Some(MediaInfo::Movie {
                    title: title.to_string(),
                });
            }
            let result = conn
                .call(
                    "VideoLibrary.GetMovieDetails",
                    json!({"movieid": id?, "properties": ["title"]}),
                )
                .await
                .map_err(|e| warn!("Movie lookup failed: {}", e))
                .ok()?;
            let details = &result["moviedetails"];
            let title = details["title"]
                .as_str()
                .filter(|t| !t.is_empty())
                .or_else(|| details["label"].as_str())?;
            Some(MediaInfo::Movie {
                title: title.to_string(),
            })
        }
        "episode" => {
            let result = conn
                .call(
                    "VideoLibrary.GetEpisodeDetails",
                    json!({
                        "episodeid": id?,
                        "properties": ["showtitle", "season", "episode", "title"]
                    }),
                )
                .await
                .map_err(|e| warn!("Episode lookup failed: {}", e))
                .ok()?;
            let details = &result["episodedetails"];
            Some(MediaInfo::Episode {
                show: details["showtitle"].as_str().unwrap_or_default().to_string(),
                season: details["season"].as_i64().unwrap_or(0),
                episode: details["episode"].as_i64().unwrap_or(0),
                title: details["title"]
                    .as_str()
                    .filter(|t| !t.is_empty())
                    .or_else(|| details["label"].as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        }
        "song" => {
            let result = conn
                .call(
                    "AudioLibrary.GetSongDetails",
                    json!({"songid": id?, "properties": ["artist", "title"]}),
                )
                .await
                .map_err(|e| warn!("Song lookup failed: {}", e))
                .ok()?;
            let details = &result["songdetails"];
            let artist = match details["artist"].as_array() {
                Some(artists) => artists
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                None => details["artist"].as_str().unwrap_or_default().to_string(),
            };
            Some(MediaInfo::Song {
                artist,
                title: details["title"]
                    .as_str()
                    .filter(|t| !t.is_empty())
                    .or_else(|| details["label"].as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        }
        _ => None,
    }
}
