//! Command Orchestrator
//!
//! The library of composed operations. Every operation follows the same saga
//! shape: resolve the device, optionally fetch a library listing and
//! fuzzy-match it, then issue the dependent remote calls. Operations are
//! independent of each other; callers serialize conflicting intents.
//!
//! Search operations return the matched label so the speech path can confirm
//! what was actually picked. Playback lifecycle triggers are emitted by the
//! event notifier, not from here.

use crate::config::Config;
use crate::connection::Connection;
use crate::error::{BridgeError, BridgeResult};
use crate::fuzzy::{self, MatchOptions};
use crate::media::{
    parse_list, ActivePlayer, Addon, Album, Artist, Episode, MediaKind, Movie, Song, TvShow,
};
use crate::registry::{DeviceRef, DeviceRegistry};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Audio playlist id on the remote target
const AUDIO_PLAYLIST_ID: i64 = 0;

/// Scope of a music search
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicScope {
    Artist,
    Album,
}

/// Direction for track skipping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackDirection {
    Next,
    Previous,
}

pub struct Orchestrator {
    registry: Arc<DeviceRegistry>,
    match_opts: MatchOptions,
    newest_days: i64,
}

impl Orchestrator {
    pub fn new(registry: Arc<DeviceRegistry>, config: &Config) -> Self {
        Self {
            registry,
            match_opts: MatchOptions {
                threshold: config.fuzzy_threshold,
            },
            newest_days: config.newest_days,
        }
    }

    /// Fetch the movie library, match `title`, open the player on the hit.
    pub async fn search_and_play_movie(
        &self,
        device: &DeviceRef,
        title: &str,
    ) -> BridgeResult<String> {
        let conn = self.registry.resolve(device)?;

        let result = conn.call("VideoLibrary.GetMovies", Value::Null).await?;
        let movies: Vec<Movie> = parse_list(&result, "movies");
        if movies.is_empty() {
            return Err(BridgeError::LibraryEmpty(MediaKind::Movie));
        }

        let movie = fuzzy::best_match(&self.match_opts, &movies, |m| m.label.as_str(), title)
            .ok_or(BridgeError::NoMatch(MediaKind::Movie))?;
        info!("🎬 Matched movie '{}' (id {})", movie.label, movie.movieid);

        conn.call("Player.Open", json!({"item": {"movieid": movie.movieid}}))
            .await?;
        Ok(movie.label.clone())
    }

    /// Match an artist or album, queue its songs and start playback with
    /// repeat-all. `shuffle` randomizes the queue order before enqueueing.
    pub async fn search_and_play_music(
        &self,
        device: &DeviceRef,
        scope: MusicScope,
        query: &str,
        shuffle: bool,
    ) -> BridgeResult<String> {
        let conn = self.registry.resolve(device)?;

        let (label, filter) = match scope {
            MusicScope::Artist => {
                let result = conn.call("AudioLibrary.GetArtists", Value::Null).await?;
                let artists: Vec<Artist> = parse_list(&result, "artists");
                if artists.is_empty() {
                    return Err(BridgeError::LibraryEmpty(MediaKind::Artist));
                }
                let artist =
                    fuzzy::best_match(&self.match_opts, &artists, |a| a.label.as_str(), query)
                        .ok_or(BridgeError::NoMatch(MediaKind::Artist))?;
                info!("🎤 Matched artist '{}'", artist.label);
                (artist.label.clone(), json!({"artistid": artist.artistid}))
            }
            MusicScope::Album => {
                let result = conn.call("AudioLibrary.GetAlbums", Value::Null).await?;
                let albums: Vec<Album> = parse_list(&result, "albums");
                if albums.is_empty() {
                    return Err(BridgeError::LibraryEmpty(MediaKind::Album));
                }
                let album =
                    fuzzy::best_match(&self.match_opts, &albums, |a| a.label.as_str(), query)
                        .ok_or(BridgeError::NoMatch(MediaKind::Album))?;
                info!("💿 Matched album '{}'", album.label);
                (album.label.clone(), json!({"albumid": album.albumid}))
            }
        };

        let result = conn
            .call("AudioLibrary.GetSongs", json!({"filter": filter}))
            .await?;
        let mut songs: Vec<Song> = parse_list(&result, "songs");
        if songs.is_empty() {
            return Err(BridgeError::LibraryEmpty(MediaKind::Song));
        }
        if shuffle {
            songs.shuffle(&mut rand::thread_rng());
        }

        conn.call("Playlist.Clear", json!({"playlistid": AUDIO_PLAYLIST_ID}))
            .await?;
        let items: Vec<Value> = songs.iter().map(|s| json!({"songid": s.songid})).collect();
        conn.call(
            "Playlist.Add",
            json!({"playlistid": AUDIO_PLAYLIST_ID, "item": items}),
        )
        .await?;
        conn.call(
            "Player.Open",
            json!({
                "item": {"playlistid": AUDIO_PLAYLIST_ID, "position": 0},
                "options": {"repeat": "all"}
            }),
        )
        .await?;

        info!("🎵 Queued {} songs for '{}'", songs.len(), label);
        Ok(label)
    }

    /// Match a TV show and play its first unwatched episode.
    pub async fn play_latest_episode(
        &self,
        device: &DeviceRef,
        series: &str,
    ) -> BridgeResult<String> {
        let conn = self.registry.resolve(device)?;

        let result = conn.call("VideoLibrary.GetTVShows", Value::Null).await?;
        let shows: Vec<TvShow> = parse_list(&result, "tvshows");
        if shows.is_empty() {
            return Err(BridgeError::LibraryEmpty(MediaKind::TvShow));
        }

        let show = fuzzy::best_match(&self.match_opts, &shows, |s| s.label.as_str(), series)
            .ok_or(BridgeError::NoMatch(MediaKind::TvShow))?;
        info!("📺 Matched show '{}' (id {})", show.label, show.tvshowid);

        let result = conn
            .call(
                "VideoLibrary.GetEpisodes",
                json!({
                    "tvshowid": show.tvshowid,
                    "properties": ["playcount", "showtitle", "season", "episode"],
                    "sort": {"order": "ascending", "method": "episode"}
                }),
            )
            .await?;
        let mut episodes: Vec<Episode> = parse_list(&result, "episodes");
        episodes.sort_by_key(|e| e.episode);

        let unwatched = episodes
            .iter()
            .find(|e| e.playcount == 0)
            .ok_or(BridgeError::NoUnwatchedEpisode)?;
        info!(
            "▶️ First unwatched: episode {} '{}'",
            unwatched.episode, unwatched.label
        );

        conn.call(
            "Player.Open",
            json!({"item": {"episodeid": unwatched.episodeid}}),
        )
        .await?;
        Ok(format!("{} - {}", show.label, unwatched.label))
    }

    /// Match an installed addon by name and execute it.
    pub async fn search_and_start_addon(
        &self,
        device: &DeviceRef,
        name: &str,
    ) -> BridgeResult<String> {
        let conn = self.registry.resolve(device)?;

        let result = conn
            .call(
                "Addons.GetAddons",
                json!({"properties": ["name"], "enabled": true}),
            )
            .await?;
        let addons: Vec<Addon> = parse_list(&result, "addons");
        if addons.is_empty() {
            return Err(BridgeError::LibraryEmpty(MediaKind::Addon));
        }

        let addon = fuzzy::best_match(&self.match_opts, &addons, |a| a.name.as_str(), name)
            .ok_or(BridgeError::NoMatch(MediaKind::Addon))?;
        info!("🧩 Matched addon '{}' ({})", addon.name, addon.addonid);

        conn.call("Addons.ExecuteAddon", json!({"addonid": addon.addonid}))
            .await?;
        Ok(addon.name.clone())
    }

    /// Toggle play/pause on every active player. Nothing playing is a normal
    /// state, not an error.
    pub async fn play_pause(&self, device: &DeviceRef) -> BridgeResult<()> {
        let conn = self.registry.resolve(device)?;
        for player in self.active_players(&conn).await? {
            conn.call("Player.PlayPause", json!({"playerid": player.playerid}))
                .await?;
        }
        Ok(())
    }

    /// Stop every active player; silent no-op when nothing plays.
    pub async fn stop(&self, device: &DeviceRef) -> BridgeResult<()> {
        let conn = self.registry.resolve(device)?;
        for player in self.active_players(&conn).await? {
            conn.call("Player.Stop", json!({"playerid": player.playerid}))
                .await?;
        }
        Ok(())
    }

    /// Skip forward or back on every active player; silent no-op when
    /// nothing plays.
    pub async fn skip_track(
        &self,
        device: &DeviceRef,
        direction: TrackDirection,
    ) -> BridgeResult<()> {
        let to = match direction {
            TrackDirection::Next => "next",
            TrackDirection::Previous => "previous",
        };
        let conn = self.registry.resolve(device)?;
        for player in self.active_players(&conn).await? {
            conn.call(
                "Player.GoTo",
                json!({"playerid": player.playerid, "to": to}),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn hibernate(&self, device: &DeviceRef) -> BridgeResult<()> {
        self.system_call(device, "System.Hibernate").await
    }

    pub async fn reboot(&self, device: &DeviceRef) -> BridgeResult<()> {
        self.system_call(device, "System.Reboot").await
    }

    pub async fn shutdown(&self, device: &DeviceRef) -> BridgeResult<()> {
        self.system_call(device, "System.Shutdown").await
    }

    /// Set the application volume, clamped to 0..=100.
    pub async fn set_volume(&self, device: &DeviceRef, volume: u8) -> BridgeResult<()> {
        let conn = self.registry.resolve(device)?;
        conn.call(
            "Application.SetVolume",
            json!({"volume": volume.min(100)}),
        )
        .await?;
        Ok(())
    }

    pub async fn set_mute(&self, device: &DeviceRef, mute: bool) -> BridgeResult<()> {
        let conn = self.registry.resolve(device)?;
        conn.call("Application.SetMute", json!({"mute": mute})).await?;
        Ok(())
    }

    /// Turn subtitles on or off on active video players; silent no-op when
    /// nothing plays.
    pub async fn set_subtitles(&self, device: &DeviceRef, enabled: bool) -> BridgeResult<()> {
        let subtitle = if enabled { "on" } else { "off" };
        let conn = self.registry.resolve(device)?;
        for player in self.active_players(&conn).await? {
            if player.kind != "video" {
                continue;
            }
            conn.call(
                "Player.SetSubtitle",
                json!({"playerid": player.playerid, "subtitle": subtitle}),
            )
            .await?;
        }
        Ok(())
    }

    /// Movies added in the last `days` days (configured default when `None`).
    pub async fn get_newest_movies(
        &self,
        device: &DeviceRef,
        days: Option<i64>,
    ) -> BridgeResult<Vec<Movie>> {
        let conn = self.registry.resolve(device)?;
        let cutoff = cutoff_date(days.unwrap_or(self.newest_days));

        let result = conn
            .call(
                "VideoLibrary.GetMovies",
                json!({
                    "filter": {"field": "dateadded", "operator": "greaterthan", "value": cutoff}
                }),
            )
            .await?;
        let movies: Vec<Movie> = parse_list(&result, "movies");
        if movies.is_empty() {
            return Err(BridgeError::NothingNew(MediaKind::Movie));
        }
        Ok(movies)
    }

    /// Episodes added in the last `days` days (configured default when `None`).
    pub async fn get_newest_episodes(
        &self,
        device: &DeviceRef,
        days: Option<i64>,
    ) -> BridgeResult<Vec<Episode>> {
        let conn = self.registry.resolve(device)?;
        let cutoff = cutoff_date(days.unwrap_or(self.newest_days));

        let result = conn
            .call(
                "VideoLibrary.GetEpisodes",
                json!({
                    "properties": ["showtitle", "season", "episode"],
                    "filter": {"field": "dateadded", "operator": "greaterthan", "value": cutoff}
                }),
            )
            .await?;
        let episodes: Vec<Episode> = parse_list(&result, "episodes");
        if episodes.is_empty() {
            return Err(BridgeError::NothingNew(MediaKind::Episode));
        }
        Ok(episodes)
    }

    async fn system_call(&self, device: &DeviceRef, method: &str) -> BridgeResult<()> {
        let conn = self.registry.resolve(device)?;
        conn.call(method, Value::Null).await?;
        Ok(())
    }

    async fn active_players(&self, conn: &Connection) -> BridgeResult<Vec<ActivePlayer>> {
        let result = conn.call("Player.GetActivePlayers", Value::Null).await?;
        let players: Vec<ActivePlayer> = serde_json::from_value(result).unwrap_or_default();
        if players.is_empty() {
            debug!("No active player on {}", conn.host());
        }
        Ok(players)
    }
}

fn cutoff_date(days: i64) -> String {
    (Utc::now() - chrono::Duration::days(days))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
