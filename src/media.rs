//! Library data types
//!
//! Plain serde mappings of the JSON-RPC library listings the bridge fetches.
//! Listings are ephemeral: fetched fresh per search, never cached.

use serde::Deserialize;
use serde_json::Value;

/// Media kind, used for per-type errors and event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    TvShow,
    Episode,
    Artist,
    Album,
    Song,
    Addon,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "TV show",
            MediaKind::Episode => "episode",
            MediaKind::Artist => "artist",
            MediaKind::Album => "album",
            MediaKind::Song => "song",
            MediaKind::Addon => "addon",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Movie {
    pub movieid: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TvShow {
    pub tvshowid: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Episode {
    pub episodeid: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub showtitle: String,
    #[serde(default)]
    pub season: i64,
    #[serde(default)]
    pub episode: i64,
    #[serde(default)]
    pub playcount: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artist {
    pub artistid: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
    pub albumid: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Song {
    pub songid: i64,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Addon {
    pub addonid: String,
    #[serde(default)]
    pub name: String,
}

/// One entry of `Player.GetActivePlayers`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivePlayer {
    pub playerid: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Pull a typed list out of a call result, tolerating a missing key.
///
/// The remote omits the list field entirely when a library section is empty,
/// so absence maps to an empty vec rather than a decode error.
pub fn parse_list<T: serde::de::DeserializeOwned>(result: &Value, key: &str) -> Vec<T> {
    match result.get(key) {
        Some(list) => serde_json::from_value(list.clone()).unwrap_or_default(),
        None => Vec::new(),
    }
}
