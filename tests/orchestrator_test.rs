mod common;

use common::mock_speech::MockSpeech;
use common::mock_transport::MockTransport;
use common::single_device;
use kodilink::config::Config;
use kodilink::error::BridgeError;
use kodilink::intents::{handle_speech, SpeechIntent};
use kodilink::media::MediaKind;
use kodilink::orchestrator::{MusicScope, Orchestrator, TrackDirection};
use kodilink::registry::{DeviceRef, DeviceRegistry};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_search_and_play_movie_opens_best_match() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "VideoLibrary.GetMovies",
        json!({"movies": [
            {"movieid": 1, "label": "The Matrix"},
            {"movieid": 2, "label": "Matrix Reloaded"}
        ]}),
    );
    mock.respond("Player.Open", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    let title = orchestrator
        .search_and_play_movie(&DeviceRef::Any, "matrix")
        .await
        .unwrap();

    assert_eq!(title, "The Matrix");
    let opens = mock.calls_to("Player.Open");
    assert_eq!(opens.len(), 1);
    assert_eq!(opens[0]["item"]["movieid"], 1);
}

#[tokio::test]
async fn test_empty_movie_library_fails_before_matching() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("VideoLibrary.GetMovies", json!({"limits": {"total": 0}}));
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .search_and_play_movie(&DeviceRef::Any, "matrix")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::LibraryEmpty(MediaKind::Movie)));
    assert!(!mock.was_called("Player.Open"));
}

#[tokio::test]
async fn test_unmatched_movie_title_is_not_found() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "VideoLibrary.GetMovies",
        json!({"movies": [{"movieid": 1, "label": "The Matrix"}]}),
    );
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .search_and_play_movie(&DeviceRef::Any, "completely unrelated gibberish")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::NoMatch(MediaKind::Movie)));
    assert!(!mock.was_called("Player.Open"));
}

#[tokio::test]
async fn test_empty_registry_fails_with_device_not_found() {
    let registry = Arc::new(DeviceRegistry::new());
    let orchestrator = Orchestrator::new(registry, &Config::default());

    let err = orchestrator
        .search_and_play_movie(&DeviceRef::Any, "matrix")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::DeviceNotFound));
}

#[tokio::test]
async fn test_play_music_by_artist_queues_and_plays() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "AudioLibrary.GetArtists",
        json!({"artists": [
            {"artistid": 10, "label": "Daft Punk"},
            {"artistid": 11, "label": "Deadmau5"}
        ]}),
    );
    mock.respond(
        "AudioLibrary.GetSongs",
        json!({"songs": [
            {"songid": 100, "label": "One More Time"},
            {"songid": 101, "label": "Around the World"}
        ]}),
    );
    mock.respond("Playlist.Clear", json!("OK"));
    mock.respond("Playlist.Add", json!("OK"));
    mock.respond("Player.Open", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    let label = orchestrator
        .search_and_play_music(&DeviceRef::Any, MusicScope::Artist, "daft punk", false)
        .await
        .unwrap();

    assert_eq!(label, "Daft Punk");

    // Songs are fetched filtered by the matched artist
    let songs = mock.calls_to("AudioLibrary.GetSongs");
    assert_eq!(songs[0]["filter"]["artistid"], 10);

    // Queue order preserved without shuffle
    let adds = mock.calls_to("Playlist.Add");
    assert_eq!(adds[0]["item"][0]["songid"], 100);
    assert_eq!(adds[0]["item"][1]["songid"], 101);

    // Clear before add before open, with repeat-all
    let methods: Vec<String> = mock.calls().into_iter().map(|(m, _)| m).collect();
    let clear_at = methods.iter().position(|m| m == "Playlist.Clear").unwrap();
    let add_at = methods.iter().position(|m| m == "Playlist.Add").unwrap();
    let open_at = methods.iter().position(|m| m == "Player.Open").unwrap();
    assert!(clear_at < add_at && add_at < open_at);
    let opens = mock.calls_to("Player.Open");
    assert_eq!(opens[0]["options"]["repeat"], "all");
}

#[tokio::test]
async fn test_play_music_album_scope_not_found() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "AudioLibrary.GetAlbums",
        json!({"albums": [{"albumid": 5, "label": "Discovery"}]}),
    );
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .search_and_play_music(&DeviceRef::Any, MusicScope::Album, "xyzzy nonsense", false)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::NoMatch(MediaKind::Album)));
}

#[tokio::test]
async fn test_matched_artist_with_no_songs() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "AudioLibrary.GetArtists",
        json!({"artists": [{"artistid": 10, "label": "Daft Punk"}]}),
    );
    mock.respond("AudioLibrary.GetSongs", json!({"limits": {"total": 0}}));
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .search_and_play_music(&DeviceRef::Any, MusicScope::Artist, "daft punk", false)
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::LibraryEmpty(MediaKind::Song)));
    assert!(!mock.was_called("Playlist.Clear"));
}

#[tokio::test]
async fn test_play_latest_episode_picks_lowest_unwatched() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "VideoLibrary.GetTVShows",
        json!({"tvshows": [{"tvshowid": 3, "label": "Breaking Bad"}]}),
    );
    mock.respond(
        "VideoLibrary.GetEpisodes",
        json!({"episodes": [
            {"episodeid": 31, "label": "Pilot", "episode": 1, "playcount": 2},
            {"episodeid": 33, "label": "And the Bag's in the River", "episode": 3, "playcount": 0},
            {"episodeid": 32, "label": "Cat's in the Bag...", "episode": 2, "playcount": 0}
        ]}),
    );
    mock.respond("Player.Open", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator
        .play_latest_episode(&DeviceRef::Any, "breaking bad")
        .await
        .unwrap();

    // Episode 2 is the lowest-numbered unwatched one, even though the remote
    // returned episode 3 first
    let opens = mock.calls_to("Player.Open");
    assert_eq!(opens[0]["item"]["episodeid"], 32);
}

#[tokio::test]
async fn test_play_latest_episode_all_watched() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "VideoLibrary.GetTVShows",
        json!({"tvshows": [{"tvshowid": 3, "label": "Breaking Bad"}]}),
    );
    mock.respond(
        "VideoLibrary.GetEpisodes",
        json!({"episodes": [
            {"episodeid": 31, "label": "Pilot", "episode": 1, "playcount": 1},
            {"episodeid": 32, "label": "Cat's in the Bag...", "episode": 2, "playcount": 3}
        ]}),
    );
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .play_latest_episode(&DeviceRef::Any, "breaking bad")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::NoUnwatchedEpisode));
}

#[tokio::test]
async fn test_play_latest_episode_no_shows_at_all() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("VideoLibrary.GetTVShows", json!({"limits": {"total": 0}}));
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .play_latest_episode(&DeviceRef::Any, "breaking bad")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::LibraryEmpty(MediaKind::TvShow)));
}

#[tokio::test]
async fn test_start_addon_executes_match() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "Addons.GetAddons",
        json!({"addons": [
            {"addonid": "plugin.video.youtube", "name": "YouTube"},
            {"addonid": "plugin.video.netflix", "name": "Netflix"}
        ]}),
    );
    mock.respond("Addons.ExecuteAddon", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    let name = orchestrator
        .search_and_start_addon(&DeviceRef::Any, "netflix")
        .await
        .unwrap();

    assert_eq!(name, "Netflix");
    let executes = mock.calls_to("Addons.ExecuteAddon");
    assert_eq!(executes[0]["addonid"], "plugin.video.netflix");
}

#[tokio::test]
async fn test_play_pause_with_no_active_player_is_a_no_op() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("Player.GetActivePlayers", json!([]));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator.play_pause(&DeviceRef::Any).await.unwrap();

    assert!(!mock.was_called("Player.PlayPause"));
}

#[tokio::test]
async fn test_play_pause_toggles_every_active_player() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "Player.GetActivePlayers",
        json!([{"playerid": 0, "type": "audio"}, {"playerid": 1, "type": "video"}]),
    );
    mock.respond("Player.PlayPause", json!({"speed": 0}));
    mock.respond("Player.PlayPause", json!({"speed": 0}));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator.play_pause(&DeviceRef::Any).await.unwrap();

    assert_eq!(mock.calls_to("Player.PlayPause").len(), 2);
}

#[tokio::test]
async fn test_skip_track_goes_next() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "Player.GetActivePlayers",
        json!([{"playerid": 0, "type": "audio"}]),
    );
    mock.respond("Player.GoTo", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator
        .skip_track(&DeviceRef::Any, TrackDirection::Next)
        .await
        .unwrap();

    assert_eq!(mock.calls_to("Player.GoTo")[0]["to"], "next");
}

#[tokio::test]
async fn test_subtitles_only_touch_video_players() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "Player.GetActivePlayers",
        json!([{"playerid": 0, "type": "audio"}, {"playerid": 1, "type": "video"}]),
    );
    mock.respond("Player.SetSubtitle", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator
        .set_subtitles(&DeviceRef::Any, true)
        .await
        .unwrap();

    let calls = mock.calls_to("Player.SetSubtitle");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["playerid"], 1);
    assert_eq!(calls[0]["subtitle"], "on");
}

#[tokio::test]
async fn test_volume_is_clamped() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("Application.SetVolume", json!(100));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator.set_volume(&DeviceRef::Any, 250).await.unwrap();

    assert_eq!(mock.calls_to("Application.SetVolume")[0]["volume"], 100);
}

#[tokio::test]
async fn test_hibernate_is_one_shot() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("System.Hibernate", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());

    orchestrator.hibernate(&DeviceRef::Any).await.unwrap();

    assert!(mock.was_called("System.Hibernate"));
}

#[tokio::test]
async fn test_newest_movies_empty_is_nothing_new() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("VideoLibrary.GetMovies", json!({"limits": {"total": 0}}));
    let (_registry, orchestrator) = single_device(mock.clone());

    let err = orchestrator
        .get_newest_movies(&DeviceRef::Any, Some(7))
        .await
        .unwrap_err();

    // Distinct from LibraryEmpty: the library may be full, just nothing recent
    assert!(matches!(err, BridgeError::NothingNew(MediaKind::Movie)));

    let params = mock.calls_to("VideoLibrary.GetMovies");
    assert_eq!(params[0]["filter"]["field"], "dateadded");
    assert_eq!(params[0]["filter"]["operator"], "greaterthan");
}

#[tokio::test]
async fn test_newest_episodes_returns_matches() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "VideoLibrary.GetEpisodes",
        json!({"episodes": [
            {"episodeid": 9, "label": "Ozymandias", "showtitle": "Breaking Bad",
             "season": 5, "episode": 14}
        ]}),
    );
    let (_registry, orchestrator) = single_device(mock.clone());

    let episodes = orchestrator
        .get_newest_episodes(&DeviceRef::Any, None)
        .await
        .unwrap();

    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].showtitle, "Breaking Bad");
}

#[tokio::test]
async fn test_speech_play_movie_speaks_result() {
    let mock = Arc::new(MockTransport::new());
    mock.respond(
        "VideoLibrary.GetMovies",
        json!({"movies": [{"movieid": 1, "label": "The Matrix"}]}),
    );
    mock.respond("Player.Open", json!("OK"));
    let (_registry, orchestrator) = single_device(mock.clone());
    let voice = MockSpeech::new();

    handle_speech(
        &orchestrator,
        SpeechIntent::PlayMovie,
        "play movie the matrix",
        "play movie",
        &voice,
    )
    .await;

    assert!(voice.was_spoken("Playing The Matrix"));
}

#[tokio::test]
async fn test_speech_failure_is_spoken_back() {
    let mock = Arc::new(MockTransport::new());
    mock.respond("VideoLibrary.GetMovies", json!({"limits": {"total": 0}}));
    let (_registry, orchestrator) = single_device(mock.clone());
    let voice = MockSpeech::new();

    handle_speech(
        &orchestrator,
        SpeechIntent::PlayMovie,
        "play movie the matrix",
        "play movie",
        &voice,
    )
    .await;

    assert!(voice.was_spoken("There are no movies in your library"));
}
