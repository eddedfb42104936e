//! Inbound intent boundary
//!
//! The hub's speech layer delivers a matched trigger id plus the raw
//! transcript; the flow layer delivers structured action arguments. Both
//! dispatch into the orchestrator here. Failures on the speech path are
//! spoken back through the `SpeechOut` collaborator; flow failures surface
//! to the caller as the action's error.

use crate::error::BridgeResult;
use crate::orchestrator::{MusicScope, Orchestrator, TrackDirection};
use crate::registry::DeviceRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Supported speech trigger ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechIntent {
    PlayMovie,
    PlayTvShow,
    PlayMusic,
}

impl SpeechIntent {
    pub fn from_trigger_id(id: &str) -> Option<Self> {
        match id {
            "play_movie" => Some(SpeechIntent::PlayMovie),
            "play_tvshow" => Some(SpeechIntent::PlayTvShow),
            "play_music" => Some(SpeechIntent::PlayMusic),
            _ => None,
        }
    }
}

/// Text-to-speech collaborator for talkback
#[async_trait]
pub trait SpeechOut: Send + Sync {
    async fn say(&self, text: &str);
}

/// Strip the matched trigger phrase from the transcript, leaving the
/// free-text argument ("play movie the matrix" becomes "the matrix").
pub fn strip_trigger(transcript: &str, trigger_text: &str) -> String {
    transcript.replacen(trigger_text, "", 1).trim().to_string()
}

/// Handle one speech intent end to end; any failure becomes spoken feedback.
///
/// Speech carries no device argument, so resolution relies on the registry's
/// single-device convenience rule.
pub async fn handle_speech(
    orchestrator: &Orchestrator,
    intent: SpeechIntent,
    transcript: &str,
    trigger_text: &str,
    voice: &dyn SpeechOut,
) {
    let query = strip_trigger(transcript, trigger_text);
    info!("🗣️ {:?}: '{}'", intent, query);

    let device = DeviceRef::Any;
    let outcome = match intent {
        SpeechIntent::PlayMovie => orchestrator.search_and_play_movie(&device, &query).await,
        SpeechIntent::PlayTvShow => orchestrator.play_latest_episode(&device, &query).await,
        SpeechIntent::PlayMusic => {
            orchestrator
                .search_and_play_music(&device, MusicScope::Artist, &query, true)
                .await
        }
    };

    match outcome {
        Ok(label) => voice.say(&format!("Playing {}", label)).await,
        Err(e) => voice.say(&e.user_message()).await,
    }
}

/// Structured flow-card arguments, as the automation layer delivers them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlowAction {
    PlayMovie {
        #[serde(default)]
        device: Option<String>,
        title: String,
    },
    PlayMusic {
        #[serde(default)]
        device: Option<String>,
        scope: MusicScope,
        query: String,
        #[serde(default)]
        shuffle: bool,
    },
    PlayLatestEpisode {
        #[serde(default)]
        device: Option<String>,
        series: String,
    },
    StartAddon {
        #[serde(default)]
        device: Option<String>,
        name: String,
    },
    PlayPause {
        #[serde(default)]
        device: Option<String>,
    },
    Stop {
        #[serde(default)]
        device: Option<String>,
    },
    NextTrack {
        #[serde(default)]
        device: Option<String>,
    },
    PreviousTrack {
        #[serde(default)]
        device: Option<String>,
    },
    SetVolume {
        #[serde(default)]
        device: Option<String>,
        volume: u8,
    },
    Mute {
        #[serde(default)]
        device: Option<String>,
    },
    Unmute {
        #[serde(default)]
        device: Option<String>,
    },
    SubtitlesOn {
        #[serde(default)]
        device: Option<String>,
    },
    SubtitlesOff {
        #[serde(default)]
        device: Option<String>,
    },
    Hibernate {
        #[serde(default)]
        device: Option<String>,
    },
    Reboot {
        #[serde(default)]
        device: Option<String>,
    },
    Shutdown {
        #[serde(default)]
        device: Option<String>,
    },
}

/// Execute one flow action. The flow layer surfaces the error to the user;
/// nothing is spoken from here.
pub async fn run_flow_action(orchestrator: &Orchestrator, action: FlowAction) -> BridgeResult<()> {
    let device = |d: &Option<String>| DeviceRef::from_option(d.as_deref());

    match action {
        FlowAction::PlayMovie { device: d, title } => {
            orchestrator
                .search_and_play_movie(&device(&d), &title)
                .await?;
        }
        FlowAction::PlayMusic {
            device: d,
            scope,
            query,
            shuffle,
        } => {
            orchestrator
                .search_and_play_music(&device(&d), scope, &query, shuffle)
                .await?;
        }
        FlowAction::PlayLatestEpisode { device: d, series } => {
            orchestrator.play_latest_episode(&device(&d), &series).await?;
        }
        FlowAction::StartAddon { device: d, name } => {
            orchestrator
                .search_and_start_addon(&device(&d), &name)
                .await?;
        }
        FlowAction::PlayPause { device: d } => orchestrator.play_pause(&device(&d)).await?,
        FlowAction::Stop { device: d } => orchestrator.stop(&device(&d)).await?,
        FlowAction::NextTrack { device: d } => {
            orchestrator
                .skip_track(&device(&d), TrackDirection::Next)
                .await?
        }
        FlowAction::PreviousTrack { device: d } => {
            orchestrator
                .skip_track(&device(&d), TrackDirection::Previous)
                .await?
        }
        FlowAction::SetVolume { device: d, volume } => {
            orchestrator.set_volume(&device(&d), volume).await?
        }
        FlowAction::Mute { device: d } => orchestrator.set_mute(&device(&d), true).await?,
        FlowAction::Unmute { device: d } => orchestrator.set_mute(&device(&d), false).await?,
        FlowAction::SubtitlesOn { device: d } => {
            orchestrator.set_subtitles(&device(&d), true).await?
        }
        FlowAction::SubtitlesOff { device: d } => {
            orchestrator.set_subtitles(&device(&d), false).await?
        }
        FlowAction::Hibernate { device: d } => orchestrator.hibernate(&device(&d)).await?,
        FlowAction::Reboot { device: d } => orchestrator.reboot(&device(&d)).await?,
        FlowAction::Shutdown { device: d } => orchestrator.shutdown(&device(&d)).await?,
    }
    Ok(())
}
