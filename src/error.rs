//! Kodilink Error Types
//!
//! Centralized error handling for the bridge. Every saga failure is one of
//! these kinds; the speech path turns them into talkback with
//! [`BridgeError::user_message`].

use crate::media::MediaKind;
use crate::rpc::RpcError;
use thiserror::Error;

/// Central error type for Kodilink
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("no device matched the given reference")]
    DeviceNotFound,

    #[error("the library has no {0}s")]
    LibraryEmpty(MediaKind),

    #[error("no {0} matched the query")]
    NoMatch(MediaKind),

    #[error("every episode of the matched show is already watched")]
    NoUnwatchedEpisode,

    #[error("no new {0}s in the requested period")]
    NothingNew(MediaKind),

    #[error("remote call failed: {0}")]
    RemoteCall(RpcError),

    #[error("connection to the device was lost")]
    ConnectionLost,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Kodilink operations
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// User-facing message, suitable for speaking back through TTS.
    pub fn user_message(&self) -> String {
        match self {
            BridgeError::DeviceNotFound => "I could not find that device".to_string(),
            BridgeError::LibraryEmpty(kind) => match kind {
                MediaKind::Movie => "There are no movies in your library".to_string(),
                MediaKind::TvShow => "There are no TV shows in your library".to_string(),
                MediaKind::Song => "There are no songs for that selection".to_string(),
                other => format!("There are no {}s in your library", other),
            },
            BridgeError::NoMatch(kind) => format!("I could not find that {}", kind),
            BridgeError::NoUnwatchedEpisode => {
                "You have already watched every episode of that show".to_string()
            }
            BridgeError::NothingNew(kind) => format!("There are no new {}s", kind),
            BridgeError::RemoteCall(_) | BridgeError::ConnectionLost => {
                "Something went wrong talking to your media center".to_string()
            }
            BridgeError::Io(_) | BridgeError::Json(_) => "Something went wrong".to_string(),
        }
    }
}

/// A closed transport means the supervisor is already reconnecting; the
/// in-flight saga just fails with the dedicated kind.
impl From<RpcError> for BridgeError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::ConnectionClosed => BridgeError::ConnectionLost,
            other => BridgeError::RemoteCall(other),
        }
    }
}
