//! Player server client interface (MPD)
//!
//! The dispatcher only talks to the player through these traits so that the
//! connection logic and command flows can be exercised without a server.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub mod mpd;

#[cfg(test)]
pub(crate) mod mock;

pub use self::mpd::MpdConnector;

/// Playback state reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

/// Snapshot of the server status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    /// Mixer volume 0-100, `None` when the server has no mixer
    pub volume: Option<u8>,
    pub queue_length: u32,
    /// Queue position of the current song
    pub song_position: Option<u32>,
}

/// Player client errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("connection to {address} failed: {detail}")]
    Connect { address: String, detail: String },

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("connection closed: {0}")]
    Closed(String),

    #[error("{op} failed: {detail}")]
    Command { op: &'static str, detail: String },
}

impl PlayerError {
    pub fn command(op: &'static str, detail: impl Into<String>) -> Self {
        Self::Command {
            op,
            detail: detail.into(),
        }
    }

    /// Whether the connection this error came from must be discarded
    pub fn is_closed(&self) -> bool {
        !matches!(self, Self::Command { .. })
    }
}

/// A live session with the player server
///
/// All methods take `&self` so handles can be shared as `Arc<dyn PlayerConnection>`;
/// implementations use interior mutability for the underlying client.
#[async_trait]
pub trait PlayerConnection: Send + Sync {
    async fn authenticate(&self, password: &str) -> Result<(), PlayerError>;

    async fn status(&self) -> Result<PlayerStatus, PlayerError>;

    async fn play(&self) -> Result<(), PlayerError>;
    async fn pause(&self) -> Result<(), PlayerError>;
    async fn stop(&self) -> Result<(), PlayerError>;
    async fn next(&self) -> Result<(), PlayerError>;
    async fn previous(&self) -> Result<(), PlayerError>;

    /// Start playback at a queue position
    async fn play_at(&self, position: u32) -> Result<(), PlayerError>;
    async fn delete_at(&self, position: u32) -> Result<(), PlayerError>;
    async fn clear_queue(&self) -> Result<(), PlayerError>;

    async fn load_playlist(&self, name: &str) -> Result<(), PlayerError>;
    async fn save_playlist(&self, name: &str) -> Result<(), PlayerError>;
    async fn remove_playlist(&self, name: &str) -> Result<(), PlayerError>;

    async fn set_random(&self, random: bool) -> Result<(), PlayerError>;
    async fn set_volume(&self, volume: u8) -> Result<(), PlayerError>;

    /// Album tag of the song at a queue position
    async fn album_at(&self, position: u32) -> Result<Option<String>, PlayerError>;

    /// Whether the connection is unusable and must be replaced
    fn is_closed(&self) -> bool;

    /// Forget a transient command error so the connection can be reused
    fn clear_error(&self);
}

/// Opens new player connections
#[async_trait]
pub trait PlayerConnector: Send + Sync {
    /// Human readable server address for logs
    fn address(&self) -> String;

    async fn connect(&self) -> Result<Arc<dyn PlayerConnection>, PlayerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_classification() {
        assert!(PlayerError::Closed("eof".into()).is_closed());
        assert!(PlayerError::Auth("bad password".into()).is_closed());
        assert!(PlayerError::Connect {
            address: "localhost:6600".into(),
            detail: "refused".into()
        }
        .is_closed());
        assert!(!PlayerError::command("save", "playlist exists").is_closed());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PlayerError::command("load", "No such playlist").to_string(),
            "load failed: No such playlist"
        );
    }
}
