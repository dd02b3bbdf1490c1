//! Dispatcher module - turns remote events into player commands
//!
//! The Dispatcher owns everything a remote command may need:
//! - Decoding of symbolic events into [`Command`] variants
//! - Press aggregation for playlist numbers and confirmation keys
//! - Session state (loaded playlist, volume before mute)
//! - The player connection, with retries per command
//!
//! Events are handled strictly one at a time; a command runs to completion
//! (success or exhausted retries) before the next event is looked at.

mod media;
mod playlist;
mod system;
mod volume;


use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::AppConfig;
use crate::connection::ConnectionManager;
use crate::debounce::PressSequence;
use crate::player::PlayerConnector;
use crate::playlists::PlaylistDirectory;
use crate::session::SessionState;
use crate::system::CommandExecutor;

/// Command behaviour settings taken from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Attempts per command, including reconnects
    pub max_tries: u32,
    /// Maximum gap between presses of one multi-press input
    pub key_window: Duration,
    pub volume_step: u8,
    pub update_repeat: u32,
    pub power_command: Option<String>,
    pub power_repeat: u32,
}

impl DispatchSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_tries: config.mpd.max_tries,
            key_window: config.lirc.key_window(),
            volume_step: config.mpd.volume_step,
            update_repeat: config.mpd.update_repeat,
            power_command: config.system.power_command.clone(),
            power_repeat: config.system.power_repeat,
        }
    }
}

/// Routes decoded remote commands to the player
pub struct Dispatcher {
    pub(crate) settings: DispatchSettings,
    pub(crate) directory: PlaylistDirectory,
    pub(crate) session: SessionState,
    pub(crate) connection: ConnectionManager,
    pub(crate) executor: Arc<dyn CommandExecutor>,
    /// Digits of a playlist number being typed
    pub(crate) digit_entry: PressSequence,
    /// Power key presses towards the confirmation threshold
    pub(crate) power_presses: PressSequence,
    /// Playlist update key presses towards the confirmation threshold
    pub(crate) update_presses: PressSequence,
}

impl Dispatcher {
    pub fn new(
        settings: DispatchSettings,
        directory: PlaylistDirectory,
        connection: ConnectionManager,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let window = settings.key_window;
        Self {
            settings,
            directory,
            session: SessionState::new(),
            connection,
            executor,
            digit_entry: PressSequence::new(window),
            power_presses: PressSequence::new(window),
            update_presses: PressSequence::new(window),
        }
    }

    /// Build a dispatcher from configuration
    pub fn from_config(
        config: &AppConfig,
        connector: Arc<dyn PlayerConnector>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let connection = ConnectionManager::new(connector, config.mpd.password.clone());
        Self::new(
            DispatchSettings::from_config(config),
            config.playlist_directory(),
            connection,
            executor,
        )
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn directory(&self) -> &PlaylistDirectory {
        &self.directory
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Replace settings and playlists after a config reload
    ///
    /// Session state and running press sequences are kept.
    pub fn apply_config(&mut self, config: &AppConfig) {
        self.settings = DispatchSettings::from_config(config);
        self.directory = config.playlist_directory();

        let window = self.settings.key_window;
        self.digit_entry.set_window(window);
        self.power_presses.set_window(window);
        self.update_presses.set_window(window);

        info!(
            "🔄 Dispatcher updated ({} playlists, {} tries per command)",
            self.directory.len(),
            self.settings.max_tries
        );
    }

    /// Point the dispatcher at another player server
    pub fn reconfigure_player(&mut self, connector: Arc<dyn PlayerConnector>, password: Option<String>) {
        self.connection.reconfigure(connector, password);
    }

    /// Handle one symbolic event using the current time
    pub async fn handle_event(&mut self, raw: &str) -> Result<()> {
        self.handle_event_at(raw, Instant::now()).await
    }

    /// Handle one symbolic event pressed at `now`
    ///
    /// Malformed or unknown events are logged and ignored (`Ok`). An `Err`
    /// means the command reached the player but failed after all retries.
    pub async fn handle_event_at(&mut self, raw: &str, now: Instant) -> Result<()> {
        let command = match Command::parse(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!("⚠️  Ignoring remote event '{}': {}", raw.trim(), e);
                return Ok(());
            }
        };

        debug!(event = %command, "Dispatching remote command");

        match command {
            Command::Media(cmd) => self.handle_media(cmd, now).await,
            Command::Volume(cmd) => self.handle_volume(cmd).await,
            Command::System(cmd) => self.handle_system(cmd, now),
            Command::Playlist(digits) => self.handle_playlist_number(&digits, now).await,
        }
    }

    /// Load the playlist configured at `slot` (startup playlist)
    pub async fn load_slot(&mut self, slot: u32) -> Result<()> {
        let entry = self
            .directory
            .get(slot)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No playlist configured at slot {}", slot))?;
        self.load_playlist(&entry).await
    }

    /// Drop the player connection
    pub fn shutdown(&mut self) {
        self.connection.disconnect();
        debug!("Dispatcher shut down");
    }
}
