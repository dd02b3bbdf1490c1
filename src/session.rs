//! Session state remembered between remote commands

/// What the dispatcher knows about the player beyond a single command
///
/// Only the dispatcher mutates this, and only after the server confirmed
/// the corresponding operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Name of the playlist loaded by the last successful load sequence
    pub current_playlist: Option<String>,
    /// Volume before muting, or the last volume set (0-100)
    pub last_volume: u8,
    pub last_mute: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_playlist: None,
            last_volume: 0,
            last_mute: false,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn playlist_loaded(&mut self, name: &str) {
        self.current_playlist = Some(name.to_string());
    }

    /// The load sequence failed: the queue content is unknown now
    pub(crate) fn playlist_lost(&mut self) {
        self.current_playlist = None;
    }

    pub(crate) fn volume_set(&mut self, volume: u8) {
        self.last_volume = volume.min(100);
        self.last_mute = false;
    }

    pub(crate) fn muted(&mut self, previous_volume: u8) {
        self.last_volume = previous_volume.min(100);
        self.last_mute = true;
    }
}
