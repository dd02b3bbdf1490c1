//! Configuration management for irmpc
//!
//! Handles loading, parsing, validation and hot-reloading of the YAML
//! configuration file. Every setting has a default, so running without a
//! file is valid.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;

use crate::playlists::PlaylistDirectory;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub mpd: MpdConfig,
    #[serde(default)]
    pub lirc: LircConfig,
    #[serde(default)]
    pub system: SystemConfig,
    /// Playlists selectable by number
    #[serde(default)]
    pub playlists: BTreeMap<u32, PlaylistSpec>,
    /// Playlist slot to load at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_playlist: Option<u32>,
}

/// MPD server and command behaviour
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MpdConfig {
    #[serde(default = "default_mpd_host")]
    pub host: String,
    #[serde(default = "default_mpd_port")]
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Attempts per remote command, including reconnects
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
    /// Presses of the playlist update key needed to save the playlist
    #[serde(default = "default_repeat")]
    pub update_repeat: u32,
    /// Volume change per key press, in percent
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// lircd connection and key handling
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LircConfig {
    #[serde(default = "default_lirc_socket")]
    pub socket: String,
    #[serde(default = "default_lirc_connect_tries")]
    pub connect_tries: u32,
    /// Maximum seconds between presses of a multi-press command
    #[serde(default = "default_key_timespan")]
    pub key_timespan: u64,
    /// lircd button name -> symbolic event (e.g. `KEY_PLAY: "m:playpause"`)
    #[serde(default)]
    pub keymap: BTreeMap<String, String>,
}

/// Host system integration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SystemConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_command: Option<String>,
    /// Presses of the power key needed to run `power_command`
    #[serde(default = "default_repeat")]
    pub power_repeat: u32,
}

/// Playlist entry (structured, or `[name, "r"]` list form)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PlaylistSpec {
    Detailed {
        name: String,
        #[serde(default)]
        shuffle: bool,
    },
    List(Vec<String>),
}

impl PlaylistSpec {
    /// Playlist name and shuffle flag
    pub fn resolve(&self) -> (&str, bool) {
        match self {
            PlaylistSpec::Detailed { name, shuffle } => (name.as_str(), *shuffle),
            PlaylistSpec::List(items) => {
                let name = items.first().map(String::as_str).unwrap_or("");
                let shuffle = items.get(1).map(|flag| flag == "r").unwrap_or(false);
                (name, shuffle)
            }
        }
    }
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            host: default_mpd_host(),
            port: default_mpd_port(),
            password: None,
            max_tries: default_max_tries(),
            update_repeat: default_repeat(),
            volume_step: default_volume_step(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LircConfig {
    fn default() -> Self {
        Self {
            socket: default_lirc_socket(),
            connect_tries: default_lirc_connect_tries(),
            key_timespan: default_key_timespan(),
            keymap: BTreeMap::new(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            power_command: None,
            power_repeat: default_repeat(),
        }
    }
}

impl MpdConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether a connection opened with `self` is still valid under `other`
    pub fn same_endpoint(&self, other: &MpdConfig) -> bool {
        self.host == other.host
            && self.port == other.port
            && self.password == other.password
            && self.timeout_ms == other.timeout_ms
    }
}

impl LircConfig {
    pub fn key_window(&self) -> Duration {
        Duration::from_secs(self.key_timespan)
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.mpd.host.trim().is_empty() {
            anyhow::bail!("mpd.host cannot be empty");
        }
        if self.mpd.port == 0 {
            anyhow::bail!("mpd.port must be in range 1-65535");
        }
        if self.mpd.max_tries == 0 {
            anyhow::bail!("mpd.max_tries must be at least 1");
        }
        if self.mpd.update_repeat == 0 {
            anyhow::bail!("mpd.update_repeat must be at least 1");
        }
        if self.mpd.volume_step > 100 {
            anyhow::bail!(
                "mpd.volume_step {} is invalid (must be 0-100)",
                self.mpd.volume_step
            );
        }
        if self.mpd.timeout_ms == 0 {
            anyhow::bail!("mpd.timeout_ms must be positive");
        }
        if self.lirc.key_timespan == 0 {
            anyhow::bail!("lirc.key_timespan must be at least 1 second");
        }
        if self.system.power_repeat == 0 {
            anyhow::bail!("system.power_repeat must be at least 1");
        }
        if let Some(command) = &self.system.power_command {
            if command.trim().is_empty() {
                anyhow::bail!("system.power_command cannot be empty when set");
            }
        }

        for (button, symbol) in &self.lirc.keymap {
            if symbol.trim().is_empty() {
                anyhow::bail!("lirc.keymap entry '{}' has an empty event", button);
            }
        }

        if let Some(slot) = self.startup_playlist {
            if !self.playlists.contains_key(&slot) {
                anyhow::bail!("startup_playlist {} is not a configured playlist slot", slot);
            }
        }

        Ok(())
    }

    /// Build the playlist directory, skipping entries without a name
    pub fn playlist_directory(&self) -> PlaylistDirectory {
        let mut directory = PlaylistDirectory::new();
        for (slot, spec) in &self.playlists {
            let (name, shuffle) = spec.resolve();
            if !directory.add(*slot, name, shuffle) {
                warn!("⚠️  Playlist slot {} has no name, ignoring it", slot);
            }
        }
        directory
    }
}

// Default value functions
fn default_mpd_host() -> String { "localhost".to_string() }
fn default_mpd_port() -> u16 { 6600 }
fn default_max_tries() -> u32 { 2 }
fn default_repeat() -> u32 { 2 }
fn default_volume_step() -> u8 { 2 }
fn default_timeout_ms() -> u64 { 5000 }
fn default_lirc_socket() -> String { "/var/run/lirc/lircd".to_string() }
fn default_lirc_connect_tries() -> u32 { 5 }
fn default_key_timespan() -> u64 { 2 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.mpd.host, "localhost");
        assert_eq!(config.mpd.port, 6600);
        assert_eq!(config.mpd.max_tries, 2);
        assert_eq!(config.mpd.volume_step, 2);
        assert_eq!(config.lirc.connect_tries, 5);
        assert_eq!(config.lirc.key_window(), Duration::from_secs(2));
        assert_eq!(config.system.power_repeat, 2);
        assert!(config.system.power_command.is_none());
        assert!(config.playlists.is_empty());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
mpd:
  host: music.local
  port: 6601
  password: hunter2
  max_tries: 3
  update_repeat: 4
  volume_step: 5
lirc:
  key_timespan: 3
  keymap:
    KEY_PLAY: "m:playpause"
    KEY_1: "p:1"
system:
  power_command: "sudo poweroff"
  power_repeat: 3
playlists:
  3: { name: jazz }
  4: [rock, r]
  7:
    name: ambient
    shuffle: true
startup_playlist: 3
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.mpd.host, "music.local");
        assert_eq!(config.mpd.password.as_deref(), Some("hunter2"));
        assert_eq!(config.mpd.update_repeat, 4);
        assert_eq!(config.lirc.keymap.get("KEY_1").map(String::as_str), Some("p:1"));
        assert_eq!(config.system.power_command.as_deref(), Some("sudo poweroff"));
        assert_eq!(config.startup_playlist, Some(3));

        let dir = config.playlist_directory();
        assert_eq!(dir.len(), 3);
        assert!(!dir.get(3).unwrap().shuffle);
        assert_eq!(dir.get(4).unwrap().name, "rock");
        assert!(dir.get(4).unwrap().shuffle);
        assert!(dir.get(7).unwrap().shuffle);
    }

    #[test]
    fn test_list_form_without_flag() {
        let spec = PlaylistSpec::List(vec!["blues".to_string()]);
        assert_eq!(spec.resolve(), ("blues", false));
        let spec = PlaylistSpec::List(vec!["blues".to_string(), "x".to_string()]);
        assert_eq!(spec.resolve(), ("blues", false));
    }

    #[test]
    fn test_unnamed_playlists_are_skipped() {
        let yaml = r#"
playlists:
  1: []
  2: { name: "" }
  3: [jazz]
"#;
        let dir = AppConfig::from_yaml(yaml).unwrap().playlist_directory();
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get(3).unwrap().name, "jazz");
    }

    #[test]
    fn test_validation_errors() {
        assert!(AppConfig::from_yaml("mpd:\n  host: \"\"\n").is_err());
        assert!(AppConfig::from_yaml("mpd:\n  port: 0\n").is_err());
        assert!(AppConfig::from_yaml("mpd:\n  max_tries: 0\n").is_err());
        assert!(AppConfig::from_yaml("mpd:\n  volume_step: 101\n").is_err());
        assert!(AppConfig::from_yaml("lirc:\n  key_timespan: 0\n").is_err());
        assert!(AppConfig::from_yaml("system:\n  power_repeat: 0\n").is_err());
        assert!(AppConfig::from_yaml("lirc:\n  keymap:\n    KEY_OK: \"\"\n").is_err());
        assert!(AppConfig::from_yaml("startup_playlist: 9\n").is_err());
    }

    #[test]
    fn test_same_endpoint() {
        let base = MpdConfig::default();
        let tuned = MpdConfig {
            max_tries: 5,
            volume_step: 10,
            ..MpdConfig::default()
        };
        assert!(base.same_endpoint(&tuned));

        let moved = MpdConfig {
            port: 6601,
            ..MpdConfig::default()
        };
        assert!(!base.same_endpoint(&moved));

        let secured = MpdConfig {
            password: Some("hunter2".to_string()),
            ..MpdConfig::default()
        };
        assert!(!base.same_endpoint(&secured));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(AppConfig::from_yaml("mpd: [unclosed").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("irmpc.yaml");
        std::fs::write(&path, "mpd:\n  port: 6700\n").unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.mpd.port, 6700);

        assert!(AppConfig::load(dir.path().join("missing.yaml")).await.is_err());
    }
}
