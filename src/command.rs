//! Symbolic remote events and their decoded form
//!
//! Events arrive as `<category>:<payload>` strings (e.g. `m:playpause`,
//! `v:up`, `p:3`). They are decoded once here so the dispatcher can match on
//! variants instead of comparing strings.

use std::fmt;
use thiserror::Error;

/// Shortest well-formed event: one category character, ':' and one payload character
pub const MIN_EVENT_LEN: usize = 3;

/// A decoded remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `m:` playback and queue control
    Media(MediaCommand),
    /// `v:` volume control
    Volume(VolumeCommand),
    /// `s:` host system control
    System(SystemCommand),
    /// `p:` playlist selection by number, one or more decimal digits
    Playlist(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    PlayPause,
    Next,
    Prev,
    Stop,
    Delete,
    PlaylistUpdate,
    NextPlaylist,
    PrevPlaylist,
    NextAlbum,
    PrevAlbum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeCommand {
    Up,
    Down,
    Mute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    PowerOff,
}

/// Why an event string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("event '{0}' is too short")]
    TooShort(String),

    #[error("unknown command category '{0}'")]
    UnknownCategory(String),

    #[error("unknown {category} command '{payload}'")]
    UnknownCommand { category: &'static str, payload: String },

    #[error("playlist number '{0}' contains non-digit characters")]
    InvalidDigits(String),
}

impl MediaCommand {
    fn parse(payload: &str) -> Option<Self> {
        Some(match payload {
            "playpause" => Self::PlayPause,
            "next" => Self::Next,
            "prev" => Self::Prev,
            "stop" => Self::Stop,
            "delete" => Self::Delete,
            "playlistupdate" => Self::PlaylistUpdate,
            "nextplaylist" => Self::NextPlaylist,
            "prevplaylist" => Self::PrevPlaylist,
            "nextalbum" => Self::NextAlbum,
            "prevalbum" => Self::PrevAlbum,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayPause => "playpause",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Stop => "stop",
            Self::Delete => "delete",
            Self::PlaylistUpdate => "playlistupdate",
            Self::NextPlaylist => "nextplaylist",
            Self::PrevPlaylist => "prevplaylist",
            Self::NextAlbum => "nextalbum",
            Self::PrevAlbum => "prevalbum",
        }
    }
}

impl VolumeCommand {
    fn parse(payload: &str) -> Option<Self> {
        Some(match payload {
            "up" => Self::Up,
            "down" => Self::Down,
            "mute" => Self::Mute,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Mute => "mute",
        }
    }
}

impl SystemCommand {
    fn parse(payload: &str) -> Option<Self> {
        match payload {
            "poweroff" => Some(Self::PowerOff),
            _ => None,
        }
    }
}

impl Command {
    /// Decode a symbolic event string
    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        let raw = raw.trim();
        if raw.len() < MIN_EVENT_LEN {
            return Err(DecodeError::TooShort(raw.to_string()));
        }

        let (category, payload) = raw
            .split_once(':')
            .ok_or_else(|| DecodeError::TooShort(raw.to_string()))?;
        if payload.is_empty() {
            return Err(DecodeError::TooShort(raw.to_string()));
        }

        let unknown = |category: &'static str| DecodeError::UnknownCommand {
            category,
            payload: payload.to_string(),
        };

        match category {
            "m" => MediaCommand::parse(payload).map(Command::Media).ok_or_else(|| unknown("media")),
            "v" => VolumeCommand::parse(payload).map(Command::Volume).ok_or_else(|| unknown("volume")),
            "s" => SystemCommand::parse(payload).map(Command::System).ok_or_else(|| unknown("system")),
            "p" => {
                if !payload.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(DecodeError::InvalidDigits(payload.to_string()));
                }
                Ok(Command::Playlist(payload.bytes().map(|b| b - b'0').collect()))
            }
            other => Err(DecodeError::UnknownCategory(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Media(cmd) => write!(f, "m:{}", cmd.as_str()),
            Command::Volume(cmd) => write!(f, "v:{}", cmd.as_str()),
            Command::System(SystemCommand::PowerOff) => write!(f, "s:poweroff"),
            Command::Playlist(digits) => {
                write!(f, "p:")?;
                for d in digits {
                    write!(f, "{}", d)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_commands() {
        assert_eq!(Command::parse("m:playpause"), Ok(Command::Media(MediaCommand::PlayPause)));
        assert_eq!(Command::parse("m:nextalbum"), Ok(Command::Media(MediaCommand::NextAlbum)));
        assert_eq!(
            Command::parse("m:playlistupdate"),
            Ok(Command::Media(MediaCommand::PlaylistUpdate))
        );
    }

    #[test]
    fn test_parse_volume_and_system() {
        assert_eq!(Command::parse("v:mute"), Ok(Command::Volume(VolumeCommand::Mute)));
        assert_eq!(Command::parse("s:poweroff"), Ok(Command::System(SystemCommand::PowerOff)));
    }

    #[test]
    fn test_parse_playlist_digits() {
        assert_eq!(Command::parse("p:3"), Ok(Command::Playlist(vec![3])));
        assert_eq!(Command::parse("p:042"), Ok(Command::Playlist(vec![0, 4, 2])));
        assert_eq!(
            Command::parse("p:4a"),
            Err(DecodeError::InvalidDigits("4a".to_string()))
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Command::parse("  v:up\n"), Ok(Command::Volume(VolumeCommand::Up)));
    }

    #[test]
    fn test_reject_short_events() {
        assert!(matches!(Command::parse(""), Err(DecodeError::TooShort(_))));
        assert!(matches!(Command::parse("m:"), Err(DecodeError::TooShort(_))));
        assert!(matches!(Command::parse("mplay"), Err(DecodeError::TooShort(_))));
    }

    #[test]
    fn test_reject_unknown() {
        assert_eq!(
            Command::parse("x:foo"),
            Err(DecodeError::UnknownCategory("x".to_string()))
        );
        assert_eq!(
            Command::parse("m:rewind"),
            Err(DecodeError::UnknownCommand {
                category: "media",
                payload: "rewind".to_string()
            })
        );
        assert!(matches!(
            Command::parse("s:reboot"),
            Err(DecodeError::UnknownCommand { category: "system", .. })
        ));
    }

    #[test]
    fn test_display_matches_event_form() {
        for raw in ["m:prevplaylist", "v:down", "s:poweroff", "p:12"] {
            assert_eq!(Command::parse(raw).unwrap().to_string(), raw);
        }
    }
}
