//! irmpc - infrared remote control for MPD
//!
//! Translates symbolic remote-control key events (as decoded by lircd) into
//! commands against a Music Player Daemon, with press aggregation for
//! multi-digit playlist entry and press-to-confirm actions.

pub mod command;
pub mod config;
pub mod connection;
pub mod debounce;
pub mod dispatcher;
pub mod input;
pub mod player;
pub mod playlists;
pub mod session;
pub mod system;

pub use command::Command;
pub use config::AppConfig;
pub use connection::ConnectionManager;
pub use dispatcher::Dispatcher;
pub use playlists::{Direction, PlaylistDirectory, PlaylistEntry};
pub use session::SessionState;
