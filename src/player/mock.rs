//! Scripted in-memory player used by the tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{PlaybackState, PlayerConnection, PlayerConnector, PlayerError, PlayerStatus};

/// Server-side state shared by every connection of a [`MockPlayer`]
pub(crate) struct MockState {
    pub state: PlaybackState,
    pub volume: Option<u8>,
    /// Album tag per queue position
    pub queue: Vec<Option<String>>,
    pub position: Option<u32>,
    pub random: bool,
    /// Playlists known to the server
    pub stored: HashSet<String>,
    /// Operation log, e.g. `"load jazz"`
    pub calls: Vec<String>,
    pub connects: u32,
    pub connect_failures: u32,
    pub password: Option<String>,
    /// Upcoming failures per operation name
    pub failures: HashMap<&'static str, u32>,
    /// Operations whose injected failure also drops the connection
    pub closing: HashSet<&'static str>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            volume: Some(50),
            queue: Vec::new(),
            position: None,
            random: false,
            stored: HashSet::new(),
            calls: Vec::new(),
            connects: 0,
            connect_failures: 0,
            password: None,
            failures: HashMap::new(),
            closing: HashSet::new(),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockPlayer {
    shared: Arc<Mutex<MockState>>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.shared.lock())
    }

    /// Make the next `times` calls of `op` fail with a command error
    pub fn fail(&self, op: &'static str, times: u32) {
        self.with(|s| {
            s.failures.insert(op, times);
        });
    }

    /// Make the next `times` calls of `op` fail and close the connection
    pub fn fail_closing(&self, op: &'static str, times: u32) {
        self.with(|s| {
            s.failures.insert(op, times);
            s.closing.insert(op);
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    pub fn connects(&self) -> u32 {
        self.with(|s| s.connects)
    }

    pub fn connector(&self) -> Arc<dyn PlayerConnector> {
        Arc::new(MockConnector {
            shared: Arc::clone(&self.shared),
        })
    }
}

struct MockConnector {
    shared: Arc<Mutex<MockState>>,
}

#[async_trait]
impl PlayerConnector for MockConnector {
    fn address(&self) -> String {
        "mock:6600".to_string()
    }

    async fn connect(&self) -> Result<Arc<dyn PlayerConnection>, PlayerError> {
        let mut state = self.shared.lock();
        state.calls.push("connect".to_string());
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(PlayerError::Connect {
                address: self.address(),
                detail: "connection refused".to_string(),
            });
        }
        state.connects += 1;

        Ok(Arc::new(MockConnection {
            shared: Arc::clone(&self.shared),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MockConnection {
    shared: Arc<Mutex<MockState>>,
    closed: AtomicBool,
}

impl MockConnection {
    /// Log the call and apply injected failures, then run `f` on the state
    fn op<T>(
        &self,
        op: &'static str,
        call: String,
        f: impl FnOnce(&mut MockState) -> Result<T, PlayerError>,
    ) -> Result<T, PlayerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PlayerError::Closed(format!("{}: connection already closed", op)));
        }

        let mut state = self.shared.lock();
        state.calls.push(call);

        if let Some(remaining) = state.failures.get_mut(op) {
            if *remaining > 0 {
                *remaining -= 1;
                if state.closing.contains(op) {
                    self.closed.store(true, Ordering::SeqCst);
                    return Err(PlayerError::Closed(format!("{}: broken pipe", op)));
                }
                return Err(PlayerError::command(op, "injected failure"));
            }
        }

        f(&mut state)
    }
}

#[async_trait]
impl PlayerConnection for MockConnection {
    async fn authenticate(&self, password: &str) -> Result<(), PlayerError> {
        self.op("password", format!("password {}", password), |s| {
            match &s.password {
                Some(expected) if expected != password => {
                    Err(PlayerError::Auth("incorrect password".to_string()))
                }
                _ => Ok(()),
            }
        })
    }

    async fn status(&self) -> Result<PlayerStatus, PlayerError> {
        self.op("status", "status".to_string(), |s| {
            Ok(PlayerStatus {
                state: s.state,
                volume: s.volume,
                queue_length: s.queue.len() as u32,
                song_position: s.position,
            })
        })
    }

    async fn play(&self) -> Result<(), PlayerError> {
        self.op("play", "play".to_string(), |s| {
            s.state = PlaybackState::Playing;
            if s.position.is_none() && !s.queue.is_empty() {
                s.position = Some(0);
            }
            Ok(())
        })
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.op("pause", "pause".to_string(), |s| {
            s.state = PlaybackState::Paused;
            Ok(())
        })
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        self.op("stop", "stop".to_string(), |s| {
            s.state = PlaybackState::Stopped;
            Ok(())
        })
    }

    async fn next(&self) -> Result<(), PlayerError> {
        self.op("next", "next".to_string(), |_| Ok(()))
    }

    async fn previous(&self) -> Result<(), PlayerError> {
        self.op("previous", "previous".to_string(), |_| Ok(()))
    }

    async fn play_at(&self, position: u32) -> Result<(), PlayerError> {
        self.op("play_at", format!("play_at {}", position), |s| {
            s.position = Some(position);
            s.state = PlaybackState::Playing;
            Ok(())
        })
    }

    async fn delete_at(&self, position: u32) -> Result<(), PlayerError> {
        self.op("delete", format!("delete {}", position), |s| {
            let index = position as usize;
            if index >= s.queue.len() {
                return Err(PlayerError::command("delete", "Bad song index"));
            }
            s.queue.remove(index);
            Ok(())
        })
    }

    async fn clear_queue(&self) -> Result<(), PlayerError> {
        self.op("clear", "clear".to_string(), |s| {
            s.queue.clear();
            s.position = None;
            Ok(())
        })
    }

    async fn load_playlist(&self, name: &str) -> Result<(), PlayerError> {
        self.op("load", format!("load {}", name), |_| Ok(()))
    }

    async fn save_playlist(&self, name: &str) -> Result<(), PlayerError> {
        self.op("save", format!("save {}", name), |s| {
            if !s.stored.insert(name.to_string()) {
                return Err(PlayerError::command("save", "Playlist already exists"));
            }
            Ok(())
        })
    }

    async fn remove_playlist(&self, name: &str) -> Result<(), PlayerError> {
        self.op("rm", format!("rm {}", name), |s| {
            if !s.stored.remove(name) {
                return Err(PlayerError::command("rm", "No such playlist"));
            }
            Ok(())
        })
    }

    async fn set_random(&self, random: bool) -> Result<(), PlayerError> {
        self.op("random", format!("random {}", random), |s| {
            s.random = random;
            Ok(())
        })
    }

    async fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        self.op("setvol", format!("setvol {}", volume), |s| {
            s.volume = Some(volume);
            Ok(())
        })
    }

    async fn album_at(&self, position: u32) -> Result<Option<String>, PlayerError> {
        self.op("playlistinfo", format!("playlistinfo {}", position), |s| {
            Ok(s.queue.get(position as usize).cloned().flatten())
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn clear_error(&self) {}
}
