//! MPD backend built on the `mpd` client crate
//!
//! The crate speaks the protocol over a blocking `TcpStream`, so every call
//! runs on the blocking thread pool with the client behind a mutex.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::{PlaybackState, PlayerConnection, PlayerConnector, PlayerError, PlayerStatus};

/// Creates MPD connections for a fixed server address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpdConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl MpdConnector {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }
}

#[async_trait]
impl PlayerConnector for MpdConnector {
    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn connect(&self) -> Result<Arc<dyn PlayerConnection>, PlayerError> {
        let host = self.host.clone();
        let port = self.port;
        let timeout = self.timeout;
        let address = self.address();

        debug!("Opening MPD connection to {}", address);

        let client = tokio::task::spawn_blocking(move || open_client(&host, port, timeout))
            .await
            .map_err(|e| PlayerError::Connect {
                address: address.clone(),
                detail: e.to_string(),
            })?
            .map_err(|detail| PlayerError::Connect { address, detail })?;

        Ok(Arc::new(MpdConnection::new(client)))
    }
}

fn open_client(host: &str, port: u16, timeout: Duration) -> Result<::mpd::Client, String> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("cannot resolve {}: {}", host, e))?;

    let mut last_error = format!("no address found for {}", host);
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream
                    .set_read_timeout(Some(timeout))
                    .map_err(|e| e.to_string())?;
                stream
                    .set_write_timeout(Some(timeout))
                    .map_err(|e| e.to_string())?;
                return ::mpd::Client::new(stream).map_err(|e| e.to_string());
            }
            Err(e) => last_error = format!("{}: {}", addr, e),
        }
    }

    Err(last_error)
}

/// One MPD protocol session
pub struct MpdConnection {
    client: Arc<Mutex<::mpd::Client>>,
    closed: AtomicBool,
}

impl MpdConnection {
    fn new(client: ::mpd::Client) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            closed: AtomicBool::new(false),
        }
    }

    /// Run a blocking client call and classify its error
    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, PlayerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut ::mpd::Client) -> Result<T, ::mpd::error::Error> + Send + 'static,
    {
        if self.is_closed() {
            return Err(PlayerError::Closed(format!("{}: connection already closed", op)));
        }

        trace!("mpd {}", op);
        let client = Arc::clone(&self.client);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut guard = client.lock();
            f(&mut *guard)
        })
        .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.classify(op, e)),
            Err(e) => {
                self.closed.store(true, Ordering::SeqCst);
                Err(PlayerError::Closed(format!("{} aborted: {}", op, e)))
            }
        }
    }

    /// I/O failures leave the stream in an unknown state; server ACKs do not
    fn classify(&self, op: &'static str, err: ::mpd::error::Error) -> PlayerError {
        match err {
            ::mpd::error::Error::Io(e) => {
                self.closed.store(true, Ordering::SeqCst);
                PlayerError::Closed(format!("{}: {}", op, e))
            }
            other => PlayerError::command(op, other.to_string()),
        }
    }
}

#[async_trait]
impl PlayerConnection for MpdConnection {
    async fn authenticate(&self, password: &str) -> Result<(), PlayerError> {
        let password = password.to_string();
        self.run("password", move |c| c.login(&password))
            .await
            .map_err(|e| match e {
                PlayerError::Command { detail, .. } => PlayerError::Auth(detail),
                other => other,
            })
    }

    async fn status(&self) -> Result<PlayerStatus, PlayerError> {
        let status = self.run("status", |c| c.status()).await?;

        let state = match status.state {
            ::mpd::status::State::Play => PlaybackState::Playing,
            ::mpd::status::State::Pause => PlaybackState::Paused,
            ::mpd::status::State::Stop => PlaybackState::Stopped,
        };

        Ok(PlayerStatus {
            state,
            volume: u8::try_from(status.volume).ok().map(|v| v.min(100)),
            queue_length: status.queue_len,
            song_position: status.song.map(|place| place.pos),
        })
    }

    async fn play(&self) -> Result<(), PlayerError> {
        self.run("play", |c| c.play()).await
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.run("pause", |c| c.pause(true)).await
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        self.run("stop", |c| c.stop()).await
    }

    async fn next(&self) -> Result<(), PlayerError> {
        self.run("next", |c| c.next()).await
    }

    async fn previous(&self) -> Result<(), PlayerError> {
        self.run("previous", |c| c.prev()).await
    }

    async fn play_at(&self, position: u32) -> Result<(), PlayerError> {
        self.run("play_at", move |c| c.switch(position)).await
    }

    async fn delete_at(&self, position: u32) -> Result<(), PlayerError> {
        self.run("delete", move |c| c.delete(position)).await
    }

    async fn clear_queue(&self) -> Result<(), PlayerError> {
        self.run("clear", |c| c.clear()).await
    }

    async fn load_playlist(&self, name: &str) -> Result<(), PlayerError> {
        let name = name.to_string();
        self.run("load", move |c| c.load(name.as_str(), ..)).await
    }

    async fn save_playlist(&self, name: &str) -> Result<(), PlayerError> {
        let name = name.to_string();
        self.run("save", move |c| c.save(name.as_str())).await
    }

    async fn remove_playlist(&self, name: &str) -> Result<(), PlayerError> {
        let name = name.to_string();
        self.run("rm", move |c| c.pl_remove(name.as_str())).await
    }

    async fn set_random(&self, random: bool) -> Result<(), PlayerError> {
        self.run("random", move |c| c.random(random)).await
    }

    async fn set_volume(&self, volume: u8) -> Result<(), PlayerError> {
        let volume = volume.min(100) as i8;
        self.run("setvol", move |c| c.volume(volume)).await
    }

    async fn album_at(&self, position: u32) -> Result<Option<String>, PlayerError> {
        let songs = self.run("playlistinfo", move |c| c.songs(position)).await?;

        Ok(songs.first().and_then(|song| {
            song.tags
                .iter()
                .find(|entry| entry.0 == "Album")
                .map(|entry| entry.1.clone())
        }))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn clear_error(&self) {
        // An ACK does not desynchronise the protocol, nothing to reset
        trace!("mpd error cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_address() {
        let connector = MpdConnector::new("music.local", 6601, Duration::from_secs(5));
        assert_eq!(connector.address(), "music.local:6601");
    }

    #[tokio::test]
    async fn test_connect_refused_is_connect_error() {
        // Bind then drop a listener to get a local port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let connector = MpdConnector::new("127.0.0.1", port, Duration::from_millis(500));

        match connector.connect().await {
            Err(err @ PlayerError::Connect { .. }) => assert!(err.is_closed()),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connection should have been refused"),
        }
    }
}
