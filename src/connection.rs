//! Player connection management
//!
//! Owns the single persistent connection to the player server. The
//! connection is opened lazily on the first command, authenticated once, and
//! replaced when it turns out to be closed.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::player::{PlayerConnection, PlayerConnector, PlayerError};

/// Lazily established, retried connection to the player server
pub struct ConnectionManager {
    connector: Arc<dyn PlayerConnector>,
    password: Option<String>,
    handle: Option<Arc<dyn PlayerConnection>>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn PlayerConnector>, password: Option<String>) -> Self {
        Self {
            connector,
            password,
            handle: None,
        }
    }

    /// Whether a usable connection is currently held
    #[cfg(test)]
    pub(crate) fn is_connected(&self) -> bool {
        self.handle.as_ref().map(|c| !c.is_closed()).unwrap_or(false)
    }

    /// Switch to another server or credential; the current connection is dropped
    pub fn reconfigure(&mut self, connector: Arc<dyn PlayerConnector>, password: Option<String>) {
        info!("🔄 Player endpoint changed to {}", connector.address());
        self.connector = connector;
        self.password = password;
        self.handle = None;
    }

    pub fn disconnect(&mut self) {
        if self.handle.take().is_some() {
            debug!("Player connection dropped");
        }
    }

    /// Return the live connection, opening and authenticating a new one if needed
    async fn ensure_connected(&mut self) -> Result<Arc<dyn PlayerConnection>, PlayerError> {
        if let Some(conn) = &self.handle {
            if !conn.is_closed() {
                return Ok(Arc::clone(conn));
            }
            debug!("Discarding closed player connection");
        }
        self.handle = None;

        info!("🎵 Connecting to MPD at {}", self.connector.address());
        let conn = self.connector.connect().await?;

        if let Some(password) = &self.password {
            debug!("Sending MPD password");
            conn.authenticate(password).await.map_err(|e| match e {
                PlayerError::Command { detail, .. } => PlayerError::Auth(detail),
                other => other,
            })?;
        }

        info!("✅ Connected to MPD at {}", self.connector.address());
        self.handle = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Run `op` against a live connection, retrying the whole operation
    ///
    /// `retry_budget` is the total number of attempts (at least one), shared by
    /// connection establishment and `op` itself. Closed connections are
    /// replaced before the next attempt; after a command error the same
    /// connection is reused.
    pub async fn with_connection<T, F, Fut>(
        &mut self,
        retry_budget: u32,
        mut op: F,
    ) -> Result<T, PlayerError>
    where
        F: FnMut(Arc<dyn PlayerConnection>) -> Fut,
        Fut: Future<Output = Result<T, PlayerError>>,
    {
        let attempts = retry_budget.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let conn = match self.ensure_connected().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(attempt, attempts, "⚠️  MPD connection failed: {}", e);
                    self.handle = None;
                    last_error = Some(e);
                    continue;
                }
            };

            match op(Arc::clone(&conn)).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if e.is_closed() || conn.is_closed() {
                        debug!(attempt, attempts, "Player connection lost: {}", e);
                        self.handle = None;
                    } else {
                        debug!(attempt, attempts, "Player command failed: {}", e);
                        conn.clear_error();
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PlayerError::Closed("no attempt made".to_string())))
    }
}
