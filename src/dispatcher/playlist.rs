//! Playlist selection, loading and saving

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::playlists::{Direction, PlaylistEntry};

impl super::Dispatcher {
    /// Feed `p:` digits into the numeric entry and load the resulting slot
    pub(super) async fn handle_playlist_number(&mut self, digits: &[u8], now: Instant) -> Result<()> {
        let mut number = self.digit_entry.value();
        for &digit in digits {
            number = self.digit_entry.record_digit(now, digit);
        }

        let Ok(slot) = u32::try_from(number) else {
            warn!("⚠️  Playlist number {} is out of range", number);
            return Ok(());
        };

        match self.directory.get(slot).cloned() {
            Some(entry) => self.load_playlist(&entry).await,
            None => {
                debug!("No playlist at slot {}", slot);
                Ok(())
            }
        }
    }

    /// Load the playlist after (or before) the current one
    pub(super) async fn step_playlist(&mut self, direction: Direction) -> Result<()> {
        let current = self.session.current_playlist.as_deref();
        let Some(entry) = self.directory.next_or_prev(direction, current).cloned() else {
            warn!("⚠️  No playlists configured");
            return Ok(());
        };
        self.load_playlist(&entry).await
    }

    /// Replace the queue with `entry` and start playing it
    ///
    /// stop, clear, load, random, play run as one unit; a failed attempt
    /// starts over from stop.
    pub(super) async fn load_playlist(&mut self, entry: &PlaylistEntry) -> Result<()> {
        let tries = self.settings.max_tries;
        info!("📂 Loading playlist {}", entry);

        let name = entry.name.clone();
        let shuffle = entry.shuffle;
        let result = self
            .connection
            .with_connection(tries, move |c| {
                let name = name.clone();
                async move {
                    c.stop().await?;
                    c.clear_queue().await?;
                    c.load_playlist(&name).await?;
                    c.set_random(shuffle).await?;
                    c.play().await
                }
            })
            .await;

        match result {
            Ok(()) => {
                self.session.playlist_loaded(&entry.name);
                info!("✅ Playing playlist '{}'", entry.name);
                Ok(())
            }
            Err(e) => {
                self.session.playlist_lost();
                Err(anyhow::Error::new(e).context(format!(
                    "Failed to load playlist '{}' after {} attempt(s)",
                    entry.name,
                    tries.max(1)
                )))
            }
        }
    }

    /// Count a playlist update press; save the loaded playlist once confirmed
    pub(super) async fn confirm_playlist_update(&mut self, now: Instant) -> Result<()> {
        if !self.update_presses.confirm(now, self.settings.update_repeat) {
            debug!(
                presses = self.update_presses.value(),
                needed = self.settings.update_repeat,
                "Playlist update not confirmed yet"
            );
            return Ok(());
        }

        let Some(name) = self.session.current_playlist.clone() else {
            warn!("⚠️  No playlist loaded, nothing to save");
            return Ok(());
        };

        let tries = self.settings.max_tries;
        info!("💾 Saving queue as playlist '{}'", name);

        let saved = name.clone();
        self.connection
            .with_connection(tries, move |c| {
                let name = saved.clone();
                async move {
                    match c.save_playlist(&name).await {
                        Ok(()) => Ok(()),
                        Err(e) if e.is_closed() => Err(e),
                        Err(e) => {
                            debug!("Save failed ({}), replacing stored playlist", e);
                            c.clear_error();
                            c.remove_playlist(&name).await?;
                            c.save_playlist(&name).await
                        }
                    }
                }
            })
            .await
            .with_context(|| format!("Failed to save playlist '{}'", name))?;

        info!("✅ Playlist '{}' saved", name);
        Ok(())
    }
}
