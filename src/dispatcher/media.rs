//! Playback and queue commands (`m:` category)

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::debug;

use crate::command::MediaCommand;
use crate::player::{PlaybackState, PlayerConnection, PlayerError};
use crate::playlists::Direction;

impl super::Dispatcher {
    pub(super) async fn handle_media(&mut self, cmd: MediaCommand, now: Instant) -> Result<()> {
        let tries = self.settings.max_tries;

        let result = match cmd {
            MediaCommand::PlayPause => {
                self.connection
                    .with_connection(tries, |c| async move {
                        let status = c.status().await?;
                        if status.state == PlaybackState::Playing {
                            c.pause().await
                        } else {
                            c.play().await
                        }
                    })
                    .await
            }
            MediaCommand::Next => {
                self.connection
                    .with_connection(tries, |c| async move { c.next().await })
                    .await
            }
            MediaCommand::Prev => {
                self.connection
                    .with_connection(tries, |c| async move { c.previous().await })
                    .await
            }
            MediaCommand::Stop => {
                self.connection
                    .with_connection(tries, |c| async move { c.stop().await })
                    .await
            }
            MediaCommand::Delete => {
                self.connection
                    .with_connection(tries, |c| async move {
                        let status = c.status().await?;
                        match (status.state, status.song_position) {
                            (PlaybackState::Playing | PlaybackState::Paused, Some(position)) => {
                                c.delete_at(position).await
                            }
                            _ => Ok(()),
                        }
                    })
                    .await
            }
            MediaCommand::NextAlbum => {
                self.connection
                    .with_connection(tries, |c| async move {
                        match next_album_start(c.as_ref()).await? {
                            Some(target) => c.play_at(target).await,
                            None => Ok(()),
                        }
                    })
                    .await
            }
            MediaCommand::PrevAlbum => {
                self.connection
                    .with_connection(tries, |c| async move {
                        match prev_album_start(c.as_ref()).await? {
                            Some(target) => c.play_at(target).await,
                            None => Ok(()),
                        }
                    })
                    .await
            }
            MediaCommand::PlaylistUpdate => return self.confirm_playlist_update(now).await,
            MediaCommand::NextPlaylist => return self.step_playlist(Direction::Forward).await,
            MediaCommand::PrevPlaylist => return self.step_playlist(Direction::Backward).await,
        };

        result.with_context(|| format!("m:{} failed after {} attempt(s)", cmd.as_str(), tries.max(1)))
    }
}

/// A missing tag on either side counts as a different album
fn album_differs(reference: Option<&str>, other: Option<&str>) -> bool {
    match (reference, other) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

/// First queue position after the current song whose album differs from it
pub(super) async fn next_album_start(
    conn: &dyn PlayerConnection,
) -> Result<Option<u32>, PlayerError> {
    let status = conn.status().await?;
    let Some(current) = status.song_position else {
        return Ok(None);
    };

    let reference = conn.album_at(current).await?;
    for position in current + 1..status.queue_length {
        let album = conn.album_at(position).await?;
        if album_differs(reference.as_deref(), album.as_deref()) {
            debug!("Next album starts at queue position {}", position);
            return Ok(Some(position));
        }
    }

    Ok(None)
}

/// Start of the album that holds the song before the current one
///
/// Scans backwards from the previous song; lands on the position right after
/// the first album change, or on position 0 when the queue start is reached
/// (including when the first song is playing).
pub(super) async fn prev_album_start(
    conn: &dyn PlayerConnection,
) -> Result<Option<u32>, PlayerError> {
    let status = conn.status().await?;
    let Some(current) = status.song_position else {
        return Ok(None);
    };
    if current == 0 {
        return Ok(Some(0));
    }

    let reference_position = current - 1;
    let reference = conn.album_at(reference_position).await?;

    let mut position = reference_position;
    while position > 0 {
        position -= 1;
        let album = conn.album_at(position).await?;
        if album_differs(reference.as_deref(), album.as_deref()) {
            debug!("Previous album starts at queue position {}", position + 1);
            return Ok(Some(position + 1));
        }
    }

    Ok(Some(0))
}
