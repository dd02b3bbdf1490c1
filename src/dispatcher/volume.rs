//! Volume commands (`v:` category)

use anyhow::{Context, Result};
use tracing::info;

use crate::command::VolumeCommand;
use crate::player::PlayerError;

/// Volume to send and how the session should record it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct VolumeChange {
    pub target: u8,
    pub mute: bool,
    /// Volume to remember in the session
    pub remembered: u8,
}

/// Work out the next volume from the server's current one
///
/// The player counts as muted when the session says so, the server still
/// reports 0 and there is a level to go back to; any volume key then restores
/// that level. Muting at volume 0 changes nothing.
pub(super) fn plan_volume(
    cmd: VolumeCommand,
    current: u8,
    last_volume: u8,
    last_mute: bool,
    step: u8,
) -> VolumeChange {
    if last_mute && current == 0 && last_volume > 0 {
        return VolumeChange {
            target: last_volume,
            mute: false,
            remembered: last_volume,
        };
    }

    let target = match cmd {
        VolumeCommand::Up => current.saturating_add(step).min(100),
        VolumeCommand::Down => current.saturating_sub(step),
        VolumeCommand::Mute if current == 0 => 0,
        VolumeCommand::Mute => {
            return VolumeChange {
                target: 0,
                mute: true,
                remembered: current,
            }
        }
    };

    VolumeChange {
        target,
        mute: false,
        remembered: target,
    }
}

impl super::Dispatcher {
    pub(super) async fn handle_volume(&mut self, cmd: VolumeCommand) -> Result<()> {
        let tries = self.settings.max_tries;
        let step = self.settings.volume_step;
        let last_volume = self.session.last_volume;
        let last_mute = self.session.last_mute;

        let change = self
            .connection
            .with_connection(tries, move |c| async move {
                let status = c.status().await?;
                let current = status
                    .volume
                    .ok_or_else(|| PlayerError::command("setvol", "no mixer available"))?;

                let change = plan_volume(cmd, current.min(100), last_volume, last_mute, step);
                c.set_volume(change.target).await?;
                Ok::<_, PlayerError>(change)
            })
            .await
            .with_context(|| format!("v:{} failed after {} attempt(s)", cmd.as_str(), tries.max(1)))?;

        if change.mute {
            self.session.muted(change.remembered);
            info!("🔇 Muted (volume was {}%)", change.remembered);
        } else {
            self.session.volume_set(change.target);
            info!("🔊 Volume {}%", change.target);
        }

        Ok(())
    }
}
