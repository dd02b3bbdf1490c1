//! System commands (`s:` category)

use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::command::SystemCommand;

impl super::Dispatcher {
    pub(super) fn handle_system(&mut self, cmd: SystemCommand, now: Instant) -> Result<()> {
        match cmd {
            SystemCommand::PowerOff => {
                if !self.power_presses.confirm(now, self.settings.power_repeat) {
                    debug!(
                        presses = self.power_presses.value(),
                        needed = self.settings.power_repeat,
                        "Power off not confirmed yet"
                    );
                    return Ok(());
                }

                match &self.settings.power_command {
                    Some(command) => {
                        info!("⏻ Power off confirmed");
                        if let Err(e) = self.executor.execute(command) {
                            warn!("⚠️  Power command failed: {:#}", e);
                        }
                    }
                    None => warn!("⚠️  Power off confirmed but no power command is configured"),
                }
                Ok(())
            }
        }
    }
}
