//! Host system commands triggered from the remote (power off)

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs a configured system command without waiting for its outcome
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str) -> Result<()>;
}

/// Executes commands through `sh -c`
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) -> Result<()> {
        info!("⚡ Running system command: {}", command);

        let mut child = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .kill_on_drop(false)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", command))?;

        let command = command.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("System command '{}' finished", command),
                Ok(status) => warn!("System command '{}' exited with {}", command, status),
                Err(e) => warn!("Failed to wait for system command '{}': {}", command, e),
            }
        });

        Ok(())
    }
}

/// Records commands instead of running them (console mode and tests)
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    executed: Arc<Mutex<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, command: &str) -> Result<()> {
        info!("🧪 Would run system command: {}", command);
        self.executed.lock().push(command.to_string());
        Ok(())
    }
}

/// Executor for the run mode: console sessions only record system commands
pub fn executor_for(console: bool) -> Arc<dyn CommandExecutor> {
    if console {
        Arc::new(RecordingExecutor::new())
    } else {
        Arc::new(ShellExecutor::default())
    }
}
