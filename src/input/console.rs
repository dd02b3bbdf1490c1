//! Interactive console source for driving the dispatcher without a remote

use anyhow::Result;
use async_trait::async_trait;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::EventSource;

const PROMPT: &str = "irmpc> ";

/// What a typed console line asks for
#[derive(Debug, PartialEq, Eq)]
enum ConsoleLine {
    Event(String),
    Skip,
    Quit,
}

fn classify(line: &str) -> ConsoleLine {
    match line.trim() {
        "" => ConsoleLine::Skip,
        "exit" | "quit" => ConsoleLine::Quit,
        event => ConsoleLine::Event(event.to_string()),
    }
}

/// Reads symbolic events typed at a `rustyline` prompt
pub struct ConsoleSource {
    rx: mpsc::Receiver<String>,
}

impl ConsoleSource {
    /// Start the prompt on its own thread
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel(16);

        std::thread::Builder::new()
            .name("irmpc-console".to_string())
            .spawn(move || {
                let mut rl = match DefaultEditor::new() {
                    Ok(rl) => rl,
                    Err(e) => {
                        warn!("⚠️  Console unavailable: {}", e);
                        return;
                    }
                };

                loop {
                    match rl.readline(PROMPT) {
                        Ok(line) => match classify(&line) {
                            ConsoleLine::Skip => continue,
                            ConsoleLine::Quit => break,
                            ConsoleLine::Event(event) => {
                                let _ = rl.add_history_entry(event.as_str());
                                if tx.blocking_send(event).is_err() {
                                    break;
                                }
                            }
                        },
                        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                        Err(e) => {
                            warn!("Console read failed: {}", e);
                            break;
                        }
                    }
                }
            })?;

        debug!("Console source started");
        Ok(Self { rx })
    }

    #[cfg(test)]
    fn from_channel(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl EventSource for ConsoleSource {
    fn name(&self) -> &str {
        "console"
    }

    async fn next_event(&mut self) -> Result<Option<String>> {
        Ok(self.rx.recv().await)
    }
}
