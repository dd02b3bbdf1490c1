//! lircd socket reader
//!
//! lircd broadcasts one line per decoded key press:
//!
//! ```text
//! 0000000000f40bf0 00 KEY_PLAY samsung
//! ```
//!
//! (code, hex repeat counter, button name, remote name). Replies to client
//! commands arrive framed by `BEGIN` / `END` lines and are skipped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::UnixStream;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, trace, warn};

use super::{looks_symbolic, EventSource};
use crate::config::LircConfig;

/// One key press as broadcast by lircd
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LircKey<'a> {
    pub code: &'a str,
    /// 0 for the initial press, counting up while the key is held
    pub repeat: u32,
    pub button: &'a str,
    pub remote: &'a str,
}

impl<'a> LircKey<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let code = parts.next()?;
        let repeat = u32::from_str_radix(parts.next()?, 16).ok()?;
        let button = parts.next()?;
        let remote = parts.next()?;

        Some(Self {
            code,
            repeat,
            button,
            remote,
        })
    }
}

/// Reads key presses from lircd and maps them to symbolic events
pub struct LircSource<R = UnixStream> {
    lines: LinesStream<BufReader<R>>,
    keymap: BTreeMap<String, String>,
    in_reply: bool,
}

impl LircSource<UnixStream> {
    /// Connect to the lircd socket, retrying once per second
    pub async fn connect(config: &LircConfig) -> Result<Self> {
        let tries = config.connect_tries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match UnixStream::connect(&config.socket).await {
                Ok(stream) => {
                    info!("✅ Connected to lircd at {}", config.socket);
                    return Ok(Self::from_reader(stream, config.keymap.clone()));
                }
                Err(e) if attempt < tries => {
                    warn!(
                        "⚠️  lircd not reachable at {} ({}), retry {}/{}",
                        config.socket, e, attempt, tries
                    );
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to connect to lircd at {} after {} attempt(s)",
                            config.socket, tries
                        )
                    });
                }
            }
        }
    }
}

impl<R: AsyncRead + Unpin + Send> LircSource<R> {
    pub fn from_reader(reader: R, keymap: BTreeMap<String, String>) -> Self {
        Self {
            lines: LinesStream::new(BufReader::new(reader).lines()),
            keymap,
            in_reply: false,
        }
    }

    /// Turn one lircd line into an event, if it is a mapped first press
    fn translate(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if self.in_reply {
            if line == "END" {
                self.in_reply = false;
            }
            return None;
        }
        if line == "BEGIN" {
            self.in_reply = true;
            return None;
        }

        let Some(key) = LircKey::parse(line) else {
            debug!("Ignoring malformed lircd line: {}", line);
            return None;
        };

        if key.repeat != 0 {
            trace!(button = key.button, repeat = key.repeat, "Ignoring key repeat");
            return None;
        }

        if let Some(symbol) = self.keymap.get(key.button) {
            debug!("🎛️  {} ({}) -> {}", key.button, key.remote, symbol);
            return Some(symbol.clone());
        }
        if looks_symbolic(key.button) {
            return Some(key.button.to_string());
        }

        debug!("No mapping for button {} on remote {} ({})", key.button, key.remote, key.code);
        None
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> EventSource for LircSource<R> {
    fn name(&self) -> &str {
        "lircd"
    }

    async fn next_event(&mut self) -> Result<Option<String>> {
        while let Some(line) = self.lines.next().await {
            let line = line.context("Failed to read from lircd")?;
            if let Some(symbol) = self.translate(&line) {
                return Ok(Some(symbol));
            }
        }

        anyhow::bail!("lircd closed the connection")
    }

    fn update_keymap(&mut self, keymap: &BTreeMap<String, String>) {
        self.keymap = keymap.clone();
        debug!("lircd keymap updated ({} buttons)", self.keymap.len());
    }
}
