//! Event sources producing symbolic remote events (`m:playpause`, `p:3`, ...)

pub mod console;
pub mod lirc;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub use console::ConsoleSource;
pub use lirc::LircSource;

/// A stream of symbolic events, one per key press
#[async_trait]
pub trait EventSource: Send {
    /// Source name for logging
    fn name(&self) -> &str;

    /// Wait for the next event
    ///
    /// `Ok(None)` means the source is exhausted; an error means it failed.
    /// Either way the caller stops reading.
    async fn next_event(&mut self) -> Result<Option<String>>;

    /// Replace the button -> event mapping (no-op for sources without one)
    fn update_keymap(&mut self, _keymap: &BTreeMap<String, String>) {}
}

/// Whether `name` already has the `<category>:<payload>` event shape
pub(crate) fn looks_symbolic(name: &str) -> bool {
    matches!(name.split_once(':'), Some((category, payload)) if category.len() == 1 && !payload.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_symbolic() {
        assert!(looks_symbolic("m:next"));
        assert!(looks_symbolic("p:12"));
        assert!(!looks_symbolic("KEY_PLAY"));
        assert!(!looks_symbolic("m:"));
        assert!(!looks_symbolic("media:next"));
    }
}
