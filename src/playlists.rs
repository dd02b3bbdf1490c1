//! Playlist directory - numeric slots selectable from the remote
//!
//! Slots are kept in ascending order so that "next/previous playlist"
//! navigation walks the table in the same order the user numbered it.

use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A configured playlist reachable by slot number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub slot: u32,
    pub name: String,
    pub shuffle: bool,
}

impl fmt::Display for PlaylistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {:04} -> \"{}\"", self.slot, self.name)?;
        if self.shuffle {
            write!(f, "  (random)")?;
        }
        Ok(())
    }
}

/// Traversal direction for adjacent playlist lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Ordered slot -> playlist table
#[derive(Debug, Clone, Default)]
pub struct PlaylistDirectory {
    entries: BTreeMap<u32, PlaylistEntry>,
}

impl PlaylistDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry at `slot`
    ///
    /// Empty names are dropped without error; returns whether the entry was stored.
    pub fn add(&mut self, slot: u32, name: &str, shuffle: bool) -> bool {
        if name.trim().is_empty() {
            debug!("Ignoring playlist slot {} with empty name", slot);
            return false;
        }

        self.entries.insert(
            slot,
            PlaylistEntry {
                slot,
                name: name.to_string(),
                shuffle,
            },
        );
        true
    }

    pub fn get(&self, slot: u32) -> Option<&PlaylistEntry> {
        self.entries.get(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending slot order
    pub fn iter(&self) -> impl Iterator<Item = &PlaylistEntry> {
        self.entries.values()
    }

    /// Find the playlist adjacent to the one named `current` (cyclic)
    ///
    /// Matching is by name; the lowest slot wins when several slots share a name.
    /// Without a current playlist, or when it is not in the table, forward
    /// yields the first entry and backward the last one.
    pub fn next_or_prev(&self, direction: Direction, current: Option<&str>) -> Option<&PlaylistEntry> {
        let first = self.entries.values().next()?;
        let last = self.entries.values().next_back()?;

        let position = current.and_then(|name| self.entries.values().position(|e| e.name == name));

        let Some(index) = position else {
            return Some(match direction {
                Direction::Forward => first,
                Direction::Backward => last,
            });
        };

        match direction {
            Direction::Forward => Some(self.entries.values().nth(index + 1).unwrap_or(first)),
            Direction::Backward => {
                if index == 0 {
                    Some(last)
                } else {
                    self.entries.values().nth(index - 1)
                }
            }
        }
    }
}
