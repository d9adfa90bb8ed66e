//! Dialer buffer
//!
//! Holds the number being typed on the keypad. Only length and key set are
//! enforced here; whether the number is dialable is decided by the state
//! machine when a call is placed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of keys the buffer accepts
pub const MAX_DIGITS: usize = 15;

/// A single keypad key: `0-9`, `*` or `#`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialKey(char);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a keypad key: {0:?}")]
pub struct InvalidKey(pub String);

impl DialKey {
    pub fn as_char(self) -> char {
        self.0
    }
}

impl TryFrom<char> for DialKey {
    type Error = InvalidKey;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        if c.is_ascii_digit() || c == '*' || c == '#' {
            Ok(Self(c))
        } else {
            Err(InvalidKey(c.to_string()))
        }
    }
}

impl std::str::FromStr for DialKey {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::try_from(c),
            _ => Err(InvalidKey(s.to_string())),
        }
    }
}

impl fmt::Display for DialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The in-progress destination number. Empty means cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialerBuffer(String);

impl DialerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key. Returns false (and leaves the buffer alone) when full.
    pub fn append(&mut self, key: DialKey) -> bool {
        if self.len() >= MAX_DIGITS {
            return false;
        }
        self.0.push(key.as_char());
        true
    }

    pub fn backspace(&mut self) {
        self.0.pop();
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keys are ASCII, so bytes and characters coincide.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DialerBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
