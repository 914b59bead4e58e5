//! # Bounded diagnostic message.
//!
//! [`ErrMsg`] stores the human-readable part of a [`ThreadResult`](crate::ThreadResult).
//! Its capacity is fixed at [`ERRMSG_MAX`] bytes including a reserved terminator byte,
//! so at most `ERRMSG_MAX - 1` bytes of text are kept.
//!
//! ## Rules
//! - Writes past the capacity are **truncated**, never reallocated.
//! - Truncation always happens on a UTF-8 character boundary.
//! - Truncation is not an error: `fmt::Write` keeps returning `Ok(())` so a
//!   partially formatted message is still recorded.

use std::fmt;

/// Capacity of a diagnostic message in bytes (one byte reserved).
pub const ERRMSG_MAX: usize = 512;

/// Bounded, truncating string used for per-thread diagnostics.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ErrMsg {
    buf: String,
    truncated: bool,
}

impl ErrMsg {
    /// Maximum number of text bytes an [`ErrMsg`] keeps.
    pub const LIMIT: usize = ERRMSG_MAX - 1;

    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message from `text`, truncating it if needed.
    #[must_use]
    pub fn from_str_truncated(text: &str) -> Self {
        let mut msg = Self::new();
        msg.push_str(text);
        msg
    }

    /// Appends as much of `text` as fits; returns the number of bytes kept.
    pub fn push_str(&mut self, text: &str) -> usize {
        let room = Self::LIMIT - self.buf.len();
        if text.len() <= room {
            self.buf.push_str(text);
            return text.len();
        }

        let mut cut = room;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buf.push_str(&text[..cut]);
        self.truncated = true;
        cut
    }

    /// Returns the stored text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// True if some text was dropped because the capacity was exceeded.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

impl fmt::Write for ErrMsg {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl fmt::Display for ErrMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl fmt::Debug for ErrMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.buf, f)
    }
}

impl AsRef<str> for ErrMsg {
    fn as_ref(&self) -> &str {
        &self.buf
    }
}
