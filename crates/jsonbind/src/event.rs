//! Events consumed by the importer and the seam through which they arrive.
//!
//! An [`Event`] is one primitive notification from a tokenizer: a structural
//! bracket, an object key, or a scalar value. Events are produced in document
//! order and the [`Dispatcher`](crate::Dispatcher) consumes exactly one per
//! step.
//!
//! # Examples
//!
//! ```
//! use jsonbind::{Event, EventSource, Reader};
//!
//! let mut reader = Reader::new(br#"{"n": -2}"#);
//! let mut seen = Vec::new();
//! while let Some(event) = reader.next_event().unwrap() {
//!     seen.push(event.to_string());
//! }
//! assert_eq!(seen, ["object start", "key \"n\"", "signed integer -2", "object end"]);
//! ```
use core::fmt;

use bstr::BStr;

use crate::error::{LexicalError, Position};

/// One primitive notification from the event source.
///
/// `Key` and `String` carry raw bytes; whether they are valid UTF-8 is only
/// checked where a payload is stored into a Rust `String`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// An object member name.
    Key(&'a BStr),
    /// A string value.
    String(&'a BStr),
    /// A negative integer.
    SignedInt(i64),
    /// A non-negative integer.
    UnsignedInt(u64),
    /// Any other number.
    Double(f64),
    /// `true` or `false`
    Bool(bool),
    /// `null`
    Null,
}

impl Event<'_> {
    /// Returns `true` for value events that are neither containers nor keys.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::String(_)
                | Self::SignedInt(_)
                | Self::UnsignedInt(_)
                | Self::Double(_)
                | Self::Bool(_)
                | Self::Null
        )
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectStart => f.write_str("object start"),
            Self::ObjectEnd => f.write_str("object end"),
            Self::ArrayStart => f.write_str("array start"),
            Self::ArrayEnd => f.write_str("array end"),
            Self::Key(name) => write!(f, "key {name:?}"),
            Self::String(value) => write!(f, "string {value:?}"),
            Self::SignedInt(value) => write!(f, "signed integer {value}"),
            Self::UnsignedInt(value) => write!(f, "unsigned integer {value}"),
            Self::Double(value) => write!(f, "number {value}"),
            Self::Bool(value) => write!(f, "boolean {value}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// A pull-based producer of [`Event`]s.
///
/// Each event may borrow from the source (for instance a scratch buffer
/// holding a decoded string), so the next event can only be requested once
/// the previous one is no longer used.
pub trait EventSource {
    /// Produce the next event, `Ok(None)` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a [`LexicalError`] when the underlying input is malformed. No
    /// further events are produced after an error.
    fn next_event(&mut self) -> Result<Option<Event<'_>>, LexicalError>;

    /// Location of the most recently produced event, if the source tracks one.
    fn position(&self) -> Option<Position> {
        None
    }
}

/// Replays events that were recorded or built by hand.
impl<'e> EventSource for core::slice::Iter<'_, Event<'e>> {
    fn next_event(&mut self) -> Result<Option<Event<'_>>, LexicalError> {
        Ok(self.next().copied())
    }
}
