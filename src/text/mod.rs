//! Input-text abstraction for the parsing engine.
//!
//! The engine never touches text directly. It asks a [`TextSource`] whether a
//! literal or a pattern matches at a position, compares positions, and slices
//! the text between two of them for text capture. Positions are an opaque,
//! totally ordered type chosen by the adapter: a flat byte offset
//! ([`string::StringSource`]) or a line/column/offset triple
//! ([`multiline::MultilineSource`]).

pub mod multiline;
pub mod string;

pub use multiline::{LineCol, MultilineSource};
pub use string::StringSource;

use regex::Regex;

/// A matchable input sequence with opaque, monotonically advancing positions.
///
/// Both matching operations fail by returning `None`; a failed match is an
/// ordinary outcome, never a panic or an error.
pub trait TextSource {
    /// Position type. Totally ordered; advancing a position never moves it
    /// backwards.
    type Pos: Copy + Ord + std::fmt::Debug;

    /// The position of the start of the input.
    fn start(&self) -> Self::Pos;

    /// If `literal` occurs verbatim at `at`, the position just past it.
    fn match_literal(&self, literal: &str, at: Self::Pos) -> Option<Self::Pos>;

    /// If `pattern` matches anchored at `at`, the position just past the
    /// match. Zero-width matches are allowed and return `at` itself.
    fn match_pattern(&self, pattern: &Regex, at: Self::Pos) -> Option<Self::Pos>;

    /// The text between two positions. `start` must not exceed `end`.
    fn slice(&self, start: Self::Pos, end: Self::Pos) -> &str;
}

/// Matches `pattern` anchored at byte `offset` of `text`, returning the end
/// offset. The regex crate has no anchored entry point on `Regex`, so this
/// takes the leftmost match of the tail and accepts it only when it starts at
/// the position itself.
pub(crate) fn anchored_end(text: &str, pattern: &Regex, offset: usize) -> Option<usize> {
    let m = pattern.find(&text[offset..])?;
    if m.start() == 0 {
        Some(offset + m.end())
    } else {
        None
    }
}
