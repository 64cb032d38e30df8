//! Line/column-tracked text source for multi-line input.
//!
//! Positions carry a zero-based line, a zero-based byte column within that
//! line, and the absolute byte offset. Ordering is derived from the field
//! order, which agrees with offset order for positions into the same text.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::TextSource;

/// A position in multi-line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Text source that reports line/column positions instead of flat offsets.
#[derive(Debug, Clone, Copy)]
pub struct MultilineSource<'a> {
    text: &'a str,
}

impl<'a> MultilineSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Advances `from` by `len` bytes, recomputing line and column from the
    /// newlines crossed.
    fn advance(&self, from: LineCol, len: usize) -> LineCol {
        let end = from.offset + len;
        let crossed = &self.text[from.offset..end];
        match crossed.rfind('\n') {
            None => LineCol {
                line: from.line,
                column: from.column + len,
                offset: end,
            },
            Some(last) => LineCol {
                line: from.line + crossed.matches('\n').count(),
                column: end - (from.offset + last) - 1,
                offset: end,
            },
        }
    }
}

impl TextSource for MultilineSource<'_> {
    type Pos = LineCol;

    fn start(&self) -> LineCol {
        LineCol {
            line: 0,
            column: 0,
            offset: 0,
        }
    }

    fn match_literal(&self, literal: &str, at: LineCol) -> Option<LineCol> {
        if self.text[at.offset..].starts_with(literal) {
            Some(self.advance(at, literal.len()))
        } else {
            None
        }
    }

    fn match_pattern(&self, pattern: &Regex, at: LineCol) -> Option<LineCol> {
        let end = super::anchored_end(self.text, pattern, at.offset)?;
        Some(self.advance(at, end - at.offset))
    }

    fn slice(&self, start: LineCol, end: LineCol) -> &str {
        &self.text[start.offset..end.offset]
    }
}
