//! Flat-offset text source over a single string.

use regex::Regex;

use super::TextSource;

/// The simplest adapter: positions are byte offsets into one string.
#[derive(Debug, Clone, Copy)]
pub struct StringSource<'a> {
    text: &'a str,
}

impl<'a> StringSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }
}

impl TextSource for StringSource<'_> {
    type Pos = usize;

    fn start(&self) -> usize {
        0
    }

    fn match_literal(&self, literal: &str, at: usize) -> Option<usize> {
        if self.text[at..].starts_with(literal) {
            Some(at + literal.len())
        } else {
            None
        }
    }

    fn match_pattern(&self, pattern: &Regex, at: usize) -> Option<usize> {
        super::anchored_end(self.text, pattern, at)
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }
}
