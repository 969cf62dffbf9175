//! Whitespace tokenizer
//!
//! Splits a line into non-empty tokens in a single forward pass. Handlers
//! take their arguments positionally with [`Tokens::expect`] and
//! [`Tokens::number`].

use core::str::SplitAsciiWhitespace;

use crate::error::ParseError;
use crate::number;

/// Lazy token stream over one line
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    inner: SplitAsciiWhitespace<'a>,
}

/// Split `line` into whitespace-delimited tokens
pub fn tokenize(line: &str) -> Tokens<'_> {
    Tokens {
        inner: line.split_ascii_whitespace(),
    }
}

impl<'a> Tokens<'a> {
    /// Take the next token, failing if the line is exhausted
    pub fn expect(&mut self, what: &'static str) -> Result<&'a str, ParseError> {
        self.next().ok_or(ParseError::MissingToken { what })
    }

    /// Take the next token as a 32-bit number
    pub fn number(&mut self, what: &'static str) -> Result<u32, ParseError> {
        number::parse_u32(self.expect(what)?, what)
    }

    /// Take the next token as a machine-word number
    pub fn word(&mut self, what: &'static str) -> Result<usize, ParseError> {
        number::parse_usize(self.expect(what)?, what)
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }
}
