//! Token model tying a `TokenKind` to its source span.
use crate::sql::{keyword::Keyword, token_kind::TokenKind};

/// A lexical token with its inclusive start and exclusive end byte offsets
/// into the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub const fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        self.kind.keyword()
    }
}
