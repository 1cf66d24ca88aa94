//! Token kinds for the lenient SQL tokenizer. Anything unrecognized becomes
//! `Other(char)`.
use crate::sql::keyword::Keyword;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Any word that does not lead a statement, case preserved.
    Ident(String),
    /// Recognized statement-leading keyword.
    Keyword(Keyword),
    Semicolon,
    Dot,
    ParenOpen,
    ParenClose,
    Other(char),
}

impl TokenKind {
    pub fn keyword(&self) -> Option<Keyword> {
        match self {
            TokenKind::Keyword(k) => Some(*k),
            _ => None,
        }
    }
}
