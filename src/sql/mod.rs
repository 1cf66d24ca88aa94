//! Lightweight, lenient SQL tokenization.
//!
//! Modules:
//! - `keyword`    : Statement-leading keywords used to classify statements.
//! - `token_kind` : Classification of lexical atoms (identifiers, punctuation, keywords).
//! - `token`      : Token struct pairing a `TokenKind` with source span offsets.
//! - `tokenizer`  : Single pass tokenizer and cursor partial-token extraction.
//! - `statement`  : Statement classification for the refresh trigger.
//!
//! Everything here accepts incomplete or invalid SQL; nothing fails except
//! cursor validation in `extract_partial_token`.
//!
//! Example:
//! ```rust
//! use sqlcomplete::prelude::*;
//!
//! let partial = extract_partial_token("SELECT * FROM ord", 17).unwrap();
//! assert_eq!((partial.text, partial.start), ("ord", 14));
//! assert_eq!(StatementKind::classify("DROP TABLE orders"), StatementKind::Ddl);
//! ```

pub mod keyword;
pub mod statement;
pub mod token;
pub mod token_kind;
pub mod tokenizer;

pub use keyword::Keyword;
pub use statement::StatementKind;
pub use token::Token;
pub use token_kind::TokenKind;
pub use tokenizer::{PartialToken, extract_partial_token, is_ident_char, tokenize};

/// Convenience prelude re‑exporting the most commonly used items.
pub mod prelude {
    pub use super::{
        Keyword, PartialToken, StatementKind, Token, TokenKind, extract_partial_token, tokenize,
    };
}
