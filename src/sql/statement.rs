use crate::sql::{token_kind::TokenKind, tokenizer::tokenize};
use derive_more::Display;

/// Coarse classification of what an executed statement does.
///
/// Variants are ordered by how likely they are to affect the schema, so the
/// kind of a multi-statement buffer is the maximum over its statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum StatementKind {
    #[display("query")]
    Query,
    #[display("dml")]
    Dml,
    /// Not recognised; treated as possibly schema-changing.
    #[display("other")]
    Other,
    #[display("ddl")]
    Ddl,
}

impl StatementKind {
    /// Classify a SQL buffer by the leading keyword of each `;`-separated statement.
    ///
    /// Leading parentheses are skipped so `(SELECT ...) UNION ...` stays a query.
    /// A buffer without any statement classifies as `Query`.
    pub fn classify(sql: &str) -> Self {
        let tokens = tokenize(sql);
        tokens
            .split(|t| matches!(t.kind, TokenKind::Semicolon))
            .filter_map(|statement| {
                statement
                    .iter()
                    .find(|t| !matches!(t.kind, TokenKind::ParenOpen))
            })
            .map(|lead| match lead.keyword() {
                Some(k) if k.is_query() => StatementKind::Query,
                Some(k) if k.is_schema_change() => StatementKind::Ddl,
                Some(_) => StatementKind::Dml,
                None => StatementKind::Other,
            })
            .max()
            .unwrap_or(StatementKind::Query)
    }

    pub fn may_change_schema(self) -> bool {
        matches!(self, StatementKind::Ddl | StatementKind::Other)
    }
}
