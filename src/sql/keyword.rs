//! Statement-leading SQL keywords recognised by the lenient tokenizer.
//!
//! Only the words that decide what a statement *does* are classified here; every
//! other word stays an identifier token. Completion vocabulary is a separate
//! concern (see `metadata::keywords`), this enum exists so statements can be
//! classified without a full parser.
//!
//! Keywords are matched case‑insensitively via `from_lower` using a pre‑lower‑cased
//! string slice.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Queries
    Select,
    With,
    Show,
    Explain,
    Describe,
    Desc,
    Values,
    Table,
    // Schema changes
    Create,
    Alter,
    Drop,
    Rename,
    Truncate,
    Comment,
    Grant,
    Revoke,
    // Data changes
    Insert,
    Update,
    Delete,
    Merge,
    Replace,
    Copy,
    Call,
}

impl Keyword {
    /// Keywords that start a statement returning a result set.
    pub const QUERIES: [Self; 8] = [
        Keyword::Select,
        Keyword::With,
        Keyword::Show,
        Keyword::Explain,
        Keyword::Describe,
        Keyword::Desc,
        Keyword::Values,
        Keyword::Table,
    ];

    /// Keywords that start a statement which may alter the schema.
    pub const SCHEMA_CHANGES: [Self; 8] = [
        Keyword::Create,
        Keyword::Alter,
        Keyword::Drop,
        Keyword::Rename,
        Keyword::Truncate,
        Keyword::Comment,
        Keyword::Grant,
        Keyword::Revoke,
    ];

    /// Attempt to classify a *lower‑cased* word slice into a `Keyword`.
    /// Returns `None` if the word is not a recognized keyword.
    ///
    /// NOTE: The caller is responsible for lower‑casing the input.
    pub fn from_lower(word: &str) -> Option<Self> {
        use Keyword::*;
        let kw = match word {
            "select" => Select,
            "with" => With,
            "show" => Show,
            "explain" => Explain,
            "describe" => Describe,
            "desc" => Desc,
            "values" => Values,
            "table" => Table,
            "create" => Create,
            "alter" => Alter,
            "drop" => Drop,
            "rename" => Rename,
            "truncate" => Truncate,
            "comment" => Comment,
            "grant" => Grant,
            "revoke" => Revoke,
            "insert" => Insert,
            "update" => Update,
            "delete" => Delete,
            "merge" => Merge,
            "replace" => Replace,
            "copy" => Copy,
            "call" => Call,
            _ => return None,
        };
        Some(kw)
    }

    pub fn is_query(self) -> bool {
        Self::QUERIES.contains(&self)
    }

    pub fn is_schema_change(self) -> bool {
        Self::SCHEMA_CHANGES.contains(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_keywords() {
        for w in [
            "select", "with", "show", "create", "alter", "drop", "insert", "update", "delete",
            "truncate",
        ] {
            assert!(Keyword::from_lower(w).is_some(), "{w} should be recognized");
        }
    }

    #[test]
    fn rejects_unknown_words() {
        for w in ["foo", "from", "where", "orders", "SELECT"] {
            assert!(
                Keyword::from_lower(w).is_none(),
                "{w} should NOT be recognized"
            );
        }
    }

    #[test]
    fn query_and_schema_change_sets_are_disjoint() {
        assert!(Keyword::QUERIES.iter().all(|k| !k.is_schema_change()));
        assert!(Keyword::SCHEMA_CHANGES.iter().all(|k| !k.is_query()));
        assert!(!Keyword::Insert.is_query() && !Keyword::Insert.is_schema_change());
    }
}
