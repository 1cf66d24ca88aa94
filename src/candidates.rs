//! The unified completion vocabulary.
//!
//! A [`CandidateSet`] merges keywords and schema object names into one set of
//! unique strings and precomputes two immutable, sorted views over it: "all"
//! (keywords ∪ schema names) and "schema only". Both views are ordered by the
//! case-folded text with the original bytes as tie-breaker, which is exactly
//! the order completions are returned in, so prefix lookups are a binary search
//! followed by a contiguous scan.
//!
//! A set is never mutated once built; [`CandidateSet::refresh_schema`] returns a
//! new value sharing the keyword partition.
use crate::*;
use itertools::Itertools;
use std::{cmp::Ordering, collections::BTreeSet, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    folded: String,
    text: String,
}

impl Entry {
    fn new(text: &str) -> Self {
        Self {
            folded: fold_case(text),
            text: text.to_string(),
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.folded
            .cmp(&other.folded)
            .then_with(|| self.text.as_bytes().cmp(other.text.as_bytes()))
    }
}

/// Lower-case `text` one character at a time.
///
/// `str::to_lowercase` maps a final `Σ` to `ς`, so a prefix and the longer
/// word it starts would fold differently.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Case-insensitive lexicographic order with byte order breaking ties.
pub fn candidate_order(a: &str, b: &str) -> Ordering {
    fold_case(a)
        .cmp(&fold_case(b))
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct CandidateSet {
    keywords: Arc<BTreeSet<String>>,
    all: Arc<[Entry]>,
    schema_only: Arc<[Entry]>,
}

impl CandidateSet {
    /// Merge keywords and schema object names into a new candidate set.
    ///
    /// Fails with `InvalidArgument` if any entry is an empty string.
    pub fn build(keywords: BTreeSet<String>, schema_names: BTreeSet<String>) -> Result<Self> {
        Self::with_keywords(Arc::new(keywords), schema_names)
    }

    /// A new set with the schema partition replaced and the keywords untouched.
    pub fn refresh_schema(&self, schema_names: BTreeSet<String>) -> Result<Self> {
        Self::with_keywords(Arc::clone(&self.keywords), schema_names)
    }

    /// Build over an already shared keyword partition.
    pub(crate) fn with_keywords(keywords: Arc<BTreeSet<String>>, schema_names: BTreeSet<String>) -> Result<Self> {
        if keywords.contains("") {
            return Err(Error::invalid_argument("keywords contain an empty string"));
        }
        if schema_names.contains("") {
            return Err(Error::invalid_argument(
                "schema names contain an empty string",
            ));
        }

        let schema_only = Self::sorted(schema_names.iter());
        let all = Self::sorted(keywords.union(&schema_names));

        Ok(Self {
            keywords,
            all: all.into(),
            schema_only: schema_only.into(),
        })
    }

    fn sorted<'a>(names: impl Iterator<Item = &'a String>) -> Vec<Entry> {
        names
            .map(|name| Entry::new(name))
            .sorted_by(Entry::cmp_key)
            .collect()
    }

    /// Every candidate (keywords ∪ schema names) in completion order.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.all.iter().map(|e| e.text.as_str())
    }

    /// Schema object names only, in completion order.
    pub fn schema_only(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.schema_only.iter().map(|e| e.text.as_str())
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Candidates of the "all" view whose text case-insensitively starts with `prefix`.
    pub fn matching<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a str> + 'a {
        Self::prefix_range(&self.all, prefix)
    }

    /// Candidates of the "schema only" view whose text case-insensitively starts with `prefix`.
    pub fn matching_schema<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a str> + 'a {
        Self::prefix_range(&self.schema_only, prefix)
    }

    fn prefix_range<'a>(entries: &'a [Entry], prefix: &str) -> impl Iterator<Item = &'a str> + 'a {
        let folded = fold_case(prefix);
        let first = entries.partition_point(|e| e.folded.as_str() < folded.as_str());
        entries[first..]
            .iter()
            .take_while(move |e| e.folded.starts_with(&folded))
            .map(|e| e.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn vocabulary() -> CandidateSet {
        CandidateSet::build(
            set(&["SELECT", "FROM", "WHERE"]),
            set(&["orders", "order_items"]),
        )
        .expect("valid vocabulary")
    }

    #[test]
    fn all_view_is_sorted_case_insensitively() {
        let candidates = vocabulary();
        assert_eq!(
            candidates.all().collect::<Vec<_>>(),
            ["FROM", "order_items", "orders", "SELECT", "WHERE"]
        );
        assert_eq!(
            candidates.schema_only().collect::<Vec<_>>(),
            ["order_items", "orders"]
        );
    }

    #[test]
    fn schema_only_is_subset_of_all() {
        let candidates = vocabulary();
        let all: BTreeSet<_> = candidates.all().collect();
        assert!(candidates.schema_only().all(|name| all.contains(name)));
    }

    #[test]
    fn keyword_and_schema_name_with_same_text_collapse() {
        let candidates =
            CandidateSet::build(set(&["ORDER", "USER"]), set(&["USER", "user"])).expect("valid");
        assert_eq!(candidates.all().collect::<Vec<_>>(), ["ORDER", "USER", "user"]);
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn refresh_replaces_schema_and_keeps_keywords() {
        let candidates = vocabulary();
        let refreshed = candidates
            .refresh_schema(set(&["customers"]))
            .expect("valid refresh");

        assert!(Arc::ptr_eq(&candidates.keywords, &refreshed.keywords));
        assert_eq!(
            refreshed.all().collect::<Vec<_>>(),
            ["customers", "FROM", "SELECT", "WHERE"]
        );
        assert_eq!(refreshed.schema_only().collect::<Vec<_>>(), ["customers"]);
        // The original value is untouched.
        assert_eq!(candidates.schema_only().count(), 2);
    }

    #[test]
    fn empty_entries_are_invalid() {
        let result = CandidateSet::build(set(&[""]), set(&["orders"]));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = vocabulary().refresh_schema(set(&["orders", ""]));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn matching_is_case_insensitive_and_keeps_original_text() {
        let candidates = vocabulary();
        assert_eq!(candidates.matching("ord").collect::<Vec<_>>(), ["order_items", "orders"]);
        assert_eq!(candidates.matching("ORD").collect::<Vec<_>>(), ["order_items", "orders"]);
        assert_eq!(candidates.matching("sel").collect::<Vec<_>>(), ["SELECT"]);
        assert_eq!(candidates.matching("orders_").count(), 0);
        assert_eq!(candidates.matching("").count(), candidates.len());
        assert_eq!(candidates.matching_schema("f").count(), 0);
        assert_eq!(candidates.matching_schema("OR").count(), 2);
    }

    #[test]
    fn prefix_ending_in_sigma_matches_longer_word() {
        let candidates = CandidateSet::build(set(&[]), set(&["ΟΔΟΣΑ", "οδός"])).expect("valid");
        assert_eq!(candidates.matching("ΟΔΟΣ").collect::<Vec<_>>(), ["ΟΔΟΣΑ"]);
        assert_eq!(candidates.matching("οδοσ").collect::<Vec<_>>(), ["ΟΔΟΣΑ"]);
        assert_eq!(fold_case("ΟΔΟΣ"), "οδοσ");
    }

    #[test]
    fn case_variants_order_by_bytes() {
        let candidates =
            CandidateSet::build(set(&["ORDER"]), set(&["order", "Order", "orders"])).expect("valid");
        assert_eq!(
            candidates.all().collect::<Vec<_>>(),
            ["ORDER", "Order", "order", "orders"]
        );
        assert!(candidate_order("ORDER", "order").is_lt());
        assert!(candidate_order("order", "ORDERS").is_lt());
    }
}
