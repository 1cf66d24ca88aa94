use crate::*;
use itertools::Itertools;

/// Matching behaviour that can be tuned per engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Offer only schema object names when the partial token follows a `.`
    /// (for example `orders.cu`); keywords never follow a qualifier.
    pub schema_only_after_dot: bool,
}

/// Stateless completion over a published [`CandidateSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    options: MatchOptions,
}

impl Matcher {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    /// Completions for the partial token ending at `cursor`.
    ///
    /// 1. Extract the partial token (fails only on an invalid cursor).
    /// 2. An empty token yields the whole vocabulary.
    /// 3. Otherwise every candidate starting with the token, compared case-insensitively.
    ///
    /// The result is distinct, case-insensitively sorted with byte order breaking
    /// ties, and identical for identical inputs.
    pub fn complete(&self, candidates: &CandidateSet, buffer: &str, cursor: usize) -> Result<Vec<String>> {
        let token = extract_partial_token(buffer, cursor)?;
        let qualified = self.options.schema_only_after_dot && buffer[..token.start].ends_with('.');

        let matches: Vec<&str> = match (token.is_empty(), qualified) {
            (true, false) => candidates.all().collect(),
            (true, true) => candidates.schema_only().collect(),
            (false, false) => candidates.matching(token.text).collect(),
            (false, true) => candidates.matching_schema(token.text).collect(),
        };
        trace!(
            "Token {:?} at {} matched {} of {} candidates",
            token.text,
            token.start,
            matches.len(),
            candidates.len()
        );

        // Views are already ordered and unique; dedup guards the contract anyway.
        Ok(matches.into_iter().dedup().map(str::to_string).collect())
    }
}

/// Filter, order and deduplicate an arbitrary candidate stream against `token`.
///
/// For callers that merge keyword and schema views themselves: the output never
/// repeats a string and follows the same order as [`Matcher::complete`].
pub fn rank<'a>(candidates: impl IntoIterator<Item = &'a str>, token: &str) -> Vec<String> {
    let folded = fold_case(token);
    candidates
        .into_iter()
        .filter(|c| fold_case(c).starts_with(&folded))
        .sorted_by(|a, b| candidate_order(a, b))
        .dedup()
        .map(str::to_string)
        .collect()
}
