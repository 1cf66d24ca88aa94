//! Keyword vocabulary offered for completion.
//!
//! The static part is every keyword `sqlparser` knows across its dialects plus
//! the common scalar functions that JDBC-style drivers advertise (string,
//! numeric, date/time and system functions). Servers can add dialect words on
//! top through [`MetadataSource::fetch_keywords`].
use super::*;
use crate::MetadataError;
use sqlparser::keywords::ALL_KEYWORDS;
use std::time::Duration;

/// Scalar function names commonly exposed by relational drivers.
pub const FUNCTIONS: &[&str] = &[
    // string
    "ASCII", "BIT_LENGTH", "CHAR_LENGTH", "CHARACTER_LENGTH", "CONCAT", "CONCAT_WS", "FORMAT",
    "INSTR", "LCASE", "LEFT", "LENGTH", "LOCATE", "LOWER", "LPAD", "LTRIM", "OCTET_LENGTH",
    "POSITION", "REPEAT", "REPLACE", "REVERSE", "RIGHT", "RPAD", "RTRIM", "SOUNDEX", "SPACE",
    "SUBSTR", "SUBSTRING", "SUBSTRING_INDEX", "TRIM", "UCASE", "UPPER",
    // numeric
    "ABS", "ACOS", "ASIN", "ATAN", "ATAN2", "CEIL", "CEILING", "COS", "COT", "DEGREES", "EXP",
    "FLOOR", "LN", "LOG", "LOG10", "LOG2", "MOD", "PI", "POW", "POWER", "RADIANS", "RAND",
    "ROUND", "SIGN", "SIN", "SQRT", "TAN", "TRUNCATE",
    // aggregate
    "AVG", "COUNT", "GROUP_CONCAT", "MAX", "MIN", "STRING_AGG", "SUM",
    // date/time
    "ADDDATE", "CURDATE", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURTIME",
    "DATE_ADD", "DATE_FORMAT", "DATE_SUB", "DATE_TRUNC", "DATEDIFF", "DAYNAME", "DAYOFMONTH",
    "DAYOFWEEK", "DAYOFYEAR", "EXTRACT", "FROM_UNIXTIME", "HOUR", "LOCALTIME", "LOCALTIMESTAMP",
    "MINUTE", "MONTH", "MONTHNAME", "NOW", "QUARTER", "SECOND", "STR_TO_DATE", "SYSDATE",
    "TIMESTAMPDIFF", "UNIX_TIMESTAMP", "WEEK", "YEAR",
    // system
    "COALESCE", "CONNECTION_ID", "CURRENT_USER", "DATABASE", "IFNULL", "NULLIF", "SESSION_USER",
    "SYSTEM_USER", "USER", "VERSION",
];

/// Gathers the keyword half of the candidate vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSource;

impl KeywordSource {
    /// Keywords and function names that need no connection.
    pub fn standard(&self) -> BTreeSet<String> {
        ALL_KEYWORDS
            .iter()
            .chain(FUNCTIONS)
            .map(|word| word.to_uppercase())
            .collect()
    }

    /// Standard vocabulary plus whatever the connected server advertises.
    pub async fn collect<S: MetadataSource>(&self, source: &S, timeout: Duration) -> BTreeSet<String> {
        let mut keywords = self.standard();
        keywords.extend(self.advertised(source, timeout).await);
        keywords
    }

    /// Dialect words the server advertises, upper-cased.
    ///
    /// A failed query, or one still unanswered after `timeout`, is logged and
    /// yields an empty set.
    pub async fn advertised<S: MetadataSource>(&self, source: &S, timeout: Duration) -> BTreeSet<String> {
        let queried = tokio::time::timeout(timeout, source.fetch_keywords())
            .await
            .map_err(|_| MetadataError::Timeout(timeout))
            .and_then(|result| result);
        match queried {
            Ok(queried) => {
                debug!("Server advertised {} keywords", queried.len());
                queried
                    .into_iter()
                    .filter(|word| !word.is_empty())
                    .map(|word| word.to_uppercase())
                    .collect()
            }
            Err(e) => {
                warn!("Could not query dialect keywords, using the standard set: {e}");
                BTreeSet::new()
            }
        }
    }
}
