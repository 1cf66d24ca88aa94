use crate::sql::{keyword::Keyword, token::Token, token_kind::TokenKind};
use crate::*;

/// Identifier character class shared by the tokenizer and partial-token extraction.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The in-progress word immediately preceding a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialToken<'a> {
    /// Identifier characters between `start` and the cursor. May be empty.
    pub text: &'a str,
    /// Byte offset where `text` begins; equals the cursor when `text` is empty.
    pub start: usize,
}

impl PartialToken<'_> {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extract the partial identifier or keyword that ends at `cursor`.
///
/// Scans backward from the cursor while characters satisfy [`is_ident_char`].
/// Text after the cursor is never looked at, so completion works mid-line.
///
/// `cursor` is a byte offset and must satisfy `0 <= cursor <= buffer.len()` and
/// lie on a character boundary, otherwise `Error::InvalidArgument` is returned.
pub fn extract_partial_token(buffer: &str, cursor: usize) -> Result<PartialToken<'_>> {
    if cursor > buffer.len() {
        return Err(Error::invalid_argument(format!(
            "cursor {cursor} is past the end of a {} byte buffer",
            buffer.len()
        )));
    }
    if !buffer.is_char_boundary(cursor) {
        return Err(Error::invalid_argument(format!(
            "cursor {cursor} is not on a character boundary"
        )));
    }

    let head = &buffer[..cursor];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map_or(cursor, |(idx, _)| idx);

    Ok(PartialToken {
        text: &buffer[start..cursor],
        start,
    })
}

/// Lenient SQL tokenizer producing a flat stream of `Token`s.
///
/// Behavior:
/// - Skips whitespace.
/// - Aggregates identifier character runs into identifiers, preserving original case.
/// - Lowercases an identifier once to attempt keyword classification.
/// - Emits single-character tokens for semicolon, dot, parentheses; everything else is `Other(char)`.
/// - Never fails: malformed constructs still yield tokens.
pub fn tokenize(sql: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        // Identifier path
        if is_ident_char(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(idx, cc)) = chars.peek() {
                if !is_ident_char(cc) {
                    break;
                }
                end = idx + cc.len_utf8();
                chars.next();
            }
            let text = &sql[start..end];
            let kind = Keyword::from_lower(&text.to_lowercase())
                .map(TokenKind::Keyword)
                .unwrap_or_else(|| TokenKind::Ident(text.to_string()));
            out.push(Token::new(kind, start, end));
            continue;
        }

        let kind = match c {
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            other => TokenKind::Other(other),
        };
        out.push(Token::new(kind, start, start + c.len_utf8()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SELECT * FROM ord", 17, "ord", 14)]
    #[case("SEL", 3, "SEL", 0)]
    #[case("sel", 3, "sel", 0)]
    #[case("", 0, "", 0)]
    #[case("  ", 2, "", 2)]
    #[case("SELECT ", 7, "", 7)]
    #[case("SELECT", 0, "", 0)]
    // Mid-line cursor ignores trailing text
    #[case("SELECT ord FROM x", 9, "or", 7)]
    #[case("SELECT ord FROM x", 7, "", 7)]
    #[case("orders.cust", 11, "cust", 7)]
    #[case("f(order_items", 13, "order_items", 2)]
    #[case("a,b2_c", 6, "b2_c", 2)]
    #[case("x\n\tcol_1", 8, "col_1", 3)]
    #[case("SELECT größe", 14, "größe", 7)]
    fn extracts_partial_token(
        #[case] buffer: &str,
        #[case] cursor: usize,
        #[case] token: &str,
        #[case] start: usize,
    ) {
        let partial = extract_partial_token(buffer, cursor).expect("valid cursor");
        assert_eq!(partial, PartialToken { text: token, start });
    }

    #[rstest]
    #[case("SEL", 4)]
    #[case("", 1)]
    // Inside the two-byte 'ö'
    #[case("größe", 3)]
    fn rejects_invalid_cursor(#[case] buffer: &str, #[case] cursor: usize) {
        let result = extract_partial_token(buffer, cursor);
        assert!(
            matches!(result, Err(Error::InvalidArgument(_))),
            "expected InvalidArgument, got {result:?}"
        );
    }

    #[test]
    fn every_cursor_yields_identifier_chars_before_cursor() {
        for buffer in [
            "SELECT a.b, c FROM t WHERE x = 'y';",
            "  \t\nfoo_bar(baz)  ",
            "insert into \"Quoted\" values (1,2)",
            "ünïcödé_name + 42",
        ] {
            for cursor in (0..=buffer.len()).filter(|c| buffer.is_char_boundary(*c)) {
                let partial = extract_partial_token(buffer, cursor).expect("valid cursor");
                assert!(partial.start <= cursor);
                assert!(partial.text.chars().all(is_ident_char), "{partial:?}");
                assert_eq!(&buffer[partial.start..cursor], partial.text);
            }
        }
    }

    #[test]
    fn classifies_words_and_preserves_identifier_case() {
        let toks = tokenize("Create MyTable FROM t");
        assert_eq!(toks[0].kind, TokenKind::Keyword(Keyword::Create));
        assert_eq!(toks[1].kind, TokenKind::Ident("MyTable".into()));
        assert_eq!((toks[1].start, toks[1].end), (7, 14));
        // Only statement-leading words become keywords.
        assert_eq!(toks[2].kind, TokenKind::Ident("FROM".into()));
        assert_eq!(toks.len(), 4);
    }

    #[test]
    fn punctuation_tokens() {
        let toks = tokenize("(a.b;c)");
        assert!(toks.iter().any(|t| matches!(t.kind, TokenKind::ParenOpen)));
        assert!(toks.iter().any(|t| matches!(t.kind, TokenKind::Dot)));
        assert!(toks.iter().any(|t| matches!(t.kind, TokenKind::Semicolon)));
        assert!(toks.iter().any(|t| matches!(t.kind, TokenKind::ParenClose)));
    }

    #[test]
    fn multibyte_spans_are_byte_offsets() {
        let sql = "größe*x";
        let toks = tokenize(sql);
        assert_eq!((toks[0].start, toks[0].end), (0, "größe".len()));
        assert!(matches!(toks[1].kind, TokenKind::Other('*')));
        assert_eq!(&sql[toks[2].start..toks[2].end], "x");
    }
}
