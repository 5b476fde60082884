//! Decomposition of the text between a call's parentheses into parameters.
//!
//! Grammar, after normalization:
//!
//! ```text
//! params := sep* (pair sep*)*
//! pair   := key ws* '=' ws* value ws* (',' | end)
//! key    := word
//! value  := '"' qchar* '"' | "'" qchar* "'" | word
//! sep    := ws | ','
//! ```
//!
//! Inside a quoted value, a backslash escapes the next character as long as
//! that character is not a line terminator; raw newlines are allowed.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::block::{ParamValue, Params};
use crate::schema::is_word_char;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("unexpected `{found}` at offset {offset}")]
    Malformed { offset: usize, found: char },
}

/// Collapse structural line breaks so multi-line, indented parameter lists
/// read as one logical line.
///
/// Runs of newlines become one newline, then a newline followed by
/// whitespace becomes a single space. This is purely textual: a quoted value
/// containing a newline followed by indentation is rewritten the same way.
pub fn normalize(interior: &str) -> String {
    let mut collapsed = String::with_capacity(interior.len());
    for c in interior.chars() {
        if c == '\n' && collapsed.ends_with('\n') {
            continue;
        }
        collapsed.push(c);
    }

    let mut out = String::with_capacity(collapsed.len());
    let mut chars = collapsed.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out.trim().to_string()
}

/// Decompose a parameter list into a key/value mapping. Later duplicates win.
pub fn decompose_params(interior: &str) -> Result<Params, ParamError> {
    let mut params = Params::new();
    if interior.trim().is_empty() {
        return Ok(params);
    }

    let normalized = normalize(interior);
    let mut cursor = Cursor::new(&normalized);
    loop {
        cursor.skip_separators();
        let Some(&(offset, found)) = cursor.chars.peek() else {
            break;
        };
        match cursor.pair() {
            Some((key, value)) => {
                params.insert(key, value);
            }
            None => return Err(ParamError::Malformed { offset, found }),
        }
    }
    Ok(params)
}

struct Cursor<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Cursor {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len())
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.chars.next_if(|&(_, c)| pred(c)).is_some() {}
    }

    fn skip_separators(&mut self) {
        self.skip_while(|c| c.is_whitespace() || c == ',');
    }

    fn word(&mut self) -> Option<&'a str> {
        let start = self.pos();
        self.skip_while(is_word_char);
        let end = self.pos();
        let src = self.src;
        (end > start).then(|| &src[start..end])
    }

    /// One `key=value` pair plus its terminator, or `None` when the text at
    /// the cursor is not a well-formed pair.
    fn pair(&mut self) -> Option<(String, ParamValue)> {
        let key = self.word()?;
        self.skip_while(char::is_whitespace);
        if !self.eat('=') {
            return None;
        }
        self.skip_while(char::is_whitespace);
        let value = match self.chars.peek().map(|&(_, c)| c) {
            Some(q @ ('"' | '\'')) => ParamValue::Text(unescape(self.quoted(q)?)),
            _ => bare_value(self.word()?),
        };
        self.skip_while(char::is_whitespace);
        (self.eat(',') || self.chars.peek().is_none()).then(|| (key.to_string(), value))
    }

    /// Contents of a quoted string, without the quotes and still escaped.
    fn quoted(&mut self, quote: char) -> Option<&'a str> {
        self.chars.next();
        let start = self.pos();
        loop {
            let (offset, c) = self.chars.next()?;
            if c == quote {
                return Some(&self.src[start..offset]);
            }
            if c == '\\' {
                let (_, escaped) = self.chars.next()?;
                if is_line_terminator(escaped) {
                    return None;
                }
            }
        }
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Only `\n` and `\t` are translated; other escapes are kept verbatim.
fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n").replace("\\t", "\t")
}

/// Digit runs become integers; a run too long for `i64` stays text.
fn bare_value(word: &str) -> ParamValue {
    if word.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = word.parse() {
            return ParamValue::Integer(n);
        }
    }
    ParamValue::Text(word.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(interior: &str) -> Params {
        decompose_params(interior).unwrap()
    }

    fn text(s: &str) -> ParamValue {
        ParamValue::Text(s.to_string())
    }

    #[test]
    fn quoted_bare_and_numeric_values() {
        let params = parse(r#"text="Hello, (world)", rank=2, type=ol, name='x'"#);
        assert_eq!(params["text"], text("Hello, (world)"));
        assert_eq!(params["rank"], ParamValue::Integer(2));
        assert_eq!(params["type"], text("ol"));
        assert_eq!(params["name"], text("x"));
    }

    #[test]
    fn quoted_digits_stay_text() {
        assert_eq!(parse(r#"rank="2""#)["rank"], text("2"));
    }

    #[test]
    fn escapes() {
        let params = parse(r#"a="x\ny\tz", b="say \"hi\"", c='it\'s'"#);
        assert_eq!(params["a"], text("x\ny\tz"));
        assert_eq!(params["b"], text(r#"say \"hi\""#));
        assert_eq!(params["c"], text(r"it\'s"));
    }

    #[test]
    fn multi_line_lists_normalize() {
        let params = parse("\n    text=\"a\",\n\n    language=\"js\",\n");
        assert_eq!(params["text"], text("a"));
        assert_eq!(params["language"], text("js"));
    }

    #[test]
    fn raw_newline_inside_a_quote_survives_when_not_indented() {
        assert_eq!(parse("text=\"line1\nline2\"")["text"], text("line1\nline2"));
    }

    #[test]
    fn raw_newline_then_indentation_inside_a_quote_is_collapsed() {
        assert_eq!(parse("text=\"line1\n    line2\"")["text"], text("line1 line2"));
    }

    #[test]
    fn trailing_and_repeated_commas_are_tolerated() {
        let params = parse("a=1,, b=2,");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn later_duplicates_win() {
        assert_eq!(parse("a=1, a=2")["a"], ParamValue::Integer(2));
    }

    #[test]
    fn empty_interior_has_no_params() {
        assert!(parse("  \n ").is_empty());
    }

    #[test]
    fn whitespace_around_equals_is_allowed() {
        assert_eq!(parse("a = \"x\" , b =3")["b"], ParamValue::Integer(3));
    }

    #[rstest]
    #[case(r#"text"no-equals""#)]
    #[case(r#"text="a" rank=2"#)]
    #[case(r#"text="unterminated"#)]
    #[case("text=")]
    #[case("=1")]
    #[case("a=1; b=2")]
    #[case("a=hello world")]
    #[case("a=-1")]
    #[case("标题=\"x\"")]
    fn malformed(#[case] interior: &str) {
        assert!(matches!(
            decompose_params(interior),
            Err(ParamError::Malformed { .. })
        ));
    }

    #[test]
    fn malformed_reports_where_it_stopped() {
        assert_eq!(
            decompose_params(r#"a=1, -b=2"#),
            Err(ParamError::Malformed { offset: 5, found: '-' })
        );
    }

    #[test]
    fn backslash_before_line_break_is_malformed() {
        assert!(decompose_params("a=\"x\\\ny\"").is_err());
    }

    #[test]
    fn oversized_digit_runs_stay_text() {
        let params = parse("n=99999999999999999999, m=9223372036854775807");
        assert_eq!(params["n"], text("99999999999999999999"));
        assert_eq!(params["m"], ParamValue::Integer(i64::MAX));
    }
}
