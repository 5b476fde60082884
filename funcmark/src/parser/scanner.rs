//! Quote-aware scanning used to find where a call ends.
//!
//! A quote character opens a string when no string is open, and closes the
//! open string when it matches the opening quote and the previous character
//! is not a backslash. The backslash check looks one character back only, so
//! `\\"` is still treated as an escaped quote. Quote state does not carry
//! across lines.

use std::str::CharIndices;

/// Characters of a line that sit outside quoted strings, with byte offsets.
/// Quote characters themselves are never yielded.
pub struct Structural<'a> {
    chars: CharIndices<'a>,
    quote: Option<char>,
    prev: Option<char>,
}

pub fn structural_chars(line: &str) -> Structural<'_> {
    Structural {
        chars: line.char_indices(),
        quote: None,
        prev: None,
    }
}

impl Structural<'_> {
    /// Whether the scan is currently inside an unterminated string.
    pub fn in_string(&self) -> bool {
        self.quote.is_some()
    }
}

impl Iterator for Structural<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<(usize, char)> {
        loop {
            let (offset, c) = self.chars.next()?;
            let prev = self.prev.replace(c);
            match self.quote {
                None if c == '"' || c == '\'' => self.quote = Some(c),
                Some(open) if c == open && prev != Some('\\') => self.quote = None,
                Some(_) => {}
                None => return Some((offset, c)),
            }
        }
    }
}

/// Net count of `(` minus `)` outside quoted strings.
pub fn paren_delta(line: &str) -> i64 {
    structural_chars(line).fold(0, |depth, (_, c)| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// True when the line's parens balance and it contains at least one `(`.
pub fn is_single_line_complete(line: &str) -> bool {
    paren_delta(line) == 0 && line.contains('(')
}
