use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use serde::{Serialize, Serializer};

use crate::block::Location;

/// Stable error codes carried by error blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Sigil without an opening paren, a call that doesn't match the
    /// `@name(` shape, or an internal failure while building the block.
    SyntaxError,
    /// The function name has no registered schema.
    UnknownFunction,
    /// The parenthesized interior couldn't be decomposed into `key=value` pairs.
    ParamFormatError,
    /// Input ended while a multi-line call was still open.
    UnclosedParen,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 4] = [
        ErrorCode::SyntaxError,
        ErrorCode::UnknownFunction,
        ErrorCode::ParamFormatError,
        ErrorCode::UnclosedParen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "SYNTAX_ERROR",
            ErrorCode::UnknownFunction => "UNKNOWN_FUNCTION",
            ErrorCode::ParamFormatError => "PARAM_FORMAT_ERROR",
            ErrorCode::UnclosedParen => "UNCLOSED_PAREN",
        }
    }

    /// Short diagnostic id shown next to the error in terminal output.
    pub fn id(self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "FM000",
            ErrorCode::UnknownFunction => "FM001",
            ErrorCode::ParamFormatError => "FM002",
            ErrorCode::UnclosedParen => "FM003",
        }
    }

    /// Look a code up by either its name or its diagnostic id.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == name || code.id() == name)
    }

    fn default_hint(self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "calls are written as @name(key=\"value\", ...)",
            ErrorCode::UnknownFunction => "check the function name against the registered functions",
            ErrorCode::ParamFormatError => {
                "parameters are key=value pairs separated by commas; quote values containing spaces or punctuation"
            }
            ErrorCode::UnclosedParen => "add the missing `)` to close the call",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An inline error produced in place of a malformed construct.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBlock {
    pub code: ErrorCode,
    pub message: String,
    pub hint: String,
    pub location: Option<Location>,
}

impl ErrorBlock {
    pub fn new(code: ErrorCode, message: impl Into<String>, location: Option<Location>) -> Self {
        ErrorBlock {
            code,
            message: message.into(),
            hint: code.default_hint().to_string(),
            location,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Convert to a codespan-reporting Diagnostic labelled on the block's line.
    pub fn to_diagnostic(&self, file_id: usize, source: &str) -> Diagnostic<usize> {
        let mut diagnostic = Diagnostic::error()
            .with_code(self.code.id())
            .with_message(format!("{}: {}", self.code, self.message));
        if let Some(location) = self.location {
            diagnostic = diagnostic
                .with_labels(vec![Label::primary(file_id, line_span(source, location.line))]);
        }
        if !self.hint.is_empty() {
            diagnostic = diagnostic.with_notes(vec![format!("hint: {}", self.hint)]);
        }
        diagnostic
    }
}

impl fmt::Display for ErrorBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{} at line {}: {}", self.code, location.line, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Byte range of a 1-based line, without its terminator.
/// Lines past the end collapse to an empty range at the end of `source`.
pub fn line_span(source: &str, line: usize) -> Range<usize> {
    let mut start = 0;
    for _ in 1..line {
        match source[start..].find('\n') {
            Some(pos) => start += pos + 1,
            None => return source.len()..source.len(),
        }
    }
    let end = source[start..]
        .find('\n')
        .map(|pos| start + pos)
        .unwrap_or(source.len());
    let end = if source[start..end].ends_with('\r') { end - 1 } else { end };
    start..end
}
