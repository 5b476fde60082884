/// How a single source line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Empty after trimming.
    Blank,
    /// Trimmed line starts with the `@` sigil.
    CallStart,
    Text,
}

/// One source line with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToken<'a> {
    pub kind: LineKind,
    /// The line as written, including leading indentation.
    pub raw: &'a str,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column of the sigil for call starts, 1 otherwise.
    pub column: usize,
}

impl LineToken<'_> {
    pub fn trimmed(&self) -> &str {
        self.raw.trim()
    }
}

/// Split input on `\n` and classify each line. Never fails.
pub fn tokenize(input: &str) -> Vec<LineToken<'_>> {
    input
        .split('\n')
        .enumerate()
        .map(|(i, raw)| {
            let trimmed = raw.trim();
            let (kind, column) = if trimmed.is_empty() {
                (LineKind::Blank, 1)
            } else if trimmed.starts_with('@') {
                let column = raw.chars().take_while(|&c| c != '@').count() + 1;
                (LineKind::CallStart, column)
            } else {
                (LineKind::Text, 1)
            };
            LineToken {
                kind,
                raw,
                line: i + 1,
                column,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<LineKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(
            kinds("@head(text=\"a\")\n\n  plain text\n   \t\n  @code("),
            vec![
                LineKind::CallStart,
                LineKind::Blank,
                LineKind::Text,
                LineKind::Blank,
                LineKind::CallStart,
            ]
        );
    }

    #[test]
    fn numbers_lines_from_one_and_locates_the_sigil() {
        let tokens = tokenize("first\n   @list(items=\"a\")");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 4);
        assert_eq!(tokens[1].trimmed(), "@list(items=\"a\")");
    }

    #[test]
    fn trailing_newline_yields_a_blank_line() {
        assert_eq!(kinds("text\n"), vec![LineKind::Text, LineKind::Blank]);
        assert_eq!(kinds(""), vec![LineKind::Blank]);
    }

    #[test]
    fn sigil_inside_text_does_not_start_a_call() {
        assert_eq!(kinds("mail me @ home"), vec![LineKind::Text]);
    }
}
