//! Starter snippets for inserting a call.

use crate::block::ParamValue;
use crate::schema::SchemaRegistry;

/// A multi-line call skeleton listing every declared parameter with its
/// default, or `None` for an unregistered name.
///
/// ```text
/// @head(
///     text="",
///     rank=1
/// )
/// ```
///
/// Integer defaults are written bare so that parsing the skeleton gives back
/// the same typed defaults.
pub fn generate_template(registry: &SchemaRegistry, name: &str) -> Option<String> {
    let schema = registry.get(name)?;
    let params = schema
        .params
        .iter()
        .map(|param| Some(format!("    {}={}", param, literal(schema.default_for(param))?)))
        .collect::<Option<Vec<_>>>()?
        .join(",\n");
    Some(format!("@{}(\n{}\n)", schema.name, params))
}

fn literal(value: Option<&ParamValue>) -> Option<String> {
    match value {
        Some(ParamValue::Integer(n)) => Some(n.to_string()),
        Some(ParamValue::Text(s)) => text_literal(s),
        None => Some("\"\"".to_string()),
    }
}

/// `text` as a quoted value that parses back to exactly `text`, or `None`
/// when the call syntax cannot express it.
///
/// Double quotes are used unless the text contains one, then single quotes.
/// Newlines and tabs are written as `\n` and `\t`. Any other backslash is
/// kept verbatim by the parser, so it must not be followed by `n`, `t` or a
/// line terminator, nor end the text.
pub(crate) fn text_literal(text: &str) -> Option<String> {
    let quote = match (text.contains('"'), text.contains('\'')) {
        (false, _) => '"',
        (true, false) => '\'',
        (true, true) => return None,
    };
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), None | Some('n' | 't' | '\r' | '\u{2028}' | '\u{2029}')) {
            return None;
        }
    }
    let escaped = text.replace('\n', "\\n").replace('\t', "\\t");
    Some(format!("{}{}{}", quote, escaped, quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;

    #[test]
    fn head_template() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(
            generate_template(&registry, "head").as_deref(),
            Some("@head(\n    text=\"\",\n    rank=1\n)")
        );
    }

    #[test]
    fn string_defaults_are_quoted() {
        let registry = SchemaRegistry::builtin();
        let template = generate_template(&registry, "list").unwrap();
        assert!(template.contains("    type=\"ul\"\n)"));
    }

    #[test]
    fn defaults_with_control_characters_are_escaped() {
        let registry = SchemaRegistry::new(vec![
            Schema::new("snippet", &["body"]).with_default("body", "a\nb\tc"),
        ])
        .unwrap();
        assert_eq!(
            generate_template(&registry, "snippet").as_deref(),
            Some("@snippet(\n    body=\"a\\nb\\tc\"\n)")
        );
    }

    #[test]
    fn text_with_double_quotes_switches_to_single_quotes() {
        assert_eq!(text_literal(r#"say "hi""#).as_deref(), Some(r#"'say "hi"'"#));
        assert_eq!(text_literal("it's").as_deref(), Some(r#""it's""#));
        assert_eq!(text_literal(r"C:\Users").as_deref(), Some(r#""C:\Users""#));
    }

    #[test]
    fn inexpressible_text_has_no_literal() {
        assert_eq!(text_literal(r#"both " and '"#), None);
        assert_eq!(text_literal(r"C:\temp"), None);
        assert_eq!(text_literal(r"line\n"), None);
        assert_eq!(text_literal("trailing\\"), None);
    }

    #[test]
    fn unknown_names_have_no_template() {
        assert_eq!(generate_template(&SchemaRegistry::builtin(), "nope"), None);
    }
}
