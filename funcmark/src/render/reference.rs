//! Markdown reference documentation for a registry's functions.

use std::fmt::Write;

use crate::block::ParamValue;
use crate::schema::{Schema, SchemaRegistry};

/// A Markdown document describing every registered function: a table of
/// contents, then per function its parameters and a sample call.
pub fn function_reference(registry: &SchemaRegistry) -> String {
    let mut out = String::from("# Function reference\n\n");
    out.push_str("## Contents\n\n");
    for name in registry.names() {
        let _ = writeln!(out, "- [{}](#{})", name, name);
    }
    out.push_str("\n---\n\n");
    for schema in registry.schemas() {
        function_section(&mut out, schema);
    }
    out
}

fn function_section(out: &mut String, schema: &Schema) {
    let _ = writeln!(out, "### {}\n", schema.name);
    if !schema.description.is_empty() {
        let _ = writeln!(out, "{}\n", schema.description);
    }

    out.push_str("| Parameter | Required | Default |\n|---|---|---|\n");
    for param in &schema.params {
        let (required, default) = match schema.default_for(param) {
            Some(value) => ("no", default_cell(value)),
            None => ("yes", String::new()),
        };
        let _ = writeln!(out, "| {} | {} | {} |", param, required, default);
    }

    let sample = schema
        .params
        .iter()
        .map(|param| match schema.default_for(param) {
            Some(value) => format!("{}=\"{}\"", param, value),
            None => format!("{}=\"{}_value\"", param, param),
        })
        .collect::<Vec<_>>()
        .join(", ");
    let _ = write!(
        out,
        "\nExample:\n\n```\n@{}({})\n```\n\n---\n\n",
        schema.name, sample
    );
}

fn default_cell(value: &ParamValue) -> String {
    match value {
        ParamValue::Text(s) if s.is_empty() => "\"\"".to_string(),
        other => other.to_string().replace('|', "\\|"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_function_with_a_sample() {
        let doc = function_reference(&SchemaRegistry::builtin());
        for name in SchemaRegistry::builtin().names() {
            assert!(doc.contains(&format!("- [{}](#{})", name, name)));
            assert!(doc.contains(&format!("### {}", name)));
        }
        assert!(doc.contains("@head(text=\"text_value\", rank=\"1\")"));
    }

    #[test]
    fn parameter_rows_show_requirement_and_default() {
        let doc = function_reference(&SchemaRegistry::builtin());
        assert!(doc.contains("| text | yes |  |"));
        assert!(doc.contains("| rank | no | 1 |"));
        assert!(doc.contains("| language | no | \"\" |"));
    }

    #[test]
    fn pipes_in_defaults_are_escaped() {
        let registry =
            SchemaRegistry::new(vec![Schema::new("menu", &["items"]).with_default("items", "a|b")]).unwrap();
        assert!(function_reference(&registry).contains("| items | no | a\\|b |"));
    }
}
