pub mod config;

use std::path::PathBuf;

use log::warn;

use crate::block::{ParamValue, Params};
use crate::template::text_literal;

/// Type tag of error blocks; no function may use it.
pub const RESERVED_NAME: &str = "error";

/// Static description of one function: its parameters, in declaration
/// order, and the defaults applied when a call omits them.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub params: Vec<String>,
    pub defaults: Params,
    pub description: String,
}

impl Schema {
    pub fn new(name: impl Into<String>, params: &[&str]) -> Self {
        Schema {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            defaults: Params::new(),
            description: String::new(),
        }
    }

    pub fn with_default(mut self, param: &str, value: impl Into<ParamValue>) -> Self {
        self.defaults.insert(param.to_string(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn declares(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }

    pub fn default_for(&self, param: &str) -> Option<&ParamValue> {
        self.defaults.get(param)
    }

    /// A parameter is required when it has no default.
    pub fn is_required(&self, param: &str) -> bool {
        self.declares(param) && !self.defaults.contains_key(param)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if !is_identifier(&self.name) {
            return Err(RegistryError::InvalidIdentifier(self.name.clone()));
        }
        if self.name == RESERVED_NAME {
            return Err(RegistryError::ReservedName(self.name.clone()));
        }
        for (i, param) in self.params.iter().enumerate() {
            if !is_identifier(param) {
                return Err(RegistryError::InvalidIdentifier(param.clone()));
            }
            if self.params[..i].contains(param) {
                return Err(RegistryError::DuplicateParam {
                    function: self.name.clone(),
                    param: param.clone(),
                });
            }
        }
        if let Some(param) = self.defaults.keys().find(|k| !self.declares(k)) {
            return Err(RegistryError::UndeclaredDefault {
                function: self.name.clone(),
                param: param.clone(),
            });
        }
        // Templates must be able to write every default back out.
        for (param, value) in &self.defaults {
            if let ParamValue::Text(text) = value {
                if text_literal(text).is_none() {
                    return Err(RegistryError::InexpressibleDefault {
                        function: self.name.clone(),
                        param: param.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Names use the same character class the call syntax accepts.
pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("function `{0}` is declared more than once")]
    DuplicateFunction(String),
    #[error("function `{function}` declares parameter `{param}` more than once")]
    DuplicateParam { function: String, param: String },
    #[error("function `{function}` has a default for undeclared parameter `{param}`")]
    UndeclaredDefault { function: String, param: String },
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),
    #[error("`{0}` is reserved for error blocks")]
    ReservedName(String),
    #[error("default for `{function}.{param}` cannot be written as a quoted value")]
    InexpressibleDefault { function: String, param: String },
    #[error("cannot read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Read-only lookup of function schemas, kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<Schema>) -> Result<Self, RegistryError> {
        let mut registry = SchemaRegistry {
            schemas: Vec::with_capacity(schemas.len()),
        };
        for schema in schemas {
            schema.validate()?;
            if registry.contains(&schema.name) {
                return Err(RegistryError::DuplicateFunction(schema.name));
            }
            registry.schemas.push(schema);
        }
        Ok(registry)
    }

    /// The functions every document can use.
    pub fn builtin() -> Self {
        SchemaRegistry {
            schemas: vec![
                Schema::new("head", &["text", "rank"])
                    .with_default("rank", 1i64)
                    .with_description("Heading, rank=1..6"),
                Schema::new("paragraph", &["text"]).with_description("Plain paragraph"),
                Schema::new("code", &["text", "language", "title"])
                    .with_default("language", "")
                    .with_default("title", "")
                    .with_description("Code block"),
                Schema::new("list", &["items", "type"])
                    .with_default("type", "ul")
                    .with_description("List, type=ul|ol, items separated by | or newlines"),
                Schema::new("image", &["src", "alt", "width", "height"])
                    .with_default("alt", "")
                    .with_description("Image, bare numeric width/height are pixels"),
                Schema::new("table", &["rows", "align", "header"])
                    .with_default("align", "")
                    .with_default("header", "false")
                    .with_description("Table, rows separated by |, cells by comma, align=l|c|r per column"),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    /// Add a schema, replacing an existing one of the same name in place.
    pub fn with_schema(mut self, schema: Schema) -> Result<Self, RegistryError> {
        schema.validate()?;
        match self.schemas.iter_mut().find(|s| s.name == schema.name) {
            Some(existing) => {
                warn!("schema `{}` overrides an existing definition", schema.name);
                *existing = schema;
            }
            None => self.schemas.push(schema),
        }
        Ok(self)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_is_valid_and_ordered() {
        let builtin = SchemaRegistry::builtin();
        let rebuilt = SchemaRegistry::new(builtin.schemas().to_vec()).unwrap();
        assert_eq!(rebuilt, builtin);
        assert_eq!(
            builtin.names().collect::<Vec<_>>(),
            vec!["head", "paragraph", "code", "list", "image", "table"]
        );
    }

    #[test]
    fn head_defaults_rank_to_integer_one() {
        let registry = SchemaRegistry::builtin();
        let head = registry.get("head").unwrap();
        assert_eq!(head.default_for("rank"), Some(&ParamValue::Integer(1)));
        assert!(head.is_required("text"));
        assert!(!head.is_required("rank"));
        assert!(!head.is_required("missing"));
    }

    #[test]
    fn rejects_duplicate_functions() {
        let err = SchemaRegistry::new(vec![Schema::new("a", &[]), Schema::new("a", &["x"])]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateFunction(name) if name == "a"));
    }

    #[test]
    fn rejects_duplicate_params() {
        let err = SchemaRegistry::new(vec![Schema::new("a", &["x", "x"])]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateParam { .. }));
    }

    #[test]
    fn rejects_defaults_for_undeclared_params() {
        let err = SchemaRegistry::new(vec![Schema::new("a", &["x"]).with_default("y", "1")]).unwrap_err();
        assert!(matches!(err, RegistryError::UndeclaredDefault { param, .. } if param == "y"));
    }

    #[test]
    fn rejects_names_the_call_syntax_cannot_reach() {
        let err = SchemaRegistry::new(vec![Schema::new("my-func", &[])]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidIdentifier(_)));
    }

    #[test]
    fn rejects_the_error_tag_as_a_function_name() {
        let err = SchemaRegistry::new(vec![Schema::new("error", &["text"])]).unwrap_err();
        assert!(matches!(err, RegistryError::ReservedName(name) if name == "error"));

        let err = SchemaRegistry::builtin()
            .with_schema(Schema::new("error", &["text"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ReservedName(_)));
    }

    #[test]
    fn rejects_defaults_templates_cannot_write() {
        for bad in [r#"both " and '"#, r"C:\temp", "ends with \\"] {
            let err = SchemaRegistry::new(vec![Schema::new("note", &["body"]).with_default("body", bad)])
                .unwrap_err();
            assert!(
                matches!(&err, RegistryError::InexpressibleDefault { function, param } if function == "note" && param == "body"),
                "{:?}: {}",
                bad,
                err
            );
        }
        assert!(SchemaRegistry::new(vec![Schema::new("note", &["body"]).with_default("body", r#"say "hi""#)]).is_ok());
    }

    #[test]
    fn with_schema_replaces_in_place() {
        let registry = SchemaRegistry::builtin()
            .with_schema(Schema::new("head", &["text"]))
            .unwrap()
            .with_schema(Schema::new("note", &["text"]))
            .unwrap();
        assert_eq!(registry.schemas()[0].params, vec!["text"]);
        assert_eq!(registry.names().last(), Some("note"));
    }
}
