pub mod content;
pub mod error;

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

pub use error::{ErrorBlock, ErrorCode};

/// Where a block starts in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    /// 1-based line number of the first line of the construct.
    pub line: usize,
}

impl Location {
    pub fn line(line: usize) -> Self {
        Location { line }
    }
}

/// A parameter value: quoted and non-numeric bare values are text,
/// digit-only bare values are integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(n) => Some(*n),
            ParamValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Integer(n)
    }
}

pub type Params = BTreeMap<String, ParamValue>;

/// The block kinds the built-in renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Head,
    Paragraph,
    Code,
    List,
    Image,
    Table,
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "head" => Some(BlockKind::Head),
            "paragraph" => Some(BlockKind::Paragraph),
            "code" => Some(BlockKind::Code),
            "list" => Some(BlockKind::List),
            "image" => Some(BlockKind::Image),
            "table" => Some(BlockKind::Table),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            BlockKind::Head => "head",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Code => "code",
            BlockKind::List => "list",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
        }
    }
}

/// A call (or plain text line) that resolved against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CallBlock {
    /// Type tag: the schema name, e.g. `head`.
    pub kind: String,
    pub params: Params,
    pub location: Option<Location>,
}

impl CallBlock {
    pub fn new(kind: impl Into<String>, params: Params, location: Option<Location>) -> Self {
        CallBlock {
            kind: kind.into(),
            params,
            location,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Text of a parameter, with integers rendered in decimal.
    pub fn text(&self, name: &str) -> Option<String> {
        self.params.get(name).map(ToString::to_string)
    }

    pub fn builtin_kind(&self) -> Option<BlockKind> {
        BlockKind::from_tag(&self.kind)
    }
}

/// One parsed unit of document structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Call(CallBlock),
    Error(ErrorBlock),
}

impl Block {
    pub fn type_tag(&self) -> &str {
        match self {
            Block::Call(call) => &call.kind,
            Block::Error(_) => "error",
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Block::Call(call) => call.location,
            Block::Error(err) => err.location,
        }
    }

    pub fn params(&self) -> Option<&Params> {
        match self {
            Block::Call(call) => Some(&call.params),
            Block::Error(_) => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallBlock> {
        match self {
            Block::Call(call) => Some(call),
            Block::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorBlock> {
        match self {
            Block::Error(err) => Some(err),
            Block::Call(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Block::Error(_))
    }
}

impl From<CallBlock> for Block {
    fn from(call: CallBlock) -> Self {
        Block::Call(call)
    }
}

impl From<ErrorBlock> for Block {
    fn from(err: ErrorBlock) -> Self {
        Block::Error(err)
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.type_tag())?;
        match self {
            Block::Call(call) => {
                map.serialize_entry("params", &call.params)?;
            }
            Block::Error(err) => {
                map.serialize_entry("code", &err.code)?;
                map.serialize_entry("message", &err.message)?;
                map.serialize_entry("hint", &err.hint)?;
            }
        }
        if let Some(location) = self.location() {
            map.serialize_entry("location", &location)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_calls_with_typed_params() {
        let mut params = Params::new();
        params.insert("text".into(), "T".into());
        params.insert("rank".into(), ParamValue::Integer(2));
        let block = Block::Call(CallBlock::new("head", params, Some(Location::line(3))));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "head",
                "params": { "rank": 2, "text": "T" },
                "location": { "line": 3 }
            })
        );
    }

    #[test]
    fn serializes_errors_with_code_names() {
        let block = Block::Error(ErrorBlock::new(ErrorCode::UnclosedParen, "unclosed function call", None));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "UNCLOSED_PAREN");
        assert!(json.get("location").is_none());
    }

    #[test]
    fn kinds_round_trip_through_tags() {
        for kind in [
            BlockKind::Head,
            BlockKind::Paragraph,
            BlockKind::Code,
            BlockKind::List,
            BlockKind::Image,
            BlockKind::Table,
        ] {
            assert_eq!(BlockKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(BlockKind::from_tag("error"), None);
    }
}
