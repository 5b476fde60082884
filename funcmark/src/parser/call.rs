use crate::block::{Block, CallBlock, ErrorBlock, ErrorCode, Location, Params};
use crate::parser::params::{ParamError, decompose_params};
use crate::schema::{Schema, SchemaRegistry, is_word_char};

#[derive(Debug, thiserror::Error)]
enum BuildError {
    #[error("unrecognized function format")]
    UnrecognizedFormat,
    #[error("unsupported function: {0}")]
    UnknownFunction(String),
    #[error("parameter format error")]
    ParamFormat(Option<ParamError>),
}

impl From<ParamError> for BuildError {
    fn from(err: ParamError) -> Self {
        BuildError::ParamFormat(Some(err))
    }
}

impl BuildError {
    fn into_error_block(self, location: Location, registry: &SchemaRegistry) -> ErrorBlock {
        let message = self.to_string();
        match self {
            BuildError::UnrecognizedFormat => {
                ErrorBlock::new(ErrorCode::SyntaxError, message, Some(location))
            }
            BuildError::UnknownFunction(_) => {
                let known = registry.names().collect::<Vec<_>>().join(", ");
                ErrorBlock::new(ErrorCode::UnknownFunction, message, Some(location))
                    .with_hint(format!("registered functions: {}", known))
            }
            BuildError::ParamFormat(detail) => {
                let block = ErrorBlock::new(ErrorCode::ParamFormatError, message, Some(location));
                match detail {
                    Some(detail) => {
                        let hint = format!("{}; {}", detail, block.hint);
                        block.with_hint(hint)
                    }
                    None => block,
                }
            }
        }
    }
}

/// Build one block from the full text of a call. Every failure becomes an
/// error block at `location`.
pub(crate) fn build_block(text: &str, location: Location, registry: &SchemaRegistry) -> Block {
    match build_call(text, location, registry) {
        Ok(call) => Block::Call(call),
        Err(err) => Block::Error(err.into_error_block(location, registry)),
    }
}

fn build_call(
    text: &str,
    location: Location,
    registry: &SchemaRegistry,
) -> Result<CallBlock, BuildError> {
    let (name, open) = split_call_head(text).ok_or(BuildError::UnrecognizedFormat)?;
    let schema = registry
        .get(name)
        .ok_or_else(|| BuildError::UnknownFunction(name.to_string()))?;
    let close = text
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or(BuildError::ParamFormat(None))?;
    let extracted = decompose_params(&text[open + 1..close])?;
    Ok(CallBlock::new(
        schema.name.clone(),
        validate_params(schema, extracted),
        Some(location),
    ))
}

/// Find `@name` followed by optional whitespace and `(` at the start of the
/// call. Returns the name and the byte offset of the `(`.
fn split_call_head(text: &str) -> Option<(&str, usize)> {
    let rest = text.strip_prefix('@')?;
    let name_len = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let after = &rest[name_len..];
    let gap = after.len() - after.trim_start().len();
    if !after[gap..].starts_with('(') {
        return None;
    }
    Some((&rest[..name_len], 1 + name_len + gap))
}

/// Start from the schema's defaults and overlay declared keys; undeclared
/// keys are dropped.
fn validate_params(schema: &Schema, extracted: Params) -> Params {
    let mut params = schema.defaults.clone();
    params.extend(extracted.into_iter().filter(|(key, _)| schema.declares(key)));
    params
}
