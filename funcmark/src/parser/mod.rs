mod call;
pub mod params;
pub mod scanner;
pub mod tokenizer;

use log::{debug, trace};

pub use params::{ParamError, decompose_params};
pub use scanner::{is_single_line_complete, paren_delta};
pub use tokenizer::{LineKind, LineToken, tokenize};

use crate::block::{Block, CallBlock, ErrorBlock, ErrorCode, Location, Params};
use crate::schema::{Schema, SchemaRegistry};
use crate::template;

/// Parser entry point. Holds only a reference to its registry, so one
/// parser can serve any number of documents.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Parser { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    pub fn schemas(&self) -> &'r [Schema] {
        self.registry.schemas()
    }

    pub fn generate_template(&self, name: &str) -> Option<String> {
        template::generate_template(self.registry, name)
    }

    /// Parse a document into blocks, in source order. Malformed constructs
    /// become error blocks in place; this never fails.
    pub fn parse(&self, input: &str) -> Vec<Block> {
        let tokens = tokenize(input);
        let mut state = ParseState::new(self.registry);
        for token in &tokens {
            state.feed(token);
        }
        let blocks = state.finish();
        debug!(
            "parsed {} line(s) into {} block(s), {} error(s)",
            tokens.len(),
            blocks.len(),
            blocks.iter().filter(|b| b.is_error()).count()
        );
        blocks
    }
}

/// A call whose closing paren hasn't been seen yet.
struct PendingCall {
    text: String,
    depth: i64,
    start: Location,
}

impl PendingCall {
    fn push_line(&mut self, raw: &str) {
        self.text.push('\n');
        self.text.push_str(raw);
        self.depth += paren_delta(raw);
    }
}

struct ParseState<'r> {
    registry: &'r SchemaRegistry,
    pending: Option<PendingCall>,
    blocks: Vec<Block>,
}

impl<'r> ParseState<'r> {
    fn new(registry: &'r SchemaRegistry) -> Self {
        ParseState {
            registry,
            pending: None,
            blocks: Vec::new(),
        }
    }

    fn feed(&mut self, token: &LineToken<'_>) {
        if let Some(mut pending) = self.pending.take() {
            // Raw lines keep their indentation, which matters inside code values.
            pending.push_line(token.raw);
            if pending.depth <= 0 {
                trace!("call from line {} closed at line {}", pending.start.line, token.line);
                self.emit_call(&pending.text, pending.start);
            } else {
                self.pending = Some(pending);
            }
            return;
        }

        let line = token.trimmed();
        let location = Location::line(token.line);
        match token.kind {
            LineKind::Blank => {}
            LineKind::Text => {
                let mut params = Params::new();
                params.insert("text".to_string(), line.into());
                self.blocks
                    .push(CallBlock::new("paragraph", params, Some(location)).into());
            }
            LineKind::CallStart if is_single_line_complete(line) => self.emit_call(line, location),
            LineKind::CallStart if line.contains('(') => {
                trace!("call at line {} continues past its first line", token.line);
                self.pending = Some(PendingCall {
                    text: line.to_string(),
                    depth: paren_delta(line),
                    start: location,
                });
            }
            LineKind::CallStart => {
                self.blocks.push(
                    ErrorBlock::new(ErrorCode::SyntaxError, format!("syntax error: {}", line), Some(location))
                        .into(),
                );
            }
        }
    }

    fn emit_call(&mut self, text: &str, location: Location) {
        self.blocks.push(call::build_block(text, location, self.registry));
    }

    fn finish(mut self) -> Vec<Block> {
        if let Some(pending) = self.pending.take().filter(|p| !p.text.is_empty()) {
            self.blocks.push(
                ErrorBlock::new(ErrorCode::UnclosedParen, "unclosed function call", Some(pending.start))
                    .into(),
            );
        }
        self.blocks
    }
}
