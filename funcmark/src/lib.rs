//! Parser for **function-call markup**: flat text where each line is either
//! a plain paragraph or a call such as `@head(text="Title", rank=2)`, and a
//! call may span several lines until its parentheses balance.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`schema`] | `Schema`, `SchemaRegistry`, schema files |
//! | [`parser`] | `Parser`, line tokenizer, call-boundary scanner, parameter decomposer |
//! | [`block`] | `Block`, `ErrorBlock`, list/table value decoding |
//! | [`template`] | call skeletons for editors |
//! | [`render`] | HTML output and the function reference document |
//!
//! Parsing never fails: malformed constructs come back as error blocks in
//! source order, next to the blocks that parsed fine.

pub mod block;
pub mod parser;
pub mod render;
pub mod schema;
pub mod template;

pub use block::{Block, BlockKind, CallBlock, ErrorBlock, ErrorCode, Location, ParamValue, Params};
pub use parser::Parser;
pub use schema::{RegistryError, Schema, SchemaRegistry};

/// Parse with the built-in functions.
pub fn parse(input: &str) -> Vec<Block> {
    let registry = SchemaRegistry::builtin();
    Parser::new(&registry).parse(input)
}
