//! Restricted literal notation accepted from model output.
//!
//! A superset of JSON: single-quoted strings, `True`/`False`/`None`, trailing
//! commas, bare-identifier mapping keys and keyword-only calls such as
//! `dict(command="spawn_actor", params=dict(name="Lamp"))`. The parser builds
//! `serde_json::Value`s and never evaluates anything.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{LiteralError, Span};
pub use parser::{parse, MAX_DEPTH};
