//! # Thistle - an embeddable scripting language interpreter
//!
//! Thistle is a small, dynamically typed scripting language with a playful
//! surface syntax (`take`, `whether`/`further`/`ifnot`, `StartCycle`,
//! `AsLongAs`, `Method`). This crate implements the complete front-to-back
//! pipeline - lexer, parser, and tree-walking evaluator - as a library that a
//! host program can embed.
//!
//! # Quick example
//!
//! ```
//! use thistle::run;
//!
//! let result = run("script.thistle", "take x = 2 + 3 * 4\nx");
//! assert!(result.is_ok());
//! ```
//!
//! A host hands the interpreter a source buffer and a filename label and
//! gets back either the program's final value or a structured diagnostic -
//! never an untagged panic or exception.

mod ast;
mod builtins;
mod context;
mod engine;
mod error;
mod parse;
mod token;
mod value;

pub use context::{Context, ContextId, Contexts, SymbolTable, TableId};
pub use engine::Engine;
pub use error::ThistleError;
pub use token::{Position, Span};
pub use value::{BuiltInData, DictionaryData, FunctionData, Number, Value};

/// An identifier or keyword string. Most are short and ASCII, so
/// [`SmartString`](https://crates.io/crates/smartstring) stores them inline
/// without heap allocation.
pub(crate) type Identifier = smartstring::SmartString<smartstring::Compact>;

/// The machine-sized signed integer type backing [`Value::Number`]'s integer
/// variant.
pub type Int = i64;

/// The double-precision floating point type backing [`Value::Number`]'s
/// float variant.
pub type Float = f64;

/// Run a Thistle program to completion.
///
/// `filename` is a label used only for diagnostics; `source` is the full
/// program text. Returns the value the top-level `statements` node evaluated
/// to - structurally a [`Value::List`] holding the result of every top-level
/// expression - or the first lexical, syntactic, or runtime error
/// encountered.
pub fn run(filename: &str, source: &str) -> Result<Value, ThistleError> {
    Engine::new().run(filename, source)
}
