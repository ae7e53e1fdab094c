//! Provides for the parsing and compilation of a regex expression into it's
//! corresponding runtime program.
//!
//! # Example
//!
//! ```rust
//! // Parsing and compilation of a regular expression into a runnable program is
//! // accomplished by two functions exposed in the `tiny_regex_compiler` crate.
//! use tiny_regex_compiler::{compile, parse};
//!
//! // Evaluating a given input against a program is accomplished via the
//! // functions exposed in the `tiny_regex_runtime` crate.
//! use tiny_regex_runtime::{find, run, search, Match};
//!
//! // A standard regex pattern to be parsed.
//! let pattern = "l+o";
//!
//! // Using the above `compile` and `parse` methods, the regular expresion is
//! // parsed into an evaluatable program.
//! let program = parse(pattern)
//!     .map_err(|e| e.to_string())
//!     .and_then(|ast| compile(&ast).map_err(|e| e.to_string()))
//!     .expect("failed to parse or compile");
//!
//! let input = "hello world";
//!
//! // `run` checks for a match beginning exactly at an offset, while `search`
//! // returns the first offset at which a match begins.
//! assert!(!run(&program, input, 0));
//! assert!(run(&program, input, 2));
//! assert_eq!(Some(2), search(&program, input));
//!
//! // `find` additionally reports where the leftmost match ends. In this case
//! // the span covers `llo`.
//! assert_eq!(Some(Match::new(2, 5)), find(&program, input));
//! ```

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod ir;
pub mod parser;

pub use bytecode::to_binary;
pub use compiler::{compile, lower, resolve, CompileErr, CompileErrKind};
pub use parser::{parse, ParseErr, ParseErrKind, MAX_NESTING_DEPTH};
