//! Embedded interpreter for the JavaScript subset found in Next.js build manifests.
//!
//! The manifest is a small script that assigns an object literal to `self.__BUILD_MANIFEST`,
//! usually wrapped in an immediately invoked function that receives shared strings and arrays
//! as arguments. [`parse_program`] turns the source into a syntax tree and an [`Interpreter`]
//! runs it against a private global scope.

mod error;
mod interpreter;
mod parser;
mod syntax;
mod value;

pub use error::ScriptError;
pub use interpreter::{Interpreter, MAX_ARRAY_GROWTH, MAX_EVALUATION_DEPTH, Scope, ScriptOutcome};
pub use parser::{MAX_NESTING_DEPTH, parse_program};
pub use syntax::Program;
pub use value::{ConversionError, MAX_JSON_DEPTH, MAX_JSON_SIZE, MAX_STRING_LENGTH, Value, to_json};
