//! Isolated evaluation of manifest scripts.

mod sandbox;
mod worker;

pub use sandbox::{EvalError, SandboxOptions, evaluate_manifest};
pub use worker::EvaluatorHandle;
