use thiserror::Error;

/// Failure raised while parsing or running a manifest script.
///
/// Messages carry the same error class prefixes a browser console would print, so that text
/// surfaced to the user reads like the failure of the original script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
  /// The source text is not valid in the supported subset.
  #[error("SyntaxError: {message} (line {line}, column {column})")]
  Syntax {
    /// Parser explanation of the failure.
    message: String,
    /// One-based line of the offending input.
    line: usize,
    /// One-based column of the offending input.
    column: usize,
  },
  /// Read of a binding that exists in no enclosing scope.
  #[error("ReferenceError: {0} is not defined")]
  Reference(String),
  /// Operation applied to a value of the wrong kind.
  #[error("TypeError: {0}")]
  Type(String),
  /// Resource limit exceeded, such as the call depth.
  #[error("RangeError: {0}")]
  Range(String),
}
