//! Runs a manifest script against a shadowed pseudo-global and reads back the exported object.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::debug;

use crate::models::Manifest;
use crate::script::{ConversionError, Interpreter, ScriptError, ScriptOutcome, Value, parse_program, to_json};

/// Names the evaluator binds and reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxOptions {
  /// Identifier rebound to a fresh empty object, `self` for Next.js manifests.
  pub binding: String,
  /// Property read off the binding after the script ran.
  pub export_property: String,
  /// Maximum nesting of script function calls.
  pub max_call_depth: usize,
}

impl Default for SandboxOptions {
  fn default() -> Self {
    Self {
      binding: "self".into(),
      export_property: "__BUILD_MANIFEST".into(),
      max_call_depth: 256,
    }
  }
}

/// Reasons a manifest script did not yield a manifest object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
  /// The script failed to parse or threw while running.
  #[error(transparent)]
  Script(#[from] ScriptError),
  /// The exported value is missing or not an object.
  #[error("Manifest did not evaluate to an object.")]
  NotAnObject,
  /// The exported object holds values that have no JSON form.
  #[error(transparent)]
  Conversion(#[from] ConversionError),
}

/// Evaluate `content` in a fresh isolated context and return the exported manifest.
///
/// The script runs as the body of a function whose only parameter is `options.binding`,
/// bound to an empty object. Afterwards `<binding>.<export_property>` is resolved in that
/// function scope, so a script that rebinds the name itself is honoured. A top-level
/// `return` ends the script and its value is used as the result instead.
pub fn evaluate_manifest(content: &str, options: &SandboxOptions) -> Result<Manifest, EvalError> {
  let program = parse_program(content)?;
  debug!(statements = program.body.len(), "parsed manifest script");

  let interpreter = Interpreter::new(options.max_call_depth);
  let sandbox = interpreter.new_object();
  let exported = match interpreter.run_script(&program, &options.binding, sandbox)? {
    ScriptOutcome::Returned(value) => value,
    ScriptOutcome::Completed(scope) => {
      let binding = scope
        .lookup(&options.binding)
        .ok_or_else(|| ScriptError::Reference(options.binding.clone()))?;
      interpreter.get_property(&binding, &options.export_property)?
    }
  };

  if !matches!(exported, Value::Object(_) | Value::Array(_)) {
    return Err(EvalError::NotAnObject);
  }

  // Conversion has to finish before the interpreter clears its heap on drop.
  let manifest = match to_json(&exported)? {
    JsonValue::Object(map) => map,
    JsonValue::Array(items) => items
      .into_iter()
      .enumerate()
      .map(|(index, item)| (index.to_string(), item))
      .collect::<Map<_, _>>(),
    _ => return Err(EvalError::NotAnObject),
  };
  Ok(Manifest(manifest))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn evaluate(content: &str) -> Result<Manifest, EvalError> {
    evaluate_manifest(content, &SandboxOptions::default())
  }

  #[test]
  fn reads_the_assigned_manifest() {
    let manifest = evaluate(r#"self.__BUILD_MANIFEST = { "/b": ["b.js"], "/a": ["a.js"] };"#).unwrap();
    assert_eq!(serde_json::to_value(&manifest).unwrap(), json!({ "/b": ["b.js"], "/a": ["a.js"] }));
  }

  #[test]
  fn evaluates_minified_next_output() {
    let content = concat!(
      r#"self.__BUILD_MANIFEST=function(s,c,a){return{__rewrites:{afterFiles:[],beforeFiles:[],fallback:[]},"#,
      r#""/":[s,"static/chunks/pages/index-1.js"],"/about":[s,c,a,"static/chunks/pages/about-2.js"],"#,
      r#"sortedPages:["/","/_app","/about"]}}("static/chunks/shared.js","static/css/a.css","static/chunks/x.js"),"#,
      r#"self.__BUILD_MANIFEST_CB&&self.__BUILD_MANIFEST_CB();"#
    );
    let manifest = evaluate(content).unwrap();
    assert_eq!(
      manifest.get("/about"),
      Some(&json!([
        "static/chunks/shared.js",
        "static/css/a.css",
        "static/chunks/x.js",
        "static/chunks/pages/about-2.js"
      ]))
    );
    assert_eq!(manifest.get("sortedPages"), Some(&json!(["/", "/_app", "/about"])));
  }

  #[test]
  fn honours_a_top_level_return() {
    let manifest = evaluate(r#"return { "/x": ["x.js"] }"#).unwrap();
    assert_eq!(manifest.get("/x"), Some(&json!(["x.js"])));
  }

  #[test]
  fn honours_a_rebound_binding() {
    let manifest = evaluate(r#"var self = { __BUILD_MANIFEST: { "/r": [] } }"#).unwrap();
    assert_eq!(manifest.get("/r"), Some(&json!([])));
  }

  #[test]
  fn rejects_missing_or_primitive_exports() {
    assert_eq!(evaluate("var x = 1;"), Err(EvalError::NotAnObject));
    assert_eq!(evaluate("self.__BUILD_MANIFEST = 'text'"), Err(EvalError::NotAnObject));
    assert_eq!(evaluate("self.__BUILD_MANIFEST = null"), Err(EvalError::NotAnObject));
    assert_eq!(
      EvalError::NotAnObject.to_string(),
      "Manifest did not evaluate to an object."
    );
  }

  #[test]
  fn arrays_count_as_objects() {
    let manifest = evaluate("self.__BUILD_MANIFEST = ['a.js']").unwrap();
    assert_eq!(manifest.get("0"), Some(&json!("a.js")));
  }

  #[test]
  fn surfaces_script_errors_verbatim() {
    let error = evaluate("self.__BUILD_MANIFEST = missing").unwrap_err();
    assert_eq!(error.to_string(), "ReferenceError: missing is not defined");

    let error = evaluate("self.__BUILD_MANIFEST = {").unwrap_err();
    assert!(error.to_string().starts_with("SyntaxError: "));
  }

  #[test]
  fn rejects_functions_in_the_manifest() {
    let error = evaluate("self.__BUILD_MANIFEST = { cb: function(){} }").unwrap_err();
    assert_eq!(error, EvalError::Conversion(ConversionError::Function));
  }

  #[test]
  fn uses_a_custom_binding() {
    let options = SandboxOptions {
      binding: "window".into(),
      export_property: "MANIFEST".into(),
      ..SandboxOptions::default()
    };
    let manifest = evaluate_manifest(r#"window.MANIFEST = { "/w": [] }"#, &options).unwrap();
    assert_eq!(manifest.get("/w"), Some(&json!([])));
  }

  #[test]
  fn far_array_writes_fail_as_range_errors() {
    for content in [
      "var a = []; a[4294967294] = 'x.js'; self.__BUILD_MANIFEST = { '/a': ['a.js'] }",
      "var a = []; a.length = 4294967295; self.__BUILD_MANIFEST = { '/a': ['a.js'] }",
    ] {
      let error = evaluate(content).unwrap_err();
      assert!(
        error.to_string().starts_with("RangeError: "),
        "unexpected error for {content}: {error}"
      );
    }
  }

  #[test]
  fn reports_circular_manifests_without_blaming_the_browser() {
    let error = evaluate("var m = { '/a': [] }; m.self = m; self.__BUILD_MANIFEST = m").unwrap_err();
    assert_eq!(error, EvalError::Conversion(ConversionError::Circular));
    assert_eq!(
      error.to_string(),
      "manifest contains a circular reference, which has no JSON form"
    );
  }
}
