//! Data structures exchanged between the front ends, the evaluator and the extractor.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Object recovered from a build manifest script, keys in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(pub Map<String, Value>);

impl Manifest {
  /// Value stored under `key`.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  /// Top-level entries in manifest order.
  pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  /// Whether the manifest has no keys at all.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl From<Map<String, Value>> for Manifest {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

/// Request sent to the evaluator worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
  /// Raw manifest script text.
  pub content: String,
}

/// Single response delivered for every [`WorkerRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResponse {
  /// The script evaluated to an object.
  Parsed {
    /// Recovered manifest.
    manifest: Manifest,
  },
  /// Evaluation failed; `error` is the message shown to the user.
  Failed {
    /// Failure text.
    error: String,
  },
}

impl WorkerResponse {
  /// Failure response from anything displayable.
  pub fn failed(error: impl ToString) -> Self {
    Self::Failed {
      error: error.to_string(),
    }
  }

  /// Whether evaluation succeeded.
  pub fn is_ok(&self) -> bool {
    matches!(self, Self::Parsed { .. })
  }
}

// `{ "ok": true, "manifest": {...} }` or `{ "ok": false, "error": "..." }`
impl Serialize for WorkerResponse {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("WorkerResponse", 2)?;
    match self {
      Self::Parsed { manifest } => {
        state.serialize_field("ok", &true)?;
        state.serialize_field("manifest", manifest)?;
      }
      Self::Failed { error } => {
        state.serialize_field("ok", &false)?;
        state.serialize_field("error", error)?;
      }
    }
    state.end()
  }
}
