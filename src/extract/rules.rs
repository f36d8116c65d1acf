//! Rules deciding which manifest keys are routes.

use std::collections::BTreeSet;

use serde_json::Value;

/// Trait describing which manifest entries count as routes.
pub trait RouteInclusion {
  /// Returns `true` when `key` (holding `value`) should be listed as a route.
  fn is_route(&self, key: &str, value: &Value) -> bool;
}

/// Reserved keys plus an internal-prefix marker, both excluded from route enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRules {
  reserved: BTreeSet<String>,
  internal_prefix: String,
}

impl Default for RouteRules {
  fn default() -> Self {
    Self::new(["sortedPages".to_string(), "__rewrites".to_string()], "__")
  }
}

impl RouteRules {
  /// Build rules from a list of reserved keys and an internal prefix.
  ///
  /// Reserved keys are trimmed and empty entries discarded. An empty prefix disables the
  /// internal-key check instead of excluding every key.
  pub fn new(
    reserved: impl IntoIterator<Item = String>,
    internal_prefix: impl Into<String>,
  ) -> Self {
    Self {
      reserved: normalise_keys(reserved),
      internal_prefix: internal_prefix.into(),
    }
  }

  /// Whether `key` names a reserved or internal entry.
  pub fn is_excluded(&self, key: &str) -> bool {
    if self.reserved.contains(key) {
      return true;
    }
    !self.internal_prefix.is_empty() && key.starts_with(&self.internal_prefix)
  }
}

impl RouteInclusion for RouteRules {
  fn is_route(&self, key: &str, value: &Value) -> bool {
    value.is_array() && !self.is_excluded(key)
  }
}

fn normalise_keys(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
  values
    .into_iter()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
    .collect()
}
