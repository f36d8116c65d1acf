//! Inspector configuration describing how manifests are evaluated and presented.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::evaluator::SandboxOptions;
use crate::extract::RouteRules;

/// File name searched for in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "next-manifest.json";

/// Discoverable configuration with every field defaulted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
  /// Identifier rebound to a fresh object while the manifest script runs.
  pub binding: String,
  /// Property read off the binding once the script has finished.
  pub export_property: String,
  /// Top-level keys that are never treated as routes.
  pub reserved_keys: Vec<String>,
  /// Keys starting with this prefix are internal and never treated as routes.
  pub internal_prefix: String,
  /// Maximum nesting of script function calls.
  pub max_call_depth: usize,
  /// How long a notice stays visible, in milliseconds.
  pub notice_millis: u64,
  /// Overall timeout of a manifest fetch, in seconds.
  pub fetch_timeout_secs: u64,
  /// `User-Agent` header sent when fetching.
  pub user_agent: String,
}

impl Default for InspectorConfig {
  fn default() -> Self {
    Self {
      binding: "self".into(),
      export_property: "__BUILD_MANIFEST".into(),
      reserved_keys: vec!["sortedPages".into(), "__rewrites".into()],
      internal_prefix: "__".into(),
      max_call_depth: 256,
      notice_millis: 2500,
      fetch_timeout_secs: 30,
      user_agent: concat!("next-manifest/", env!("CARGO_PKG_VERSION")).into(),
    }
  }
}

/// Errors raised when an explicitly requested configuration file cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl InspectorConfig {
  /// Load `next-manifest.json` from `dir`.
  ///
  /// A missing file yields the defaults. A file that exists but cannot be read or parsed is
  /// reported with a warning and the defaults are used instead.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if !candidate.is_file() {
      return Self::default();
    }
    Self::from_path(&candidate).unwrap_or_else(|error| {
      warn!(%error, "ignoring configuration file");
      Self::default()
    })
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Options handed to the evaluator.
  pub fn sandbox_options(&self) -> SandboxOptions {
    SandboxOptions {
      binding: self.binding.clone(),
      export_property: self.export_property.clone(),
      max_call_depth: self.max_call_depth,
    }
  }

  /// Rules deciding which manifest keys are routes.
  pub fn route_rules(&self) -> RouteRules {
    RouteRules::new(self.reserved_keys.iter().cloned(), self.internal_prefix.clone())
  }

  /// Notice display window.
  pub fn notice_window(&self) -> Duration {
    Duration::from_millis(self.notice_millis)
  }

  /// Fetch timeout.
  pub fn fetch_timeout(&self) -> Duration {
    Duration::from_secs(self.fetch_timeout_secs)
  }
}
