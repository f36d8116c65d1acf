//! Route extraction from an evaluated manifest.
//!
//! A route is a top-level manifest key whose value is an array and which is neither reserved
//! nor internal. Routes are listed in code-point order, and each keeps its own file list in
//! the order the manifest gave it.

mod files;
mod rules;

use std::collections::BTreeMap;

use crate::models::Manifest;

pub use files::{FileKind, FileSelection, aggregate_files_with_suffix, files_with_suffix, route_files};
pub use rules::{RouteInclusion, RouteRules};

/// Sorted routes of a manifest and the files behind each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
  files: BTreeMap<String, Vec<String>>,
}

impl RouteTable {
  /// Derive the route table from `manifest`. The result depends only on the manifest's
  /// contents, never on its key order.
  pub fn from_manifest(manifest: &Manifest, rules: &impl RouteInclusion) -> Self {
    let files = manifest
      .entries()
      .filter(|(key, value)| rules.is_route(key, value))
      .map(|(key, value)| (key.clone(), route_files(value)))
      .collect();
    Self { files }
  }

  /// Route names in code-point order.
  pub fn routes(&self) -> impl Iterator<Item = &str> {
    self.files.keys().map(String::as_str)
  }

  /// Number of routes.
  pub fn len(&self) -> usize {
    self.files.len()
  }

  /// Whether no route was found, the "no routes found" condition.
  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Files of `route` in manifest order.
  pub fn files(&self, route: &str) -> Option<&[String]> {
    self.files.get(route).map(Vec::as_slice)
  }

  /// Files of `route` matching `selection`, in manifest order.
  pub fn select(&self, route: &str, selection: FileSelection) -> Vec<&str> {
    self
      .files(route)
      .unwrap_or_default()
      .iter()
      .map(String::as_str)
      .filter(|path| selection.matches(path))
      .collect()
  }

  /// Every file ending in `suffix` across all routes, deduplicated and sorted.
  pub fn aggregate_with_suffix(&self, suffix: &str) -> Vec<String> {
    aggregate_files_with_suffix(self.files.values().map(Vec::as_slice), suffix)
  }

  /// Routes containing `query` case-insensitively. A blank query keeps every route.
  pub fn filter(&self, query: &str) -> Vec<&str> {
    let needle = query.trim().to_lowercase();
    self
      .routes()
      .filter(|route| needle.is_empty() || route.to_lowercase().contains(&needle))
      .collect()
  }
}
