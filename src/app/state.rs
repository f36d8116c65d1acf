//! Explicit presentation state, replaced wholesale per request.

use crate::extract::RouteTable;
use crate::models::Manifest;

/// Everything the front ends display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
  /// Raw manifest source last pasted, loaded or fetched.
  pub input: String,
  /// URL of the last fetch request.
  pub url: String,
  /// Build id taken from the fetched URL, when it had the Next.js shape.
  pub build_id: Option<String>,
  /// Manifest of the last successful evaluation.
  pub manifest: Option<Manifest>,
  /// Routes derived from `manifest`.
  pub routes: RouteTable,
  /// Current route filter text.
  pub filter: String,
  /// Whether a fetch is in flight.
  pub fetching: bool,
}

impl AppState {
  /// Drop the evaluated results ahead of a new parse.
  pub fn reset_results(&mut self) {
    self.manifest = None;
    self.routes = RouteTable::default();
  }

  /// Replace the evaluated results.
  pub fn set_results(&mut self, manifest: Manifest, routes: RouteTable) {
    self.manifest = Some(manifest);
    self.routes = routes;
  }

  /// Number of routes currently shown.
  pub fn route_count(&self) -> usize {
    self.routes.len()
  }
}
