//! Terminal rendering of route cards.

use std::fmt::Write;

use owo_colors::{OwoColorize, Stream};

use super::notices::{Notice, NoticeKind};
use super::state::AppState;
use crate::extract::{FileKind, RouteTable};

/// `Discovered N Routes`, or a hint when nothing has been parsed yet.
pub fn status_line(state: &AppState) -> String {
  let mut line = match state.route_count() {
    0 => "No routes parsed yet".to_string(),
    1 => "Discovered 1 Route".to_string(),
    count => format!("Discovered {count} Routes"),
  };
  if let Some(build_id) = &state.build_id {
    let _ = write!(line, " (build {build_id})");
  }
  if !state.filter.trim().is_empty() {
    let shown = state.routes.filter(&state.filter).len();
    let _ = write!(line, ", {shown} matching \"{}\"", state.filter.trim());
  }
  line
}

/// One card per route: header, JS/CSS counts and the file list.
pub fn route_card(table: &RouteTable, route: &str) -> String {
  let files = table.files(route).unwrap_or_default();
  let scripts = files.iter().filter(|path| FileKind::of(path) == FileKind::Script).count();
  let styles = files.iter().filter(|path| FileKind::of(path) == FileKind::Stylesheet).count();

  let mut card = format!(
    "{} {}\n",
    route.if_supports_color(Stream::Stdout, |text| text.bold()),
    format!("[{scripts} js, {styles} css]").if_supports_color(Stream::Stdout, |text| text.dimmed()),
  );
  for path in files {
    let marker = "└─".if_supports_color(Stream::Stdout, |text| text.dimmed());
    let _ = match FileKind::of(path) {
      FileKind::Script => writeln!(card, "  {marker} {}", path.if_supports_color(Stream::Stdout, |text| text.yellow())),
      FileKind::Stylesheet => writeln!(card, "  {marker} {}", path.if_supports_color(Stream::Stdout, |text| text.cyan())),
      FileKind::Other => writeln!(card, "  {marker} {path}"),
    };
  }
  card
}

/// Status line followed by a card for every route passing the current filter.
pub fn render_routes(state: &AppState) -> String {
  let mut out = status_line(state);
  out.push('\n');
  for route in state.routes.filter(&state.filter) {
    out.push('\n');
    out.push_str(&route_card(&state.routes, route));
  }
  out
}

/// Notice text, coloured by kind.
pub fn render_notice(notice: &Notice) -> String {
  match notice.kind {
    NoticeKind::Success => format!(
      "{} {}",
      "✓".if_supports_color(Stream::Stderr, |text| text.green()),
      notice.message
    ),
    NoticeKind::Error => format!(
      "{} {}",
      "✗".if_supports_color(Stream::Stderr, |text| text.red()),
      notice.message
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::RouteRules;
  use crate::models::Manifest;
  use serde_json::{Value, json};

  fn state(value: Value) -> AppState {
    let Value::Object(map) = value else {
      panic!("expected an object");
    };
    let manifest = Manifest(map);
    let routes = RouteTable::from_manifest(&manifest, &RouteRules::default());
    let mut state = AppState::default();
    state.set_results(manifest, routes);
    state
  }

  #[test]
  fn status_line_counts_routes() {
    assert_eq!(status_line(&AppState::default()), "No routes parsed yet");
    assert_eq!(status_line(&state(json!({ "/a": [] }))), "Discovered 1 Route");

    let mut many = state(json!({ "/a": [], "/b": [], "/blog": [] }));
    many.build_id = Some("abc".into());
    many.filter = "b".into();
    assert_eq!(status_line(&many), "Discovered 3 Routes (build abc), 2 matching \"b\"");
  }

  #[test]
  fn cards_list_files_in_manifest_order() {
    let state = state(json!({ "/a": ["z.js", "a.css", "m.txt"] }));
    let card = route_card(&state.routes, "/a");
    assert!(card.contains("/a"));
    assert!(card.contains("[1 js, 1 css]"));
    let z = card.find("z.js").unwrap();
    let a = card.find("a.css").unwrap();
    let m = card.find("m.txt").unwrap();
    assert!(z < a && a < m);
    assert_eq!(card.matches("└─").count(), 3);
  }

  #[test]
  fn render_applies_the_filter() {
    let mut state = state(json!({ "/about": ["a.js"], "/blog": ["b.js"] }));
    state.filter = "BLO".into();
    let rendered = render_routes(&state);
    assert!(rendered.contains("b.js"));
    assert!(!rendered.contains("a.js"));
  }
}
