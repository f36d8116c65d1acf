//! Suffix-based file filters over route file lists.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Classification of a manifest file path by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
  /// `.js`
  Script,
  /// `.css`
  Stylesheet,
  /// Anything else.
  Other,
}

impl FileKind {
  /// Classify `path` by suffix.
  pub fn of(path: &str) -> Self {
    if path.ends_with(".js") {
      Self::Script
    } else if path.ends_with(".css") {
      Self::Stylesheet
    } else {
      Self::Other
    }
  }

  /// Suffix matched by this kind, `None` for [`FileKind::Other`].
  pub fn suffix(self) -> Option<&'static str> {
    match self {
      Self::Script => Some(".js"),
      Self::Stylesheet => Some(".css"),
      Self::Other => None,
    }
  }
}

/// Which files of a single route a copy action takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileSelection {
  /// Every file of the route.
  #[default]
  All,
  /// Only `.js` files.
  Scripts,
  /// Only `.css` files.
  Stylesheets,
}

impl FileSelection {
  /// Whether `path` belongs to this selection.
  pub fn matches(self, path: &str) -> bool {
    match self {
      Self::All => true,
      Self::Scripts => FileKind::of(path) == FileKind::Script,
      Self::Stylesheets => FileKind::of(path) == FileKind::Stylesheet,
    }
  }
}

impl fmt::Display for FileSelection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::All => "all",
      Self::Scripts => "js",
      Self::Stylesheets => "css",
    })
  }
}

impl FromStr for FileSelection {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_ascii_lowercase().as_str() {
      "all" | "files" | "" => Ok(Self::All),
      "js" | ".js" => Ok(Self::Scripts),
      "css" | ".css" => Ok(Self::Stylesheets),
      other => Err(format!("unknown file selection '{other}' (expected all, js or css)")),
    }
  }
}

/// String entries of a route's file list in original order. Non-string entries are skipped.
pub fn route_files(value: &Value) -> Vec<String> {
  value
    .as_array()
    .map(|items| {
      items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default()
}

/// Files ending in `suffix`, in original order and without deduplication.
pub fn files_with_suffix<'a>(files: &'a [String], suffix: &str) -> Vec<&'a str> {
  files
    .iter()
    .map(String::as_str)
    .filter(|path| path.ends_with(suffix))
    .collect()
}

/// Deduplicated, lexicographically sorted files ending in `suffix` across all `lists`.
pub fn aggregate_files_with_suffix<'a>(
  lists: impl IntoIterator<Item = &'a [String]>,
  suffix: &str,
) -> Vec<String> {
  let files: BTreeSet<&str> = lists
    .into_iter()
    .flat_map(|files| files_with_suffix(files, suffix))
    .collect();
  files.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn classifies_by_suffix() {
    assert_eq!(FileKind::of("static/chunks/main.js"), FileKind::Script);
    assert_eq!(FileKind::of("static/css/app.css"), FileKind::Stylesheet);
    assert_eq!(FileKind::of("static/chunks/main.js.map"), FileKind::Other);
    assert_eq!(FileKind::of("static/chunks/MAIN.JS"), FileKind::Other);
    assert_eq!(FileKind::Script.suffix(), Some(".js"));
    assert_eq!(FileKind::Other.suffix(), None);
  }

  fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
  }

  #[test]
  fn skips_non_string_entries() {
    let files = json!(["b.js", 7, "a.css", null, { "x": 1 }]);
    assert_eq!(route_files(&files), strings(&["b.js", "a.css"]));
    assert!(route_files(&json!({ "a": [] })).is_empty());
  }

  #[test]
  fn per_route_filter_keeps_order_and_duplicates() {
    let files = strings(&["b.js", "a.css", "a.js", "b.js"]);
    assert_eq!(files_with_suffix(&files, ".js"), vec!["b.js", "a.js", "b.js"]);
    assert_eq!(files_with_suffix(&files, ".css"), vec!["a.css"]);
  }

  #[test]
  fn aggregate_deduplicates_and_sorts() {
    let first = strings(&["/shared.js", "/z.js", "/a.css"]);
    let second = strings(&["/b.js", "/shared.js"]);
    assert_eq!(
      aggregate_files_with_suffix([first.as_slice(), second.as_slice()], ".js"),
      vec!["/b.js", "/shared.js", "/z.js"]
    );
    assert_eq!(
      aggregate_files_with_suffix([first.as_slice(), second.as_slice()], ".css"),
      vec!["/a.css"]
    );
    assert!(aggregate_files_with_suffix([second.as_slice()], ".css").is_empty());
  }

  #[test]
  fn parses_selections() {
    assert_eq!("JS".parse::<FileSelection>(), Ok(FileSelection::Scripts));
    assert_eq!(".css".parse::<FileSelection>(), Ok(FileSelection::Stylesheets));
    assert_eq!("all".parse::<FileSelection>(), Ok(FileSelection::All));
    assert!("png".parse::<FileSelection>().is_err());
    assert!(FileSelection::Stylesheets.matches("x.css"));
    assert!(!FileSelection::Scripts.matches("x.css"));
  }
}
