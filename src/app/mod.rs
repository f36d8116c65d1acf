//! Application layer shared by the one-shot CLI and the interactive shell.
//!
//! [`ManifestApp`] owns the explicit [`AppState`] and a [`NoticeBoard`]. Every handler
//! reports its outcome through a notice and leaves the app idle again, so no failure is
//! fatal to the process.

mod notices;
pub mod render;
mod state;

use anyhow::Result;
use tracing::{debug, info};

pub use notices::{Notice, NoticeBoard, NoticeKind};
pub use state::AppState;

use crate::clipboard::Clipboard;
use crate::config::InspectorConfig;
use crate::evaluator::EvaluatorHandle;
use crate::extract::{FileKind, FileSelection, RouteRules, RouteTable};
use crate::fetch::{ManifestFetcher, build_id};
use crate::models::WorkerResponse;

const FETCH_GUIDANCE: &str =
  "Failed to fetch manifest. Please manually insert the content of the _buildManifest.js file.";

/// Manifest inspector: evaluator, fetcher and clipboard wired to explicit state.
pub struct ManifestApp<C> {
  evaluator: EvaluatorHandle,
  fetcher: ManifestFetcher,
  clipboard: C,
  rules: RouteRules,
  state: AppState,
  notices: NoticeBoard,
}

impl<C: Clipboard> ManifestApp<C> {
  /// Start the evaluator worker and build the HTTP client described by `config`.
  pub fn new(config: &InspectorConfig, clipboard: C) -> Result<Self> {
    let evaluator = EvaluatorHandle::spawn(config.sandbox_options())?;
    let fetcher = ManifestFetcher::new(&config.user_agent, config.fetch_timeout())?;
    Ok(Self {
      evaluator,
      fetcher,
      clipboard,
      rules: config.route_rules(),
      state: AppState::default(),
      notices: NoticeBoard::new(config.notice_window()),
    })
  }

  /// Current state.
  pub fn state(&self) -> &AppState {
    &self.state
  }

  /// Notice board.
  pub fn notices(&self) -> &NoticeBoard {
    &self.notices
  }

  /// Clipboard the copy actions write to.
  pub fn clipboard(&self) -> &C {
    &self.clipboard
  }

  /// Replace the raw input text without parsing it.
  pub fn set_input(&mut self, input: impl Into<String>) {
    self.state.input = input.into();
  }

  /// Evaluate the raw input (or `content_override`) and replace the routes.
  ///
  /// Returns `true` when at least one route was found.
  pub async fn parse(&mut self, content_override: Option<String>) -> bool {
    if let Some(content) = content_override {
      self.state.input = content;
    }
    self.state.reset_results();

    let content = self.state.input.trim();
    if content.is_empty() {
      self.notices.error("Input is empty. Please paste the manifest content.");
      return false;
    }

    debug!(bytes = content.len(), "evaluating manifest");
    let manifest = match self.evaluator.evaluate(content).await {
      WorkerResponse::Parsed { manifest } => manifest,
      WorkerResponse::Failed { error } => {
        self.notices.error(format!("Failed to parse manifest: {error}"));
        return false;
      }
    };

    let routes = RouteTable::from_manifest(&manifest, &self.rules);
    if routes.is_empty() {
      self.notices.error("No routes found in the manifest.");
      return false;
    }
    info!(routes = routes.len(), "manifest parsed");
    self.state.set_results(manifest, routes);
    true
  }

  /// Download the manifest at `url` and parse it.
  ///
  /// A failed download leaves the previous input and routes untouched.
  pub async fn fetch(&mut self, url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
      self.notices.error("Please enter a URL.");
      return false;
    }

    self.state.fetching = true;
    let result = self.fetcher.fetch(url).await;
    self.state.fetching = false;

    match result {
      Ok(body) => {
        self.state.url = url.to_string();
        self.state.build_id = build_id(url);
        self.parse(Some(body)).await
      }
      Err(error) => {
        self.notices.error(format!("{FETCH_GUIDANCE} {error}"));
        false
      }
    }
  }

  /// Reset input, URL, results and filter.
  pub fn clear(&mut self) {
    self.state = AppState::default();
    self.notices.dismiss();
  }

  /// Set the route filter text.
  pub fn set_filter(&mut self, filter: impl Into<String>) {
    self.state.filter = filter.into();
  }

  /// Routes matching the current filter, in display order.
  pub fn filtered_routes(&self) -> Vec<&str> {
    self.state.routes.filter(&self.state.filter)
  }

  /// Copy every route name, one per line.
  pub fn copy_all_routes(&mut self) -> bool {
    let routes: Vec<&str> = self.state.routes.routes().collect();
    if routes.is_empty() {
      self.notices.error("No routes to copy.");
      return false;
    }
    let text = routes.join("\n");
    self.copy(&text, "All Routes Copied!")
  }

  /// Copy every file ending in the suffix of `kind` across all routes, deduplicated and sorted.
  pub fn copy_all_files_with_ext(&mut self, kind: FileKind) -> bool {
    let Some(suffix) = kind.suffix() else {
      self.notices.error("Only .JS and .CSS files can be copied in bulk.");
      return false;
    };
    let label = suffix.to_uppercase();
    let files = self.state.routes.aggregate_with_suffix(suffix);
    if files.is_empty() {
      self.notices.error(format!("No {label} files found to copy."));
      return false;
    }
    let text = files.join("\n");
    self.copy(&text, &format!("All {label} files copied!"))
  }

  /// Copy the files of one route matching `selection`, in manifest order.
  pub fn copy_route(&mut self, route: &str, selection: FileSelection) -> bool {
    let files = self.state.routes.select(route, selection);
    if files.is_empty() {
      self.notices.error(format!("Nothing to copy for {route}."));
      return false;
    }
    let text = files.join("\n");
    self.copy(&text, "Copied!")
  }

  fn copy(&mut self, text: &str, success: &str) -> bool {
    match self.clipboard.write_text(text) {
      Ok(destination) => {
        debug!(%destination, lines = text.lines().count(), "copied");
        self.notices.success(success);
        true
      }
      Err(error) => {
        self.notices.error(format!("Copy failed: {error:#}"));
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clipboard::TerminalClipboard;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const SAMPLE: &str = "self.__BUILD_MANIFEST = {sortedPages:['/'], '/a':['/a.js','/a.css'], '/b':['/b.js']};";

  type TestApp = ManifestApp<TerminalClipboard<Vec<u8>>>;

  fn app() -> TestApp {
    ManifestApp::new(&InspectorConfig::default(), TerminalClipboard::new(Vec::new()))
      .expect("app should start")
  }

  fn copied(app: TestApp) -> String {
    String::from_utf8(app.clipboard.into_inner()).unwrap()
  }

  fn latest(app: &TestApp) -> (NoticeKind, String) {
    let notice = app.notices().latest().expect("a notice was posted");
    (notice.kind, notice.message.clone())
  }

  #[tokio::test]
  async fn parses_the_reference_manifest() {
    let mut app = app();
    assert!(app.parse(Some(SAMPLE.to_string())).await);
    let routes: Vec<&str> = app.state().routes.routes().collect();
    assert_eq!(routes, vec!["/a", "/b"]);
    assert_eq!(
      app.state().routes.files("/a"),
      Some(["/a.js".to_string(), "/a.css".to_string()].as_slice())
    );
  }

  #[tokio::test]
  async fn empty_input_is_reported() {
    let mut app = app();
    app.set_input("   \n ");
    assert!(!app.parse(None).await);
    assert_eq!(
      latest(&app),
      (NoticeKind::Error, "Input is empty. Please paste the manifest content.".into())
    );
  }

  #[tokio::test]
  async fn malformed_scripts_clear_previous_results() {
    let mut app = app();
    assert!(app.parse(Some(SAMPLE.to_string())).await);
    assert!(!app.parse(Some("self.__BUILD_MANIFEST = {'/a': [".to_string())).await);

    let (kind, message) = latest(&app);
    assert_eq!(kind, NoticeKind::Error);
    assert!(message.starts_with("Failed to parse manifest: SyntaxError"));
    assert!(app.state().routes.is_empty());
    assert!(app.state().manifest.is_none());
  }

  #[tokio::test]
  async fn reserved_only_manifests_have_no_routes() {
    let mut app = app();
    let content = "self.__BUILD_MANIFEST = { sortedPages: ['/'], __rewrites: [] }";
    assert!(!app.parse(Some(content.to_string())).await);
    assert_eq!(latest(&app), (NoticeKind::Error, "No routes found in the manifest.".into()));
  }

  #[tokio::test]
  async fn copies_aggregated_scripts_sorted_and_deduplicated() {
    let mut app = app();
    let content = "self.__BUILD_MANIFEST = { '/b': ['/z.js', '/shared.js'], '/a': ['/shared.js', '/a.js', '/a.css'] }";
    assert!(app.parse(Some(content.to_string())).await);
    assert!(app.copy_all_files_with_ext(FileKind::Script));
    assert_eq!(latest(&app), (NoticeKind::Success, "All .JS files copied!".into()));
    assert_eq!(copied(app), "/a.js\n/shared.js\n/z.js\n");
  }

  #[tokio::test]
  async fn copy_actions_report_nothing_to_copy() {
    let mut app = app();
    assert!(!app.copy_all_routes());
    assert_eq!(latest(&app), (NoticeKind::Error, "No routes to copy.".into()));

    assert!(app.parse(Some("self.__BUILD_MANIFEST = { '/a': ['/a.js'] }".to_string())).await);
    assert!(!app.copy_all_files_with_ext(FileKind::Stylesheet));
    assert_eq!(latest(&app), (NoticeKind::Error, "No .CSS files found to copy.".into()));
    assert!(!app.copy_route("/a", FileSelection::Stylesheets));
    assert_eq!(latest(&app), (NoticeKind::Error, "Nothing to copy for /a.".into()));
  }

  #[tokio::test]
  async fn copies_routes_and_route_files() {
    let mut app = app();
    assert!(app.parse(Some(SAMPLE.to_string())).await);
    assert!(app.copy_all_routes());
    assert_eq!(latest(&app), (NoticeKind::Success, "All Routes Copied!".into()));
    assert!(app.copy_route("/a", FileSelection::All));
    assert_eq!(latest(&app), (NoticeKind::Success, "Copied!".into()));
    assert_eq!(copied(app), "/a\n/b\n/a.js\n/a.css\n");
  }

  #[tokio::test]
  async fn filters_and_clears() {
    let mut app = app();
    assert!(app.parse(Some(SAMPLE.to_string())).await);
    app.set_filter(" B ");
    assert_eq!(app.filtered_routes(), vec!["/b"]);

    app.clear();
    assert_eq!(app.state(), &AppState::default());
    assert!(app.filtered_routes().is_empty());
  }

  #[tokio::test]
  async fn fetch_feeds_the_parse_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/_next/static/build-1/_buildManifest.js"))
      .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
      .mount(&server)
      .await;

    let mut app = app();
    let url = format!("{}/_next/static/build-1/_buildManifest.js", server.uri());
    assert!(app.fetch(&url).await);
    assert_eq!(app.state().route_count(), 2);
    assert_eq!(app.state().build_id.as_deref(), Some("build-1"));
    assert_eq!(app.state().input, SAMPLE);
    assert!(!app.state().fetching);
  }

  #[tokio::test]
  async fn fetch_failures_keep_previous_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let mut app = app();
    assert!(app.parse(Some(SAMPLE.to_string())).await);
    assert!(!app.fetch(&format!("{}/missing.js", server.uri())).await);

    let (kind, message) = latest(&app);
    assert_eq!(kind, NoticeKind::Error);
    assert!(message.starts_with(FETCH_GUIDANCE));
    assert!(message.contains("404"));
    assert_eq!(app.state().route_count(), 2);
    assert!(!app.state().fetching);
  }

  #[tokio::test]
  async fn blank_urls_are_rejected() {
    let mut app = app();
    assert!(!app.fetch("  ").await);
    assert_eq!(latest(&app), (NoticeKind::Error, "Please enter a URL.".into()));
  }
}
