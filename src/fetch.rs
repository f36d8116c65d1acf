//! Plain HTTP retrieval of a deployed `_buildManifest.js`.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Reasons a manifest could not be downloaded.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The input is not an absolute URL.
  #[error("invalid URL '{url}': {source}")]
  InvalidUrl {
    /// Text that failed to parse.
    url: String,
    /// Parser failure.
    source: url::ParseError,
  },
  /// The URL uses a scheme other than `http` or `https`.
  #[error("unsupported URL scheme '{0}'")]
  UnsupportedScheme(String),
  /// The server answered with a non-success status.
  #[error("HTTP {0}")]
  Status(u16),
  /// The request failed before a response was received, or the body could not be read.
  #[error("{0}")]
  Transport(#[from] reqwest::Error),
}

/// HTTP client configured for manifest downloads.
#[derive(Debug, Clone)]
pub struct ManifestFetcher {
  client: Client,
}

impl ManifestFetcher {
  /// Build a client sending `user_agent` with an overall request `timeout`.
  pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(user_agent)
      .build()?;
    Ok(Self { client })
  }

  /// `GET` `raw_url` and return the response body. Failures are reported once; nothing is retried.
  pub async fn fetch(&self, raw_url: &str) -> Result<String, FetchError> {
    let url = parse_url(raw_url)?;
    debug!(%url, "fetching manifest");
    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    debug!(bytes = body.len(), "fetched manifest");
    Ok(body)
  }
}

fn parse_url(raw_url: &str) -> Result<Url, FetchError> {
  let raw_url = raw_url.trim();
  let url = Url::parse(raw_url).map_err(|source| FetchError::InvalidUrl {
    url: raw_url.to_string(),
    source,
  })?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(FetchError::UnsupportedScheme(other.to_string())),
  }
}

fn build_manifest_path() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"/_next/static/([^/]+)/_buildManifest\.js$").expect("invalid build manifest regex")
  })
}

/// Build id embedded in a `/_next/static/<build-id>/_buildManifest.js` URL.
pub fn build_id(raw_url: &str) -> Option<String> {
  let url = Url::parse(raw_url.trim()).ok()?;
  build_manifest_path()
    .captures(url.path())
    .and_then(|captures| captures.get(1))
    .map(|id| id.as_str().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn fetcher() -> ManifestFetcher {
    ManifestFetcher::new("next-manifest/test", Duration::from_secs(5)).expect("client should build")
  }

  #[tokio::test]
  async fn returns_the_body_of_a_successful_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/_next/static/abc123/_buildManifest.js"))
      .and(header("user-agent", "next-manifest/test"))
      .respond_with(ResponseTemplate::new(200).set_body_string("self.__BUILD_MANIFEST = {};"))
      .expect(1)
      .mount(&server)
      .await;

    let url = format!("{}/_next/static/abc123/_buildManifest.js", server.uri());
    let body = fetcher().fetch(&url).await.expect("fetch should succeed");
    assert_eq!(body, "self.__BUILD_MANIFEST = {};");
  }

  #[tokio::test]
  async fn reports_http_status_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(404))
      .expect(1)
      .mount(&server)
      .await;

    let error = fetcher()
      .fetch(&format!("{}/missing.js", server.uri()))
      .await
      .unwrap_err();
    assert!(matches!(error, FetchError::Status(404)));
    assert_eq!(error.to_string(), "HTTP 404");
  }

  #[tokio::test]
  async fn rejects_invalid_urls_without_a_request() {
    let fetcher = fetcher();
    assert!(matches!(
      fetcher.fetch("not a url").await,
      Err(FetchError::InvalidUrl { .. })
    ));
    assert!(matches!(
      fetcher.fetch("file:///etc/passwd").await,
      Err(FetchError::UnsupportedScheme(scheme)) if scheme == "file"
    ));
  }

  #[test]
  fn extracts_build_ids() {
    assert_eq!(
      build_id("https://example.com/_next/static/Xy_9-z/_buildManifest.js").as_deref(),
      Some("Xy_9-z")
    );
    assert_eq!(
      build_id("https://example.com/base/_next/static/abc/_buildManifest.js?v=1").as_deref(),
      Some("abc")
    );
    assert_eq!(build_id("https://example.com/_next/static/chunks/main.js"), None);
    assert_eq!(build_id("nonsense"), None);
  }
}
