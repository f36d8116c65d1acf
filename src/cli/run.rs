//! One-shot `parse` and `fetch` commands.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::args::{CopyTarget, OutputArgs};
use crate::app::{ManifestApp, render};
use crate::clipboard::{Clipboard, SystemClipboard, TerminalClipboard};
use crate::config::InspectorConfig;
use crate::evaluator::EvaluatorHandle;
use crate::extract::{FileKind, FileSelection};
use crate::fetch::ManifestFetcher;
use crate::models::WorkerResponse;

/// Where the manifest text of a one-shot command comes from.
#[derive(Debug, Clone)]
pub enum Source<'a> {
  /// File path, or stdin for `None` and `-`.
  File(Option<&'a Path>),
  /// Deployed manifest URL.
  Url(&'a str),
}

/// Run a one-shot command, writing results to stdout and notices to stderr.
pub async fn run_once(source: Source<'_>, output: &OutputArgs, config: &InspectorConfig) -> Result<ExitCode> {
  if output.json {
    return print_envelope(source, config).await;
  }

  let clipboard: Box<dyn Clipboard> = if output.print {
    Box::new(TerminalClipboard::stdout())
  } else {
    Box::new(SystemClipboard::new())
  };
  let mut app = ManifestApp::new(config, clipboard)?;

  let parsed = match source {
    Source::File(path) => {
      let content = read_source(path).await?;
      app.parse(Some(content)).await
    }
    Source::Url(url) => app.fetch(url).await,
  };
  if let Some(filter) = &output.filter {
    app.set_filter(filter.clone());
  }

  let succeeded = if !parsed {
    false
  } else if let Some(target) = output.copy {
    copy(&mut app, target, output.route.as_deref())?
  } else {
    print!("{}", render::render_routes(app.state()));
    true
  };

  if let Some(notice) = app.notices().latest() {
    eprintln!("{}", render::render_notice(notice));
  }
  Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn copy<C: Clipboard>(app: &mut ManifestApp<C>, target: CopyTarget, route: Option<&str>) -> Result<bool> {
  debug!(?target, route, "copy requested");
  Ok(match (target, route) {
    (CopyTarget::Routes, None) => app.copy_all_routes(),
    (CopyTarget::Js, None) => app.copy_all_files_with_ext(FileKind::Script),
    (CopyTarget::Css, None) => app.copy_all_files_with_ext(FileKind::Stylesheet),
    (CopyTarget::Files, None) => bail!("--copy files needs --route <ROUTE>"),
    (CopyTarget::Routes | CopyTarget::Files, Some(route)) => app.copy_route(route, FileSelection::All),
    (CopyTarget::Js, Some(route)) => app.copy_route(route, FileSelection::Scripts),
    (CopyTarget::Css, Some(route)) => app.copy_route(route, FileSelection::Stylesheets),
  })
}

async fn read_source(path: Option<&Path>) -> Result<String> {
  match path {
    Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read {}", path.display())),
    _ => {
      let mut content = String::new();
      tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("failed to read manifest from stdin")?;
      Ok(content)
    }
  }
}

/// Print `{ok, manifest}` / `{ok, error}` exactly as the evaluator answered.
async fn print_envelope(source: Source<'_>, config: &InspectorConfig) -> Result<ExitCode> {
  let content = match source {
    Source::File(path) => read_source(path).await?,
    Source::Url(url) => {
      let fetcher = ManifestFetcher::new(&config.user_agent, config.fetch_timeout())?;
      match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(error) => return emit(&WorkerResponse::failed(error)),
      }
    }
  };
  let evaluator = EvaluatorHandle::spawn(config.sandbox_options())?;
  let response = evaluator.evaluate(content).await;
  emit(&response)
}

fn emit(response: &WorkerResponse) -> Result<ExitCode> {
  let mut stdout = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut stdout, response).context("failed to write JSON")?;
  writeln!(stdout)?;
  Ok(if response.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
