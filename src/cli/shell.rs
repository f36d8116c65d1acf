//! Line-oriented interactive session over a [`ManifestApp`].

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::app::{ManifestApp, render};
use crate::clipboard::Clipboard;
use crate::extract::{FileKind, FileSelection};

const HELP: &str = "\
Commands:
  paste                          read manifest text until a line with a single '.'
  load <file>                    parse a manifest file
  fetch <url>                    fetch and parse a deployed manifest
  filter [text]                  filter routes (no text clears the filter)
  show                           list route cards
  copy routes|js|css             copy all routes, or all .js/.css files
  copy-route <route> [all|js|css] copy the files of one route
  clear                          reset everything
  help                           show this help
  quit                           leave the shell";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
  /// Read manifest text from the following lines.
  Paste,
  /// Parse a file.
  Load(PathBuf),
  /// Fetch a URL.
  Fetch(String),
  /// Set or clear the route filter.
  Filter(String),
  /// Render route cards.
  Show,
  /// Copy every route name.
  CopyRoutes,
  /// Copy every file of a kind across routes.
  CopyFiles(FileKind),
  /// Copy files of one route.
  CopyRoute(String, FileSelection),
  /// Reset state.
  Clear,
  /// Print help.
  Help,
  /// Leave the shell.
  Quit,
}

impl ShellCommand {
  /// Parse one input line. Blank lines yield `Ok(None)`.
  pub fn parse(line: &str) -> Result<Option<Self>, String> {
    let line = line.trim();
    if line.is_empty() {
      return Ok(None);
    }
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match name {
      "paste" => Self::Paste,
      "load" if !rest.is_empty() => Self::Load(PathBuf::from(rest)),
      "load" => return Err("usage: load <file>".into()),
      "fetch" if !rest.is_empty() => Self::Fetch(rest.to_string()),
      "fetch" => return Err("usage: fetch <url>".into()),
      "filter" => Self::Filter(rest.to_string()),
      "show" | "ls" => Self::Show,
      "copy" => match rest {
        "routes" => Self::CopyRoutes,
        "js" => Self::CopyFiles(FileKind::Script),
        "css" => Self::CopyFiles(FileKind::Stylesheet),
        _ => return Err("usage: copy routes|js|css".into()),
      },
      "copy-route" => {
        let mut parts = rest.split_whitespace();
        let route = parts.next().ok_or("usage: copy-route <route> [all|js|css]")?;
        let selection = match parts.next() {
          Some(selection) => selection.parse()?,
          None => FileSelection::All,
        };
        Self::CopyRoute(route.to_string(), selection)
      }
      "clear" => Self::Clear,
      "help" | "?" => Self::Help,
      "quit" | "exit" => Self::Quit,
      other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
  }
}

/// Run the session until `quit` or end of input.
pub async fn run_shell<C, R, W>(app: &mut ManifestApp<C>, input: R, out: &mut W) -> Result<()>
where
  C: Clipboard,
  R: AsyncBufRead + Unpin,
  W: Write,
{
  let mut lines = input.lines();
  writeln!(out, "next-manifest shell. Type 'help' for commands.")?;

  loop {
    write!(out, "> ")?;
    out.flush()?;
    let Some(line) = lines.next_line().await.context("failed to read command")? else {
      break;
    };

    let command = match ShellCommand::parse(&line) {
      Ok(Some(command)) => command,
      Ok(None) => continue,
      Err(usage) => {
        writeln!(out, "{usage}")?;
        continue;
      }
    };

    let show_routes = match command {
      ShellCommand::Quit => break,
      ShellCommand::Help => {
        writeln!(out, "{HELP}")?;
        false
      }
      ShellCommand::Paste => {
        writeln!(out, "Paste the manifest, then a line with a single '.'")?;
        let mut content = String::new();
        while let Some(line) = lines.next_line().await.context("failed to read manifest")? {
          if line.trim() == "." {
            break;
          }
          content.push_str(&line);
          content.push('\n');
        }
        app.parse(Some(content)).await
      }
      ShellCommand::Load(path) => match tokio::fs::read_to_string(&path).await {
        Ok(content) => app.parse(Some(content)).await,
        Err(error) => {
          writeln!(out, "failed to read {}: {error}", path.display())?;
          false
        }
      },
      ShellCommand::Fetch(url) => app.fetch(&url).await,
      ShellCommand::Filter(text) => {
        app.set_filter(text);
        true
      }
      ShellCommand::Show => true,
      ShellCommand::CopyRoutes => {
        app.copy_all_routes();
        false
      }
      ShellCommand::CopyFiles(kind) => {
        app.copy_all_files_with_ext(kind);
        false
      }
      ShellCommand::CopyRoute(route, selection) => {
        app.copy_route(&route, selection);
        false
      }
      ShellCommand::Clear => {
        app.clear();
        writeln!(out, "Cleared.")?;
        false
      }
    };

    if let Some(notice) = app.notices().current() {
      writeln!(out, "{}", render::render_notice(notice))?;
    }
    if show_routes {
      write!(out, "{}", render::render_routes(app.state()))?;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clipboard::TerminalClipboard;
  use crate::config::InspectorConfig;

  #[test]
  fn parses_commands() {
    assert_eq!(ShellCommand::parse("   "), Ok(None));
    assert_eq!(ShellCommand::parse("copy js"), Ok(Some(ShellCommand::CopyFiles(FileKind::Script))));
    assert_eq!(
      ShellCommand::parse("copy-route /blog/[slug] css"),
      Ok(Some(ShellCommand::CopyRoute("/blog/[slug]".into(), FileSelection::Stylesheets)))
    );
    assert_eq!(
      ShellCommand::parse("copy-route /a"),
      Ok(Some(ShellCommand::CopyRoute("/a".into(), FileSelection::All)))
    );
    assert_eq!(ShellCommand::parse("filter"), Ok(Some(ShellCommand::Filter(String::new()))));
    assert!(ShellCommand::parse("fetch").is_err());
    assert!(ShellCommand::parse("copy png").is_err());
    assert!(ShellCommand::parse("dance").is_err());
  }

  #[tokio::test]
  async fn pastes_filters_and_copies() {
    let mut app = ManifestApp::new(&InspectorConfig::default(), TerminalClipboard::new(Vec::new()))
      .expect("app should start");
    let script = "paste\nself.__BUILD_MANIFEST = {\n'/a': ['/a.js'], '/blog': ['/b.js', '/b.css']\n}\n.\nfilter blog\ncopy-route /blog css\nquit\nshow\n";
    let mut out = Vec::new();
    run_shell(&mut app, script.as_bytes(), &mut out).await.unwrap();

    let transcript = String::from_utf8(out).unwrap();
    assert!(transcript.contains("Discovered 2 Routes"));
    assert!(transcript.contains("1 matching \"blog\""));
    assert!(transcript.contains("Copied!"));
    assert_eq!(app.state().filter, "blog");
    assert_eq!(app.filtered_routes(), vec!["/blog"]);
  }
}
