//! Copy targets for newline-joined file and route lists.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

/// Where copied text ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyDestination {
  /// Handed to a platform clipboard tool.
  System(String),
  /// Printed to the terminal.
  Terminal,
}

impl fmt::Display for CopyDestination {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::System(tool) => write!(f, "clipboard ({tool})"),
      Self::Terminal => f.write_str("terminal"),
    }
  }
}

/// Sink for copy actions.
pub trait Clipboard: Send {
  /// Store `text` and report where it went.
  fn write_text(&mut self, text: &str) -> Result<CopyDestination>;
}

impl Clipboard for Box<dyn Clipboard> {
  fn write_text(&mut self, text: &str) -> Result<CopyDestination> {
    (**self).write_text(text)
  }
}

/// Candidate tools, in order of preference, with the arguments that make them read stdin.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
  ("pbcopy", &[]),
  ("wl-copy", &[]),
  ("xclip", &["-selection", "clipboard"]),
  ("xsel", &["--clipboard", "--input"]),
  ("clip.exe", &[]),
  ("clip", &[]),
];

/// System clipboard through the first platform tool found on `PATH`.
///
/// When no tool is installed, or the tool fails, the text is printed to the terminal instead.
#[derive(Debug)]
pub struct SystemClipboard {
  fallback: TerminalClipboard<io::Stdout>,
}

impl Default for SystemClipboard {
  fn default() -> Self {
    Self::new()
  }
}

impl SystemClipboard {
  /// Create a clipboard that prints to stdout when no tool is available.
  pub fn new() -> Self {
    Self {
      fallback: TerminalClipboard::stdout(),
    }
  }

  fn locate() -> Option<(PathBuf, &'static str, &'static [&'static str])> {
    CLIPBOARD_TOOLS
      .iter()
      .find_map(|(name, args)| which::which(name).ok().map(|path| (path, *name, *args)))
  }
}

impl Clipboard for SystemClipboard {
  fn write_text(&mut self, text: &str) -> Result<CopyDestination> {
    let Some((program, name, args)) = Self::locate() else {
      debug!("no clipboard tool found; printing instead");
      return self.fallback.write_text(text);
    };

    match pipe_into(&program, args, text) {
      Ok(()) => Ok(CopyDestination::System(name.to_string())),
      Err(error) => {
        warn!(tool = name, error = %format!("{error:#}"), "clipboard tool failed; printing instead");
        self.fallback.write_text(text)
      }
    }
  }
}

fn pipe_into(program: &Path, args: &[&str], text: &str) -> Result<()> {
  let mut child = Command::new(program)
    .args(args)
    .stdin(Stdio::piped())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("failed to start {}", program.display()))?;

  if let Some(mut stdin) = child.stdin.take() {
    stdin
      .write_all(text.as_bytes())
      .with_context(|| format!("failed to write to {}", program.display()))?;
  }

  let status = child
    .wait()
    .with_context(|| format!("failed to wait for {}", program.display()))?;
  if !status.success() {
    bail!("{} exited with {status}", program.display());
  }
  Ok(())
}

/// Prints copied text, one entry per line, to a writer.
#[derive(Debug)]
pub struct TerminalClipboard<W> {
  out: W,
}

impl TerminalClipboard<io::Stdout> {
  /// Print to standard output.
  pub fn stdout() -> Self {
    Self { out: io::stdout() }
  }
}

impl<W: Write> TerminalClipboard<W> {
  /// Print to `out`.
  pub fn new(out: W) -> Self {
    Self { out }
  }

  /// Recover the writer.
  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write + Send> Clipboard for TerminalClipboard<W> {
  fn write_text(&mut self, text: &str) -> Result<CopyDestination> {
    writeln!(self.out, "{text}").context("failed to print copied text")?;
    self.out.flush().context("failed to flush copied text")?;
    Ok(CopyDestination::Terminal)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn terminal_clipboard_prints_each_entry_on_its_own_line() {
    let mut clipboard = TerminalClipboard::new(Vec::new());
    let destination = clipboard.write_text("/a\n/b").unwrap();
    assert_eq!(destination, CopyDestination::Terminal);
    assert_eq!(String::from_utf8(clipboard.into_inner()).unwrap(), "/a\n/b\n");
  }

  #[test]
  fn destinations_render_for_notices() {
    assert_eq!(CopyDestination::System("pbcopy".into()).to_string(), "clipboard (pbcopy)");
    assert_eq!(CopyDestination::Terminal.to_string(), "terminal");
  }
}
