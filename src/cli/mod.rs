//! Command-line front ends.

pub mod args;
mod run;
mod shell;

use std::process::ExitCode;

use anyhow::Result;
use tokio::io::BufReader;

pub use args::{Cli, Commands, CopyTarget, OutputArgs};
pub use run::{Source, run_once};
pub use shell::{ShellCommand, run_shell};

use crate::app::ManifestApp;
use crate::clipboard::SystemClipboard;
use crate::config::InspectorConfig;

/// Dispatch the parsed command line.
pub async fn execute(cli: &Cli, config: &InspectorConfig) -> Result<ExitCode> {
  match &cli.command {
    Commands::Parse { file, output } => run_once(Source::File(file.as_deref()), output, config).await,
    Commands::Fetch { url, output } => run_once(Source::Url(url), output, config).await,
    Commands::Shell => {
      let mut app = ManifestApp::new(config, SystemClipboard::new())?;
      let input = BufReader::new(tokio::io::stdin());
      run_shell(&mut app, input, &mut std::io::stdout()).await?;
      Ok(ExitCode::SUCCESS)
    }
  }
}
