//! `next-manifest`: inspect Next.js build manifests from the terminal.

use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use next_manifest_inspector::cli::{self, Cli};
use next_manifest_inspector::config::InspectorConfig;
use tracing::level_filters::LevelFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  match cli.color {
    ColorChoice::Always => owo_colors::set_override(true),
    ColorChoice::Never => owo_colors::set_override(false),
    ColorChoice::Auto => {}
  }

  let level = match cli.verbose {
    0 => LevelFilter::WARN,
    1 => LevelFilter::DEBUG,
    _ => LevelFilter::TRACE,
  };
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .with_ansi(!matches!(cli.color, ColorChoice::Never))
    .init();

  let config = match &cli.config {
    Some(path) => InspectorConfig::from_path(path)?,
    None => InspectorConfig::discover(&std::env::current_dir()?),
  };

  cli::execute(&cli, &config).await
}
