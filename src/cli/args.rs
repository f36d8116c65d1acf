//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{ArgAction, ColorChoice, Parser, Subcommand, ValueEnum};

/// Evaluate Next.js `_buildManifest.js` files and browse their routes.
#[derive(Parser, Debug, Clone)]
#[command(name = "next-manifest", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
  /// Control colored output (auto, always, never)
  #[arg(long, global = true, default_value = "auto")]
  pub color: ColorChoice,

  /// Increase log verbosity (-v debug, -vv trace)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  pub verbose: u8,

  /// Configuration file (default: next-manifest.json in the working directory)
  #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
  pub config: Option<PathBuf>,

  /// subcommands
  #[command(subcommand)]
  pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
  /// Parse a manifest read from a file or stdin
  #[command(visible_alias = "p")]
  Parse {
    /// Manifest file; `-` or omitted reads stdin
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    file: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
  },

  /// Fetch a deployed manifest over HTTP and parse it
  #[command(visible_alias = "f")]
  Fetch {
    /// URL of the `_buildManifest.js` file
    url: String,

    #[command(flatten)]
    output: OutputArgs,
  },

  /// Interactive session with paste, fetch, filter and copy commands
  #[command(visible_alias = "s")]
  Shell,
}

/// What a one-shot command does with the parsed routes.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OutputArgs {
  /// Only show routes containing this text (case-insensitive)
  #[arg(long)]
  pub filter: Option<String>,

  /// Copy routes or files instead of listing route cards
  #[arg(long, value_enum)]
  pub copy: Option<CopyTarget>,

  /// Scope `--copy` to a single route
  #[arg(long, requires = "copy")]
  pub route: Option<String>,

  /// Print copied text instead of using the system clipboard
  #[arg(long)]
  pub print: bool,

  /// Emit the evaluator response envelope as JSON
  #[arg(long, conflicts_with_all = ["copy", "filter"])]
  pub json: bool,
}

/// Copy action requested on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
  /// Route names (or, with `--route`, every file of the route)
  Routes,
  /// `.js` files
  Js,
  /// `.css` files
  Css,
  /// Every file of the route given with `--route`
  Files,
}
