mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::install::InstallArgs;
use crate::output::OutputFormat;

/// comfyzl - install ComfyUI with ZLUDA compatibility binaries
#[derive(Parser)]
#[command(name = "comfyzl")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format for reports
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Clone, provision and patch a ComfyUI installation
  Install(InstallArgs),

  /// Copy the compatibility binaries into an existing installation
  Patch {
    /// Directory ComfyUI was installed into (the parent of `comfyui/`)
    #[arg(long, env = "COMFYZL_INSTALL_DIR")]
    install_dir: PathBuf,
  },

  /// Show detected platform, shell and paths
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Install(args) => cmd::cmd_install(args, cli.output),
    Commands::Patch { install_dir } => cmd::cmd_patch(&install_dir, cli.output),
    Commands::Info => cmd::cmd_info(cli.output),
  }
}
