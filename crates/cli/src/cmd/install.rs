//! Implementation of the `comfyzl install` command.
//!
//! Resolves the install context, picks the prompt source and shortcut
//! capability for this host, then runs the installation sequence and prints
//! its report.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};

use comfyzl_lib::configure::{AffirmativePolicy, ConfigProvider, PresetDecisions};
use comfyzl_lib::consts::DEFAULT_REPO_URL;
use comfyzl_lib::context::InstallContext;
use comfyzl_lib::install::{InstallOptions, InstallReport, PatchPhase, ShortcutStatus, install};
use comfyzl_lib::patch::EntryOutcome;
use comfyzl_lib::platform::paths;
use comfyzl_lib::platform::shell::HostShell;
use comfyzl_lib::progress::{HeartbeatPolicy, ProgressReporter};
use comfyzl_lib::provision::ProvisionOutcome;
use comfyzl_lib::shortcut;
use comfyzl_lib::source::SourceOutcome;

use crate::output::{self, OutputFormat};
use crate::prompts;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellArg {
  Posix,
  Cmd,
  Powershell,
}

impl From<ShellArg> for HostShell {
  fn from(arg: ShellArg) -> Self {
    match arg {
      ShellArg::Posix => HostShell::Posix,
      ShellArg::Cmd => HostShell::Cmd,
      ShellArg::Powershell => HostShell::PowerShell,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ProgressArg {
  /// Percentage bar advancing once per second
  #[default]
  Ticks,
  /// Indeterminate spinner
  Spinner,
}

impl From<ProgressArg> for HeartbeatPolicy {
  fn from(arg: ProgressArg) -> Self {
    match arg {
      ProgressArg::Ticks => HeartbeatPolicy::Ticks,
      ProgressArg::Spinner => HeartbeatPolicy::Spinner,
    }
  }
}

/// Answer assumed when a yes/no prompt gets a bare return.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PromptDefault {
  /// Only "y"/"yes" accept
  #[default]
  Explicit,
  /// Empty input also accepts
  DefaultYes,
}

impl From<PromptDefault> for AffirmativePolicy {
  fn from(arg: PromptDefault) -> Self {
    match arg {
      PromptDefault::Explicit => AffirmativePolicy::Explicit,
      PromptDefault::DefaultYes => AffirmativePolicy::DefaultYes,
    }
  }
}

#[derive(Debug, Args)]
pub struct InstallArgs {
  /// Directory to install into; asked for when omitted
  #[arg(long, env = "COMFYZL_INSTALL_DIR")]
  install_dir: Option<PathBuf>,

  /// Repository to clone
  #[arg(long, env = "COMFYZL_REPO_URL", default_value = DEFAULT_REPO_URL)]
  repo_url: String,

  /// Python interpreter used to create the environment
  #[arg(long, env = "COMFYZL_PYTHON")]
  python: Option<String>,

  /// Host shell used for activation (detected when omitted)
  #[arg(long, value_enum)]
  shell: Option<ShellArg>,

  /// Heartbeat shown while external tools run
  #[arg(long, value_enum, default_value_t)]
  progress: ProgressArg,

  /// How a bare return is treated at yes/no prompts
  #[arg(long, value_enum, default_value_t)]
  prompt_default: PromptDefault,

  /// Never prompt; skips the launcher unless --launcher-args is given
  #[arg(long)]
  no_input: bool,

  /// Create the launcher and shortcut with these arguments without asking
  #[arg(long, allow_hyphen_values = true)]
  launcher_args: Option<String>,

  /// Do not create the launcher and shortcut
  #[arg(long, conflicts_with = "launcher_args")]
  no_launcher: bool,
}

/// Execute the install command.
///
/// Fatal step failures are returned as errors. A failed patch phase is
/// reported in the summary and then returned as an error so the exit status
/// reflects it.
pub fn cmd_install(args: InstallArgs, format: OutputFormat) -> Result<()> {
  let policy = AffirmativePolicy::from(args.prompt_default);
  let mut terminal = None;

  let install_dir = match args.install_dir.clone() {
    Some(dir) => dir,
    None if args.no_input => bail!("--install-dir is required with --no-input"),
    None => prompts::ask_install_dir(terminal.insert(prompts::terminal_prompts(policy)?))?,
  };

  let ctx = InstallContext::resolve(&install_dir, args.shell.map(HostShell::from))
    .with_context(|| format!("Failed to prepare {}", install_dir.display()))?;

  let mut config: Box<dyn ConfigProvider> = if let Some(launch_args) = args.launcher_args.clone() {
    Box::new(PresetDecisions::create(launch_args))
  } else if args.no_launcher || args.no_input {
    Box::new(PresetDecisions::skip())
  } else {
    match terminal {
      Some(prompts) => Box::new(prompts),
      None => Box::new(prompts::terminal_prompts(policy)?),
    }
  };

  let mut options = InstallOptions::new(args.python.clone().unwrap_or_else(|| ctx.os().default_python().to_string()));
  options.repo_url = args.repo_url.clone();
  options.desktop_dir = match paths::desktop_dir(ctx.os()) {
    Ok(dir) => Some(dir),
    Err(e) => {
      tracing::warn!(error = %e, "desktop directory unavailable");
      None
    }
  };

  let runner = ProgressReporter::new(args.progress.into());
  let shortcuts = shortcut::for_os(ctx.os());

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(install(&ctx, &options, &runner, config.as_mut(), shortcuts))
    .context("Installation failed")?;

  if format.is_json() {
    output::print_json(&report)?;
  } else {
    print_summary(&report, started.elapsed());
  }

  if let PatchPhase::Aborted { reason } = &report.patch {
    bail!("compatibility patch phase failed: {reason}");
  }
  Ok(())
}

fn print_summary(report: &InstallReport, elapsed: Duration) {
  println!();
  output::print_success(&format!(
    "ComfyUI installation is complete ({})",
    humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
  ));
  output::print_stat("Install dir", &report.install_dir.display().to_string());
  output::print_stat("Shell", report.shell.as_str());
  output::print_stat(
    "Source",
    match report.source {
      SourceOutcome::Cloned => "cloned",
      SourceOutcome::AlreadyPresent => "already present",
    },
  );
  output::print_stat(
    "Environment",
    match report.env {
      ProvisionOutcome::Created => "created",
      ProvisionOutcome::AlreadyPresent => "already present",
    },
  );

  match &report.launcher {
    Some(path) => output::print_stat("Launcher", &path.display().to_string()),
    None => output::print_stat("Launcher", "skipped"),
  }
  match &report.shortcut {
    Some(ShortcutStatus::Created { path }) => output::print_stat("Shortcut", &path.display().to_string()),
    Some(ShortcutStatus::Unsupported) => output::print_stat("Shortcut", "not supported on this platform"),
    Some(ShortcutStatus::Failed { reason }) => output::print_warning(&format!("Shortcut not created: {reason}")),
    None => {}
  }

  match &report.patch {
    PatchPhase::Completed(patch) => {
      output::print_stat(
        "Patch",
        &format!("{} copied, {} error(s)", patch.copied(), patch.errors()),
      );
      for outcome in &patch.outcomes {
        match outcome {
          EntryOutcome::Copied { .. } => {}
          EntryOutcome::Missing { path } => output::print_error(&format!("{} does not exist", path.display())),
          EntryOutcome::Failed { path, reason } => {
            output::print_error(&format!("Could not copy to {}: {reason}", path.display()))
          }
        }
      }
    }
    PatchPhase::Aborted { reason } => output::print_error(&format!("Patch phase failed: {reason}")),
  }

  println!();
  match &report.launcher {
    Some(path) => {
      output::print_info("Run ComfyUI with the desktop shortcut or the launcher:");
      output::print_hint(&path.display().to_string());
    }
    None => {
      output::print_info("To activate the environment later, run:");
      output::print_hint(&report.activate_command);
    }
  }
}
