//! Requirements installation inside the environment.
//!
//! pip runs through the host shell after the environment's activation script,
//! so the command line is shell-specific.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::consts::REQUIREMENTS_FILE;
use crate::context::InstallContext;
use crate::platform::shell::HostShell;
use crate::progress::{CommandSpec, ProcessError, ProcessRunner, exit_label};

#[derive(Debug, Error)]
pub enum DepsError {
  #[error("requirements manifest not found: {}", path.display())]
  ManifestMissing { path: PathBuf },

  #[error(transparent)]
  Process(#[from] ProcessError),

  #[error("dependency installation failed ({}): {stderr}", exit_label(.code))]
  InstallFailed { code: Option<i32>, stderr: String },
}

/// Path of the requirements manifest inside the app directory.
pub fn requirements_path(ctx: &InstallContext) -> PathBuf {
  ctx.app_dir().join(REQUIREMENTS_FILE)
}

/// Shell command line: activation prefix followed by `pip install -r`.
pub fn install_command_line(ctx: &InstallContext) -> String {
  format!(
    "{}pip install -r \"{}\"",
    ctx.activation_prefix(),
    requirements_path(ctx).display()
  )
}

/// Install the requirements manifest. Any non-zero exit is fatal.
pub async fn install_requirements<R: ProcessRunner>(ctx: &InstallContext, runner: &R) -> Result<(), DepsError> {
  let manifest = requirements_path(ctx);
  if !manifest.exists() {
    return Err(DepsError::ManifestMissing { path: manifest });
  }

  let (shell, shell_args) = ctx.shell().invocation();
  let spec = CommandSpec::new("Installing requirements", shell)
    .args(shell_args)
    .current_dir(ctx.app_dir());
  let line = install_command_line(ctx);
  let spec = match ctx.shell() {
    HostShell::Cmd => spec.raw_arg(line),
    HostShell::Posix | HostShell::PowerShell => spec.arg(line),
  };

  info!(shell = %ctx.shell(), manifest = %manifest.display(), "installing requirements, this may take a while");
  let report = runner.run(&spec).await?;
  if !report.success() {
    return Err(DepsError::InstallFailed {
      code: report.code,
      stderr: report.stderr,
    });
  }
  Ok(())
}
