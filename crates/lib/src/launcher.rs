//! Launcher script generation.
//!
//! The launcher is one line: the activation prefix, the entry-point
//! invocation, and the operator's arguments exactly as typed. Arguments are
//! not quoted or escaped.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::{ENTRY_POINT, LAUNCHER_STEM};
use crate::context::InstallContext;

#[derive(Debug, Error)]
pub enum LauncherError {
  #[error("failed to write launcher {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("failed to mark launcher {} executable: {source}", path.display())]
  Permissions { path: PathBuf, source: std::io::Error },
}

/// Contents of a launcher script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSpec {
  pub activation: String,
  pub entry: String,
  pub args: String,
}

impl LauncherSpec {
  /// Launcher for the context's app, with `args` passed through as-is.
  pub fn for_context(ctx: &InstallContext, args: impl Into<String>) -> Self {
    Self {
      activation: ctx.activation_prefix(),
      entry: format!("python \"{}\"", ctx.app_dir().join(ENTRY_POINT).display()),
      args: args.into(),
    }
  }

  pub fn render(&self) -> String {
    if self.args.is_empty() {
      format!("{}{}\n", self.activation, self.entry)
    } else {
      format!("{}{} {}\n", self.activation, self.entry, self.args)
    }
  }
}

/// Fixed launcher location inside the app directory.
pub fn launcher_path(ctx: &InstallContext) -> PathBuf {
  ctx
    .app_dir()
    .join(format!("{LAUNCHER_STEM}.{}", ctx.shell().script_extension()))
}

/// Write `spec` to the launcher path, replacing any previous launcher.
pub fn write_launcher(ctx: &InstallContext, spec: &LauncherSpec) -> Result<PathBuf, LauncherError> {
  let path = launcher_path(ctx);
  fs::write(&path, spec.render()).map_err(|source| LauncherError::Write {
    path: path.clone(),
    source,
  })?;
  make_executable(&path)?;
  info!(path = %path.display(), "launcher written");
  Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), LauncherError> {
  use std::os::unix::fs::PermissionsExt;

  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| LauncherError::Permissions {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), LauncherError> {
  Ok(())
}
