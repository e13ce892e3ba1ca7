//! Installation orchestration.
//!
//! Runs the steps strictly in order, each blocking until done:
//!
//! 1. clone the application (skipped when present)
//! 2. create the environment (skipped when present)
//! 3. install requirements
//! 4. ask whether to build a launcher
//! 5. write the launcher and shortcut, if asked
//! 6. copy the compatibility binaries
//!
//! Failures in steps 1 to 5 end the run with an [`InstallError`]. The patch
//! step only fails itself: its outcome is recorded in the report and the
//! report is still returned. Shortcut failures are recorded as well.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::configure::{ConfigError, ConfigProvider, LauncherDecision};
use crate::consts::DEFAULT_REPO_URL;
use crate::context::InstallContext;
use crate::deps::{DepsError, install_requirements};
use crate::launcher::{LauncherError, LauncherSpec, write_launcher};
use crate::patch::{PatchEntry, PatchManifest, PatchReport, apply_patches, default_entries};
use crate::platform::shell::HostShell;
use crate::progress::ProcessRunner;
use crate::provision::{ProvisionError, ProvisionOutcome, provision_env};
use crate::shortcut::{ShortcutCreator, ShortcutSpec};
use crate::source::{SourceError, SourceOutcome, fetch_source};

/// Errors that end the installation.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error("fetching the application failed: {0}")]
  Source(#[from] SourceError),

  #[error("environment creation failed: {0}")]
  Provision(#[from] ProvisionError),

  #[error("dependency installation failed: {0}")]
  Deps(#[from] DepsError),

  #[error("configuration prompt failed: {0}")]
  Config(#[from] ConfigError),

  #[error("launcher creation failed: {0}")]
  Launcher(#[from] LauncherError),
}

/// Settings for one installation run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
  pub repo_url: String,
  /// Interpreter used for `-m venv`
  pub python: String,
  /// Where shortcuts are written; `None` when it could not be determined
  pub desktop_dir: Option<PathBuf>,
  pub patches: Vec<PatchEntry>,
}

impl InstallOptions {
  pub fn new(python: impl Into<String>) -> Self {
    Self {
      repo_url: DEFAULT_REPO_URL.to_string(),
      python: python.into(),
      desktop_dir: None,
      patches: default_entries(),
    }
  }
}

/// Outcome of the shortcut step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShortcutStatus {
  Created { path: PathBuf },
  Unsupported,
  Failed { reason: String },
}

/// Outcome of the patch phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchPhase {
  Completed(PatchReport),
  Aborted { reason: String },
}

impl PatchPhase {
  pub fn is_aborted(&self) -> bool {
    matches!(self, PatchPhase::Aborted { .. })
  }
}

/// What an installation run did.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
  pub install_dir: PathBuf,
  pub app_dir: PathBuf,
  pub env_dir: PathBuf,
  pub shell: HostShell,
  pub source: SourceOutcome,
  pub env: ProvisionOutcome,
  pub launcher: Option<PathBuf>,
  pub shortcut: Option<ShortcutStatus>,
  pub patch: PatchPhase,
  /// How to activate the environment by hand
  pub activate_command: String,
}

/// Run the full installation sequence against `ctx`.
pub async fn install<R, C>(
  ctx: &InstallContext,
  options: &InstallOptions,
  runner: &R,
  config: &mut C,
  shortcuts: Arc<dyn ShortcutCreator>,
) -> Result<InstallReport, InstallError>
where
  R: ProcessRunner,
  C: ConfigProvider + ?Sized,
{
  let source = fetch_source(ctx, &options.repo_url, runner).await?;
  let env = provision_env(ctx, &options.python, runner).await?;
  install_requirements(ctx, runner).await?;

  let (launcher, shortcut) = match config.launcher_decision(ctx.app_dir())? {
    LauncherDecision::Skip => {
      info!("launcher and shortcut skipped");
      (None, None)
    }
    LauncherDecision::Create { args } => {
      let spec = LauncherSpec::for_context(ctx, args);
      let path = write_launcher(ctx, &spec)?;
      let status = create_shortcut(&path, ctx.shell(), options.desktop_dir.as_deref(), shortcuts).await;
      (Some(path), Some(status))
    }
  };

  let mut manifest = PatchManifest::for_context(ctx);
  manifest.entries = options.patches.clone();
  let patch = match apply_patches(&manifest) {
    Ok(report) => PatchPhase::Completed(report),
    Err(e) => {
      warn!(error = %e, "compatibility patch phase aborted");
      PatchPhase::Aborted { reason: e.to_string() }
    }
  };

  Ok(InstallReport {
    install_dir: ctx.install_dir().to_path_buf(),
    app_dir: ctx.app_dir().to_path_buf(),
    env_dir: ctx.env().root().to_path_buf(),
    shell: ctx.shell(),
    source,
    env,
    launcher,
    shortcut,
    patch,
    activate_command: ctx.activate_command(),
  })
}

async fn create_shortcut(
  launcher: &Path,
  shell: HostShell,
  desktop: Option<&Path>,
  shortcuts: Arc<dyn ShortcutCreator>,
) -> ShortcutStatus {
  let Some(file_name) = shortcuts.file_name() else {
    info!("desktop shortcuts are not supported on this platform");
    return ShortcutStatus::Unsupported;
  };
  let Some(desktop) = desktop else {
    warn!("desktop directory unknown, shortcut not created");
    return ShortcutStatus::Failed {
      reason: "desktop directory unknown".to_string(),
    };
  };

  let result = match ShortcutSpec::for_launcher(launcher, shell, desktop.join(file_name)) {
    Ok(spec) => tokio::task::spawn_blocking(move || shortcuts.create(&spec))
      .await
      .unwrap_or_else(|e| Err(e.into())),
    Err(e) => Err(e),
  };
  match result {
    Ok(path) => {
      info!(path = %path.display(), "desktop shortcut created");
      ShortcutStatus::Created { path }
    }
    Err(e) => {
      warn!(error = %e, "desktop shortcut not created");
      ShortcutStatus::Failed { reason: e.to_string() }
    }
  }
}
