//! Isolated environment creation.
//!
//! Idempotent by directory presence: an existing environment directory is
//! never inspected or recreated.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::context::InstallContext;
use crate::progress::{CommandSpec, ProcessError, ProcessRunner, exit_label};

#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error(transparent)]
  Process(#[from] ProcessError),

  #[error("creating the virtual environment at {path} failed ({})", exit_label(.code))]
  CreateFailed { path: String, code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
  Created,
  AlreadyPresent,
}

/// Create the environment with `python -m venv` unless its directory exists.
pub async fn provision_env<R: ProcessRunner>(
  ctx: &InstallContext,
  python: &str,
  runner: &R,
) -> Result<ProvisionOutcome, ProvisionError> {
  let env_dir = ctx.env().root();
  if env_dir.exists() {
    info!(path = %env_dir.display(), "environment directory already exists, skipping creation");
    return Ok(ProvisionOutcome::AlreadyPresent);
  }

  info!(path = %env_dir.display(), python = %python, "creating virtual environment");
  let spec = CommandSpec::new("Creating virtual environment", python)
    .args(["-m", "venv"])
    .arg(env_dir)
    .current_dir(ctx.app_dir());

  let report = runner.run(&spec).await?;
  if !report.success() {
    return Err(ProvisionError::CreateFailed {
      path: env_dir.display().to_string(),
      code: report.code,
    });
  }
  Ok(ProvisionOutcome::Created)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::os::Os;
  use crate::platform::shell::HostShell;
  use crate::util::testutil::RecordingRunner;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn context(temp: &TempDir) -> InstallContext {
    let ctx = InstallContext::new(temp.path(), HostShell::Posix, Os::Linux);
    std::fs::create_dir_all(ctx.app_dir()).unwrap();
    ctx
  }

  #[tokio::test]
  async fn creates_env_with_venv_module() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    let runner = RecordingRunner::new();

    let outcome = provision_env(&ctx, "python3", &runner).await.unwrap();

    assert_eq!(outcome, ProvisionOutcome::Created);
    let lines = runner.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("python3 -m venv "));
  }

  #[tokio::test]
  #[traced_test]
  async fn second_run_skips_creation_with_notice() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    let runner = RecordingRunner::new();

    provision_env(&ctx, "python3", &runner).await.unwrap();
    // The recording runner does not create anything; emulate the first run's effect.
    std::fs::create_dir_all(ctx.env().root()).unwrap();

    let outcome = provision_env(&ctx, "python3", &runner).await.unwrap();

    assert_eq!(outcome, ProvisionOutcome::AlreadyPresent);
    assert_eq!(runner.calls().len(), 1);
    assert!(logs_contain("already exists, skipping creation"));
  }

  #[tokio::test]
  async fn non_zero_exit_is_fatal() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    let runner = RecordingRunner::new().failing_on("venv", 1);

    let err = provision_env(&ctx, "python3", &runner).await.unwrap_err();

    assert!(matches!(err, ProvisionError::CreateFailed { code: Some(1), .. }));
    assert!(err.to_string().contains(".venv"));
  }
}
