//! Application checkout.
//!
//! Clones the application repository into the app directory. An existing
//! app directory is left alone.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::context::InstallContext;
use crate::progress::{CommandSpec, ProcessError, ProcessRunner, exit_label};

#[derive(Debug, Error)]
pub enum SourceError {
  #[error(transparent)]
  Process(#[from] ProcessError),

  #[error("cloning {url} failed ({})", exit_label(.code))]
  CloneFailed { url: String, code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOutcome {
  Cloned,
  AlreadyPresent,
}

/// Clone `repo_url` into the context's app directory unless it exists.
pub async fn fetch_source<R: ProcessRunner>(
  ctx: &InstallContext,
  repo_url: &str,
  runner: &R,
) -> Result<SourceOutcome, SourceError> {
  let app_dir = ctx.app_dir();
  if app_dir.exists() {
    info!(path = %app_dir.display(), "application directory already exists, skipping clone");
    return Ok(SourceOutcome::AlreadyPresent);
  }

  info!(url = %repo_url, "cloning application repository");
  let spec = CommandSpec::new("Cloning repository", "git")
    .arg("clone")
    .arg(repo_url)
    .arg(app_dir)
    .current_dir(ctx.install_dir());

  let report = runner.run(&spec).await?;
  if !report.success() {
    return Err(SourceError::CloneFailed {
      url: repo_url.to_string(),
      code: report.code,
    });
  }
  Ok(SourceOutcome::Cloned)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::os::Os;
  use crate::platform::shell::HostShell;
  use crate::util::testutil::RecordingRunner;
  use tempfile::TempDir;

  #[tokio::test]
  async fn clones_into_app_dir() {
    let temp = TempDir::new().unwrap();
    let ctx = InstallContext::new(temp.path(), HostShell::Posix, Os::Linux);
    let runner = RecordingRunner::new();

    let outcome = fetch_source(&ctx, "https://example.invalid/repo.git", &runner).await.unwrap();

    assert_eq!(outcome, SourceOutcome::Cloned);
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program(), "git");
    assert_eq!(calls[0].cwd(), Some(temp.path()));
    assert!(calls[0].display_line().ends_with(&ctx.app_dir().display().to_string()));
  }

  #[tokio::test]
  async fn existing_app_dir_skips_clone() {
    let temp = TempDir::new().unwrap();
    let ctx = InstallContext::new(temp.path(), HostShell::Posix, Os::Linux);
    std::fs::create_dir_all(ctx.app_dir()).unwrap();
    let runner = RecordingRunner::new();

    let outcome = fetch_source(&ctx, "https://example.invalid/repo.git", &runner).await.unwrap();

    assert_eq!(outcome, SourceOutcome::AlreadyPresent);
    assert!(runner.calls().is_empty());
  }

  #[tokio::test]
  async fn failed_clone_names_the_url() {
    let temp = TempDir::new().unwrap();
    let ctx = InstallContext::new(temp.path(), HostShell::Posix, Os::Linux);
    let runner = RecordingRunner::new().failing_on("clone", 128);

    let err = fetch_source(&ctx, "https://example.invalid/repo.git", &runner).await.unwrap_err();

    assert!(matches!(err, SourceError::CloneFailed { code: Some(128), .. }));
    assert!(err.to_string().contains("https://example.invalid/repo.git"));
  }
}
