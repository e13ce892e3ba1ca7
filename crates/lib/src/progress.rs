//! Progress reporting for long external processes.
//!
//! The wrapped tools (`git`, `python -m venv`, `pip`) expose no completion
//! percentage, so the reporter shows a synthetic heartbeat while waiting:
//! - [`HeartbeatPolicy::Ticks`]: a bar that creeps towards 100% once per
//!   interval and is forced to 100% when the process exits
//! - [`HeartbeatPolicy::Spinner`]: an indeterminate spinner
//!
//! The heartbeat runs as a separate task that owns the receiving half of a
//! `oneshot` channel; the waiting side sends on it once the process exits.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::debug;

/// Description of an external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  description: String,
  program: OsString,
  args: Vec<OsString>,
  raw_tail: Option<OsString>,
  cwd: Option<PathBuf>,
}

impl CommandSpec {
  pub fn new(description: impl Into<String>, program: impl AsRef<OsStr>) -> Self {
    Self {
      description: description.into(),
      program: program.as_ref().to_os_string(),
      args: Vec::new(),
      raw_tail: None,
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  /// Final argument, passed to the program without any quoting on Windows.
  ///
  /// `cmd.exe /C` does not understand the `\"` escapes the standard argument
  /// quoting produces, so command lines for it must go through here. Elsewhere
  /// this behaves like [`CommandSpec::arg`].
  pub fn raw_arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.raw_tail = Some(arg.as_ref().to_os_string());
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn program(&self) -> &OsStr {
    &self.program
  }

  pub fn arg_list(&self) -> &[OsString] {
    &self.args
  }

  pub fn raw_tail(&self) -> Option<&OsStr> {
    self.raw_tail.as_deref()
  }

  pub fn cwd(&self) -> Option<&Path> {
    self.cwd.as_deref()
  }

  /// Program and arguments joined with spaces, for logs.
  pub fn display_line(&self) -> String {
    std::iter::once(&self.program)
      .chain(self.args.iter())
      .chain(self.raw_tail.iter())
      .map(|s| s.to_string_lossy())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Errors starting or waiting on a process.
///
/// A process that ran and exited non-zero is not an error here; see
/// [`ExitReport::code`].
#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed while waiting for {program}: {source}")]
  Wait {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// Terminal state of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
  /// Exit code, `None` when the process was killed by a signal
  pub code: Option<i32>,
  /// Heartbeats emitted while waiting
  pub heartbeats: u64,
  /// Bar position once the process exited; `None` for the spinner
  pub final_percent: Option<u64>,
  /// Captured stderr, trimmed
  pub stderr: String,
}

impl ExitReport {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Human-readable form of an exit code for error messages.
pub fn exit_label(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "terminated by signal".to_string(),
  }
}

/// Runs external commands to completion.
///
/// Implemented by [`ProgressReporter`] for real processes; tests substitute
/// a recording runner.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
  async fn run(&self, spec: &CommandSpec) -> Result<ExitReport, ProcessError>;
}

/// Heartbeat shown while a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeartbeatPolicy {
  /// Synthetic percentage advanced once per interval
  #[default]
  Ticks,
  /// Indeterminate spinner
  Spinner,
}

impl HeartbeatPolicy {
  pub fn default_interval(&self) -> Duration {
    match self {
      HeartbeatPolicy::Ticks => Duration::from_secs(1),
      HeartbeatPolicy::Spinner => Duration::from_millis(100),
    }
  }
}

/// Percentage shown after `beats` ticks.
///
/// Closes 10% of the remaining distance per tick and never reports 100%;
/// only process exit completes the bar.
pub fn synthetic_percent(beats: u64) -> u64 {
  let remaining = 100.0 * 0.9f64.powi(beats.min(1_000) as i32);
  ((100.0 - remaining).floor() as u64).min(99)
}

/// [`ProcessRunner`] that draws an `indicatif` heartbeat on stderr.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
  policy: HeartbeatPolicy,
  interval: Duration,
  draw: bool,
}

impl ProgressReporter {
  pub fn new(policy: HeartbeatPolicy) -> Self {
    Self {
      policy,
      interval: policy.default_interval(),
      draw: true,
    }
  }

  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Suppress drawing; heartbeats are still counted.
  pub fn hidden(mut self) -> Self {
    self.draw = false;
    self
  }

  pub fn policy(&self) -> HeartbeatPolicy {
    self.policy
  }

  fn bar(&self, description: &str) -> ProgressBar {
    let bar = match self.policy {
      HeartbeatPolicy::Ticks => {
        let bar = ProgressBar::new(100);
        bar.set_style(
          ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        bar
      }
      HeartbeatPolicy::Spinner => {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
          ProgressStyle::with_template("{spinner:.blue.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar
      }
    };
    if !self.draw {
      bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_message(description.to_string());
    bar
  }
}

impl ProcessRunner for ProgressReporter {
  async fn run(&self, spec: &CommandSpec) -> Result<ExitReport, ProcessError> {
    let program = spec.program().to_string_lossy().into_owned();

    let mut command = Command::new(spec.program());
    command
      .args(spec.arg_list())
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    if let Some(tail) = spec.raw_tail() {
      #[cfg(windows)]
      command.raw_arg(tail);
      #[cfg(not(windows))]
      command.arg(tail);
    }
    if let Some(dir) = spec.cwd() {
      command.current_dir(dir);
    }

    debug!(cmd = %spec.display_line(), cwd = ?spec.cwd(), "spawning process");
    let child = command.spawn().map_err(|source| ProcessError::Spawn {
      program: program.clone(),
      source,
    })?;

    let bar = self.bar(spec.description());
    let (done_tx, done_rx) = oneshot::channel();
    let ticker = tokio::spawn(heartbeat(bar.clone(), self.policy, self.interval, done_rx));

    let waited = child.wait_with_output().await;
    let _ = done_tx.send(());
    let heartbeats = ticker.await.unwrap_or(0);

    let output = match waited {
      Ok(output) => output,
      Err(source) => {
        bar.abandon();
        return Err(ProcessError::Wait { program, source });
      }
    };

    let final_percent = match self.policy {
      HeartbeatPolicy::Ticks => {
        bar.set_position(100);
        Some(bar.position())
      }
      HeartbeatPolicy::Spinner => None,
    };
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if output.status.success() {
      bar.finish_with_message(format!("{} done", spec.description()));
    } else {
      bar.abandon_with_message(format!("{} failed", spec.description()));
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
    }

    Ok(ExitReport {
      code: output.status.code(),
      heartbeats,
      final_percent,
      stderr,
    })
  }
}

async fn heartbeat(
  bar: ProgressBar,
  policy: HeartbeatPolicy,
  interval: Duration,
  mut done: oneshot::Receiver<()>,
) -> u64 {
  let mut ticker = tokio::time::interval(interval);
  // The first tick completes immediately.
  ticker.tick().await;

  let mut beats = 0;
  loop {
    tokio::select! {
      _ = &mut done => break,
      _ = ticker.tick() => {
        beats += 1;
        match policy {
          HeartbeatPolicy::Ticks => bar.set_position(synthetic_percent(beats)),
          HeartbeatPolicy::Spinner => bar.tick(),
        }
      }
    }
  }
  beats
}
