//! Test utilities for comfyzl-lib.
//!
//! Cross-platform shell helpers plus a [`ProcessRunner`] that records the
//! commands it is asked to run instead of spawning them.

use std::sync::Mutex;

use crate::progress::{CommandSpec, ExitReport, ProcessError, ProcessRunner};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Runner that records every command and reports scripted exit codes.
///
/// Commands whose display line contains a registered needle exit with that
/// needle's code; everything else exits 0.
#[derive(Default)]
pub struct RecordingRunner {
  calls: Mutex<Vec<CommandSpec>>,
  failures: Vec<(String, i32)>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_on(mut self, needle: &str, code: i32) -> Self {
    self.failures.push((needle.to_string(), code));
    self
  }

  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.lock().unwrap().clone()
  }

  pub fn lines(&self) -> Vec<String> {
    self.calls().iter().map(CommandSpec::display_line).collect()
  }
}

impl ProcessRunner for RecordingRunner {
  async fn run(&self, spec: &CommandSpec) -> Result<ExitReport, ProcessError> {
    self.calls.lock().unwrap().push(spec.clone());
    let line = spec.display_line();
    let code = self
      .failures
      .iter()
      .find(|(needle, _)| line.contains(needle.as_str()))
      .map(|(_, code)| *code)
      .unwrap_or(0);
    Ok(ExitReport {
      code: Some(code),
      heartbeats: 0,
      final_percent: Some(100),
      stderr: String::new(),
    })
  }
}
