//! Operator decisions.
//!
//! The orchestrator asks a [`ConfigProvider`] whether to build the launcher
//! and shortcut, and with which launch arguments. [`InteractivePrompts`] asks
//! on a terminal; [`PresetDecisions`] answers from values fixed up front.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::consts::ARGS_REFERENCE_FILE;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read operator input: {0}")]
  Io(#[from] io::Error),

  #[error("input closed before a response to: {question}")]
  InputClosed { question: String },
}

/// How an empty answer to a yes/no prompt is treated.
///
/// `yes` and `y` (any case) are always affirmative. Defaults to
/// [`AffirmativePolicy::Explicit`], where a bare return means no.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AffirmativePolicy {
  #[default]
  Explicit,
  DefaultYes,
}

impl AffirmativePolicy {
  fn hint(&self) -> &'static str {
    match self {
      AffirmativePolicy::Explicit => "[y/N]",
      AffirmativePolicy::DefaultYes => "[Y/n]",
    }
  }
}

/// Normalize a yes/no answer under `policy`.
pub fn is_affirmative(input: &str, policy: AffirmativePolicy) -> bool {
  match input.trim().to_ascii_lowercase().as_str() {
    "y" | "yes" => true,
    "" => policy == AffirmativePolicy::DefaultYes,
    _ => false,
  }
}

/// Whether to build the launcher and shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LauncherDecision {
  Skip,
  /// Build it; `args` are appended verbatim to the launch command.
  Create { args: String },
}

/// Source of operator decisions.
pub trait ConfigProvider {
  /// Decide on the launcher for the application in `app_dir`.
  fn launcher_decision(&mut self, app_dir: &Path) -> Result<LauncherDecision, ConfigError>;
}

/// Decisions supplied ahead of time.
#[derive(Debug, Clone)]
pub struct PresetDecisions {
  decision: LauncherDecision,
}

impl PresetDecisions {
  pub fn new(decision: LauncherDecision) -> Self {
    Self { decision }
  }

  pub fn skip() -> Self {
    Self::new(LauncherDecision::Skip)
  }

  pub fn create(args: impl Into<String>) -> Self {
    Self::new(LauncherDecision::Create { args: args.into() })
  }
}

impl ConfigProvider for PresetDecisions {
  fn launcher_decision(&mut self, _app_dir: &Path) -> Result<LauncherDecision, ConfigError> {
    Ok(self.decision.clone())
  }
}

/// Line-oriented prompts over any reader/writer pair.
pub struct InteractivePrompts<R, W> {
  input: R,
  output: W,
  policy: AffirmativePolicy,
}

impl InteractivePrompts<io::StdinLock<'static>, io::Stderr> {
  /// Prompts on stderr, answers from stdin.
  pub fn stdio(policy: AffirmativePolicy) -> Self {
    Self::new(io::stdin().lock(), io::stderr(), policy)
  }
}

impl<R: BufRead, W: Write> InteractivePrompts<R, W> {
  pub fn new(input: R, output: W, policy: AffirmativePolicy) -> Self {
    Self { input, output, policy }
  }

  /// Print `question` and return the trimmed answer line.
  pub fn ask(&mut self, question: &str) -> Result<String, ConfigError> {
    write!(self.output, "{question} ")?;
    self.output.flush()?;

    let mut line = String::new();
    if self.input.read_line(&mut line)? == 0 {
      return Err(ConfigError::InputClosed {
        question: question.to_string(),
      });
    }
    Ok(line.trim().to_string())
  }

  /// Ask a yes/no question under the configured policy.
  pub fn confirm(&mut self, question: &str) -> Result<bool, ConfigError> {
    let answer = self.ask(&format!("{question} {}", self.policy.hint()))?;
    Ok(is_affirmative(&answer, self.policy))
  }
}

impl<R: BufRead, W: Write> ConfigProvider for InteractivePrompts<R, W> {
  fn launcher_decision(&mut self, app_dir: &Path) -> Result<LauncherDecision, ConfigError> {
    if !self.confirm("Create a launcher script and a desktop shortcut?")? {
      return Ok(LauncherDecision::Skip);
    }

    writeln!(
      self.output,
      "See {} for the available command line arguments.",
      app_dir.join(ARGS_REFERENCE_FILE).display()
    )?;
    let args = self.ask("Command line arguments (e.g. --auto-launch --lowvram):")?;
    Ok(LauncherDecision::Create { args })
  }
}
