use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Result, bail};

use comfyzl_lib::configure::{AffirmativePolicy, InteractivePrompts};

/// Whether both ends of the prompt are attached to a terminal.
pub fn is_interactive() -> bool {
  io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Interactive prompts on the terminal, or an error when there is none.
pub fn terminal_prompts(policy: AffirmativePolicy) -> Result<InteractivePrompts<io::StdinLock<'static>, io::Stderr>> {
  if !is_interactive() {
    bail!(
      "Cannot prompt in non-interactive mode. Use --no-input with --install-dir and optionally --launcher-args."
    );
  }
  Ok(InteractivePrompts::stdio(policy))
}

/// Ask for the install directory until a non-empty answer is given.
pub fn ask_install_dir(prompts: &mut InteractivePrompts<io::StdinLock<'static>, io::Stderr>) -> Result<PathBuf> {
  loop {
    let answer = prompts.ask("Enter the directory where ComfyUI should be installed:")?;
    if !answer.is_empty() {
      return Ok(PathBuf::from(answer));
    }
  }
}
