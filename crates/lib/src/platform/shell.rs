//! Host shell detection and activation incantations

use std::env;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::os::Os;

/// Shell kinds that can activate the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostShell {
  /// sh-compatible shell, including Git Bash/MSYS on Windows
  Posix,
  /// Windows `cmd.exe`
  Cmd,
  /// Windows PowerShell or pwsh
  PowerShell,
}

impl HostShell {
  /// Detect the host shell from the platform and environment
  ///
  /// Non-Windows hosts are always POSIX. On Windows a set `SHELL` means an
  /// MSYS-style shell, `PROMPT` is only defined by `cmd.exe`, and
  /// `PSModulePath` indicates PowerShell.
  pub fn detect(os: Os) -> Self {
    if !os.is_windows() {
      return HostShell::Posix;
    }

    let is_set = |name: &str| env::var_os(name).is_some_and(|v| !v.is_empty());
    if is_set("SHELL") {
      HostShell::Posix
    } else if is_set("PROMPT") {
      HostShell::Cmd
    } else if is_set("PSModulePath") {
      HostShell::PowerShell
    } else {
      HostShell::Cmd
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      HostShell::Posix => "posix",
      HostShell::Cmd => "cmd",
      HostShell::PowerShell => "powershell",
    }
  }

  /// File extension for scripts this shell runs
  pub fn script_extension(&self) -> &'static str {
    match self {
      HostShell::Posix => "sh",
      HostShell::Cmd => "bat",
      HostShell::PowerShell => "ps1",
    }
  }

  /// Name of the activation script a virtual environment ships for this shell
  pub fn activate_script_name(&self) -> &'static str {
    match self {
      HostShell::Posix => "activate",
      HostShell::Cmd => "activate.bat",
      HostShell::PowerShell => "Activate.ps1",
    }
  }

  /// Command that activates the environment through `script`
  pub fn activate_command(&self, script: &Path) -> String {
    match self {
      HostShell::Posix => format!(". \"{}\"", script.display()),
      HostShell::Cmd => format!("call \"{}\"", script.display()),
      HostShell::PowerShell => format!("& \"{}\"", script.display()),
    }
  }

  /// Activation command followed by the separator for a next command
  pub fn activation_prefix(&self, script: &Path) -> String {
    let separator = match self {
      HostShell::Posix | HostShell::Cmd => " && ",
      HostShell::PowerShell => "; ",
    };
    format!("{}{}", self.activate_command(script), separator)
  }

  /// Program and leading arguments that run a command line in this shell
  pub fn invocation(&self) -> (&'static str, Vec<&'static str>) {
    match self {
      HostShell::Posix => {
        let sh = if cfg!(windows) { "sh" } else { "/bin/sh" };
        (sh, vec!["-c"])
      }
      HostShell::Cmd => ("cmd.exe", vec!["/C"]),
      HostShell::PowerShell => (
        "powershell.exe",
        vec!["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"],
      ),
    }
  }
}

impl fmt::Display for HostShell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::path::PathBuf;

  #[test]
  #[serial]
  fn non_windows_hosts_are_posix() {
    temp_env::with_var("PSModulePath", Some(r"C:\ps"), || {
      assert_eq!(HostShell::detect(Os::Linux), HostShell::Posix);
      assert_eq!(HostShell::detect(Os::MacOs), HostShell::Posix);
    });
  }

  #[test]
  #[serial]
  fn windows_prompt_means_cmd() {
    temp_env::with_vars(
      [
        ("SHELL", None::<&str>),
        ("PROMPT", Some("$P$G")),
        ("PSModulePath", Some(r"C:\ps")),
      ],
      || assert_eq!(HostShell::detect(Os::Windows), HostShell::Cmd),
    );
  }

  #[test]
  #[serial]
  fn windows_without_prompt_but_psmodulepath_is_powershell() {
    temp_env::with_vars(
      [
        ("SHELL", None::<&str>),
        ("PROMPT", None::<&str>),
        ("PSModulePath", Some(r"C:\ps")),
      ],
      || assert_eq!(HostShell::detect(Os::Windows), HostShell::PowerShell),
    );
  }

  #[test]
  #[serial]
  fn windows_with_shell_var_is_posix() {
    temp_env::with_vars(
      [("SHELL", Some("/usr/bin/bash")), ("PROMPT", Some("$P$G"))],
      || assert_eq!(HostShell::detect(Os::Windows), HostShell::Posix),
    );
  }

  #[test]
  fn activation_prefixes() {
    let script = PathBuf::from("/srv/app/.venv/bin/activate");
    assert_eq!(
      HostShell::Posix.activation_prefix(&script),
      r#". "/srv/app/.venv/bin/activate" && "#
    );

    let script = PathBuf::from(r"C:\app\.venv\Scripts\activate.bat");
    assert_eq!(
      HostShell::Cmd.activation_prefix(&script),
      r#"call "C:\app\.venv\Scripts\activate.bat" && "#
    );

    let script = PathBuf::from(r"C:\app\.venv\Scripts\Activate.ps1");
    assert_eq!(
      HostShell::PowerShell.activation_prefix(&script),
      r#"& "C:\app\.venv\Scripts\Activate.ps1"; "#
    );
  }

  #[test]
  fn invocation_flags() {
    assert_eq!(HostShell::Cmd.invocation(), ("cmd.exe", vec!["/C"]));
    let (program, args) = HostShell::PowerShell.invocation();
    assert_eq!(program, "powershell.exe");
    assert_eq!(args.last(), Some(&"-Command"));
    assert_eq!(HostShell::Posix.invocation().1, vec!["-c"]);
  }
}
