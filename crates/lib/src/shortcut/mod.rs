//! Desktop shortcuts pointing at the launcher.
//!
//! Shortcut support differs per platform, so creation sits behind
//! [`ShortcutCreator`], selected once with [`for_os`]:
//! - Windows: `.lnk` written through the WScript.Shell COM object
//! - Linux: a freedesktop `.desktop` entry
//! - macOS: unsupported, the step is skipped

mod desktop_entry;
mod windows;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::consts::SHORTCUT_DESCRIPTION;
use crate::platform::os::Os;
use crate::platform::shell::HostShell;

pub use desktop_entry::DesktopEntry;
pub use windows::WindowsShortcut;

#[derive(Debug, Error)]
pub enum ShortcutError {
  #[error("shortcut target {} has no parent directory", path.display())]
  NoParent { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write shortcut {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("failed to run powershell: {0}")]
  Spawn(#[source] std::io::Error),

  #[error("powershell could not create the shortcut (exit {code:?})")]
  PowerShellFailed { code: Option<i32> },

  #[error("shortcut creation task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

/// Everything needed to persist one shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSpec {
  pub target: PathBuf,
  /// Arguments for `target`; set when the launcher needs an interpreter
  pub arguments: Option<String>,
  pub working_dir: PathBuf,
  pub icon: PathBuf,
  pub description: String,
  /// Full path of the shortcut file
  pub location: PathBuf,
}

impl ShortcutSpec {
  /// Shortcut for `launcher` saved at `location`.
  ///
  /// The working directory is the launcher's directory and the launcher is
  /// its own icon. PowerShell launchers are run through `powershell.exe -File`
  /// since Windows opens `.ps1` files in an editor.
  pub fn for_launcher(launcher: &Path, shell: HostShell, location: PathBuf) -> Result<Self, ShortcutError> {
    let working_dir = launcher
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .ok_or_else(|| ShortcutError::NoParent {
        path: launcher.to_path_buf(),
      })?
      .to_path_buf();

    let (target, arguments) = match shell {
      HostShell::PowerShell => (
        PathBuf::from("powershell.exe"),
        Some(format!(
          "-NoProfile -ExecutionPolicy Bypass -File \"{}\"",
          launcher.display()
        )),
      ),
      HostShell::Posix | HostShell::Cmd => (launcher.to_path_buf(), None),
    };

    Ok(Self {
      target,
      arguments,
      working_dir,
      icon: launcher.to_path_buf(),
      description: SHORTCUT_DESCRIPTION.to_string(),
      location,
    })
  }
}

/// Platform capability for creating desktop shortcuts.
///
/// `create` may block on a helper process; callers on an async runtime run it
/// on the blocking pool.
pub trait ShortcutCreator: Send + Sync {
  /// File name of the shortcut on the desktop; `None` if unsupported.
  fn file_name(&self) -> Option<String>;

  /// Persist the shortcut and return where it was written.
  fn create(&self, spec: &ShortcutSpec) -> Result<PathBuf, ShortcutError>;
}

/// Platforms without a shortcut capability.
#[derive(Debug, Default)]
pub struct Unsupported;

impl ShortcutCreator for Unsupported {
  fn file_name(&self) -> Option<String> {
    None
  }

  fn create(&self, spec: &ShortcutSpec) -> Result<PathBuf, ShortcutError> {
    Ok(spec.location.clone())
  }
}

/// The shortcut capability for `os`.
pub fn for_os(os: Os) -> Arc<dyn ShortcutCreator> {
  match os {
    Os::Windows => Arc::new(WindowsShortcut),
    Os::Linux => Arc::new(DesktopEntry),
    Os::MacOs => Arc::new(Unsupported),
  }
}

fn ensure_parent(location: &Path) -> Result<(), ShortcutError> {
  if let Some(dir) = location.parent() {
    std::fs::create_dir_all(dir).map_err(|source| ShortcutError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn working_dir_is_launcher_parent() {
    let launcher = Path::new("/opt/ai/comfyui/run_comfyui.sh");
    let spec = ShortcutSpec::for_launcher(
      launcher,
      HostShell::Posix,
      PathBuf::from("/home/op/Desktop/comfyui.desktop"),
    )
    .unwrap();

    assert_eq!(spec.target, launcher);
    assert_eq!(spec.arguments, None);
    assert_eq!(spec.working_dir, Path::new("/opt/ai/comfyui"));
    assert_eq!(spec.icon, launcher);
    assert_eq!(spec.description, "Shortcut to run ComfyUI");
  }

  #[test]
  fn bare_file_name_has_no_working_dir() {
    let err = ShortcutSpec::for_launcher(Path::new("run.sh"), HostShell::Posix, PathBuf::from("x")).unwrap_err();
    assert!(matches!(err, ShortcutError::NoParent { .. }));
  }

  #[test]
  fn powershell_launcher_runs_through_interpreter() {
    let launcher = Path::new("ai").join("comfyui").join("run_comfyui.ps1");
    let spec = ShortcutSpec::for_launcher(&launcher, HostShell::PowerShell, PathBuf::from("ComfyUI.lnk")).unwrap();

    assert_eq!(spec.target, Path::new("powershell.exe"));
    assert_eq!(
      spec.arguments,
      Some(format!(
        "-NoProfile -ExecutionPolicy Bypass -File \"{}\"",
        launcher.display()
      ))
    );
    assert_eq!(spec.icon, launcher);
  }

  #[test]
  fn batch_launcher_is_its_own_target() {
    let launcher = Path::new("ai").join("comfyui").join("run_comfyui.bat");
    let spec = ShortcutSpec::for_launcher(&launcher, HostShell::Cmd, PathBuf::from("ComfyUI.lnk")).unwrap();
    assert_eq!(spec.target, launcher);
    assert_eq!(spec.arguments, None);
  }

  #[test]
  fn capability_per_os() {
    assert_eq!(for_os(Os::Windows).file_name().as_deref(), Some("ComfyUI.lnk"));
    assert_eq!(for_os(Os::Linux).file_name().as_deref(), Some("comfyui.desktop"));
    assert_eq!(for_os(Os::MacOs).file_name(), None);
  }
}
