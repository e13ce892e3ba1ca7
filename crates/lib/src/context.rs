//! Installation context resolved once before any step runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::consts::{APP_DIR_NAME, ENV_DIR_NAME};
use crate::platform::os::Os;
use crate::platform::shell::HostShell;

#[derive(Debug, Error)]
pub enum ContextError {
  #[error("unsupported operating system: {0}")]
  UnsupportedOs(&'static str),

  #[error("failed to create install directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize install directory {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

/// Directory layout of the isolated environment on a given OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvLayout {
  root: PathBuf,
  os: Os,
}

impl EnvLayout {
  pub fn new(root: impl Into<PathBuf>, os: Os) -> Self {
    Self { root: root.into(), os }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory holding the environment's executables and activation scripts
  pub fn scripts_dir(&self) -> PathBuf {
    match self.os {
      Os::Windows => self.root.join("Scripts"),
      Os::Linux | Os::MacOs => self.root.join("bin"),
    }
  }

  pub fn activate_script(&self, shell: HostShell) -> PathBuf {
    self.scripts_dir().join(shell.activate_script_name())
  }

  /// The environment's `site-packages` directory
  ///
  /// On POSIX the directory sits under a versioned `lib/pythonX.Y`; the first
  /// such directory is used, falling back to `lib/python3` when none exists yet.
  pub fn site_packages(&self) -> PathBuf {
    match self.os {
      Os::Windows => self.root.join("Lib").join("site-packages"),
      Os::Linux | Os::MacOs => {
        let lib = self.root.join("lib");
        let versioned = fs::read_dir(&lib).ok().and_then(|entries| {
          let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
              p.is_dir()
                && p
                  .file_name()
                  .and_then(|n| n.to_str())
                  .is_some_and(|n| n.starts_with("python"))
            })
            .collect();
          dirs.sort();
          dirs.into_iter().next()
        });
        versioned.unwrap_or_else(|| lib.join("python3")).join("site-packages")
      }
    }
  }

  /// `torch/lib`, the destination of the compatibility binaries
  pub fn torch_lib_dir(&self) -> PathBuf {
    self.site_packages().join("torch").join("lib")
  }
}

/// Paths and host facts shared by every installation step
///
/// Built once at startup; steps only read from it.
#[derive(Debug, Clone, Serialize)]
pub struct InstallContext {
  install_dir: PathBuf,
  app_dir: PathBuf,
  env: EnvLayout,
  shell: HostShell,
  os: Os,
}

impl InstallContext {
  /// Build a context from already-resolved parts
  pub fn new(install_dir: impl Into<PathBuf>, shell: HostShell, os: Os) -> Self {
    let install_dir = install_dir.into();
    let app_dir = install_dir.join(APP_DIR_NAME);
    let env = EnvLayout::new(app_dir.join(ENV_DIR_NAME), os);
    Self {
      install_dir,
      app_dir,
      env,
      shell,
      os,
    }
  }

  /// Resolve a context for the current host
  ///
  /// Creates the install directory when missing so it can be canonicalized.
  /// The host shell is detected unless `shell` overrides it.
  pub fn resolve(install_dir: &Path, shell: Option<HostShell>) -> Result<Self, ContextError> {
    let os = Os::current().ok_or(ContextError::UnsupportedOs(std::env::consts::OS))?;

    fs::create_dir_all(install_dir).map_err(|source| ContextError::CreateDir {
      path: install_dir.to_path_buf(),
      source,
    })?;
    let install_dir = dunce::canonicalize(install_dir).map_err(|source| ContextError::Canonicalize {
      path: install_dir.to_path_buf(),
      source,
    })?;

    let shell = shell.unwrap_or_else(|| HostShell::detect(os));
    Ok(Self::new(install_dir, shell, os))
  }

  pub fn install_dir(&self) -> &Path {
    &self.install_dir
  }

  pub fn app_dir(&self) -> &Path {
    &self.app_dir
  }

  pub fn env(&self) -> &EnvLayout {
    &self.env
  }

  pub fn shell(&self) -> HostShell {
    self.shell
  }

  pub fn os(&self) -> Os {
    self.os
  }

  /// Shell prefix that activates the environment before a following command
  pub fn activation_prefix(&self) -> String {
    self.shell.activation_prefix(&self.env.activate_script(self.shell))
  }

  /// Standalone activation command, as an operator would type it
  pub fn activate_command(&self) -> String {
    self.shell.activate_command(&self.env.activate_script(self.shell))
  }
}
