//! Host platform facts: OS, user directories and the shell in use.

pub mod os;
pub mod paths;
pub mod shell;

use os::Os;
use serde::Serialize;

/// Host OS plus CPU architecture, as reported by `comfyzl info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Platform {
  pub arch: &'static str,
  pub os: Os,
}

impl Platform {
  /// `None` when the OS is not one the installer supports
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: std::env::consts::ARCH,
      os: Os::current()?,
    })
  }

  /// e.g. `x86_64-windows`
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}
