use std::fs;
use std::path::{Path, PathBuf};

use super::{ShortcutCreator, ShortcutError, ShortcutSpec, ensure_parent};
use crate::consts::{APP_DIR_NAME, SHORTCUT_NAME};

/// freedesktop.org `.desktop` launchers.
#[derive(Debug, Default)]
pub struct DesktopEntry;

impl ShortcutCreator for DesktopEntry {
  fn file_name(&self) -> Option<String> {
    Some(format!("{APP_DIR_NAME}.desktop"))
  }

  fn create(&self, spec: &ShortcutSpec) -> Result<PathBuf, ShortcutError> {
    ensure_parent(&spec.location)?;
    fs::write(&spec.location, render(spec)).map_err(|source| ShortcutError::Write {
      path: spec.location.clone(),
      source,
    })?;
    mark_trusted(&spec.location)?;
    Ok(spec.location.clone())
  }
}

fn render(spec: &ShortcutSpec) -> String {
  format!(
    "[Desktop Entry]\n\
     Type=Application\n\
     Name={SHORTCUT_NAME}\n\
     Comment={}\n\
     Exec={}\n\
     Path={}\n\
     Icon={}\n\
     Terminal=true\n",
    spec.description,
    exec_line(spec),
    spec.working_dir.display(),
    spec.icon.display(),
  )
}

fn exec_line(spec: &ShortcutSpec) -> String {
  match &spec.arguments {
    Some(args) => format!("{} {args}", exec_quote(&spec.target)),
    None => exec_quote(&spec.target),
  }
}

/// Quote a path for the `Exec` key.
fn exec_quote(path: &Path) -> String {
  let mut out = String::from("\"");
  for c in path.display().to_string().chars() {
    if matches!(c, '"' | '`' | '$' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('"');
  out
}

// Desktop environments refuse to run entries that are not executable.
#[cfg(unix)]
fn mark_trusted(path: &Path) -> Result<(), ShortcutError> {
  use std::os::unix::fs::PermissionsExt;

  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| ShortcutError::Write {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(not(unix))]
fn mark_trusted(_path: &Path) -> Result<(), ShortcutError> {
  Ok(())
}
