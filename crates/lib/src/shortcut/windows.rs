use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::{ShortcutCreator, ShortcutError, ShortcutSpec, ensure_parent};
use crate::consts::SHORTCUT_NAME;

/// `.lnk` shortcuts created by driving WScript.Shell from PowerShell.
#[derive(Debug, Default)]
pub struct WindowsShortcut;

impl ShortcutCreator for WindowsShortcut {
  fn file_name(&self) -> Option<String> {
    Some(format!("{SHORTCUT_NAME}.lnk"))
  }

  fn create(&self, spec: &ShortcutSpec) -> Result<PathBuf, ShortcutError> {
    ensure_parent(&spec.location)?;

    let script = wscript_source(spec);
    debug!(script = %script, "creating shortcut via powershell");
    let status = Command::new("powershell")
      .arg("-NoProfile")
      .arg("-Command")
      .arg(script)
      .status()
      .map_err(ShortcutError::Spawn)?;

    if !status.success() {
      return Err(ShortcutError::PowerShellFailed { code: status.code() });
    }
    Ok(spec.location.clone())
  }
}

fn wscript_source(spec: &ShortcutSpec) -> String {
  let quote = |p: &std::path::Path| ps_quote(&p.display().to_string());
  let arguments = spec
    .arguments
    .as_deref()
    .map(|args| format!("$Shortcut.Arguments = {}; ", ps_quote(args)))
    .unwrap_or_default();
  format!(
    "$WshShell = New-Object -ComObject WScript.Shell; \
     $Shortcut = $WshShell.CreateShortcut({lnk}); \
     $Shortcut.TargetPath = {target}; \
     {arguments}\
     $Shortcut.WorkingDirectory = {cwd}; \
     $Shortcut.IconLocation = {icon}; \
     $Shortcut.Description = {desc}; \
     $Shortcut.Save();",
    lnk = quote(&spec.location),
    target = quote(&spec.target),
    cwd = quote(&spec.working_dir),
    icon = quote(&spec.icon),
    desc = ps_quote(&spec.description),
  )
}

fn ps_quote(value: &str) -> String {
  format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn script_sets_every_field() {
    let spec = ShortcutSpec {
      target: PathBuf::from(r"C:\ai\comfyui\run_comfyui.bat"),
      arguments: None,
      working_dir: PathBuf::from(r"C:\ai\comfyui"),
      icon: PathBuf::from(r"C:\ai\comfyui\run_comfyui.bat"),
      description: "Shortcut to run ComfyUI".to_string(),
      location: PathBuf::from(r"C:\Users\op\Desktop\ComfyUI.lnk"),
    };

    let script = wscript_source(&spec);

    assert!(script.contains(r"CreateShortcut('C:\Users\op\Desktop\ComfyUI.lnk')"));
    assert!(script.contains(r"$Shortcut.TargetPath = 'C:\ai\comfyui\run_comfyui.bat'"));
    assert!(script.contains(r"$Shortcut.WorkingDirectory = 'C:\ai\comfyui'"));
    assert!(script.contains("$Shortcut.Description = 'Shortcut to run ComfyUI'"));
    assert!(script.ends_with("$Shortcut.Save();"));
    assert!(!script.contains("Arguments"));
  }

  #[test]
  fn powershell_launcher_sets_interpreter_arguments() {
    let spec = ShortcutSpec {
      target: PathBuf::from("powershell.exe"),
      arguments: Some(r#"-NoProfile -ExecutionPolicy Bypass -File "C:\ai\comfyui\run_comfyui.ps1""#.to_string()),
      working_dir: PathBuf::from(r"C:\ai\comfyui"),
      icon: PathBuf::from(r"C:\ai\comfyui\run_comfyui.ps1"),
      description: "Shortcut to run ComfyUI".to_string(),
      location: PathBuf::from(r"C:\Users\op\Desktop\ComfyUI.lnk"),
    };

    let script = wscript_source(&spec);

    assert!(script.contains("$Shortcut.TargetPath = 'powershell.exe'; "));
    assert!(script.contains(
      r#"$Shortcut.Arguments = '-NoProfile -ExecutionPolicy Bypass -File "C:\ai\comfyui\run_comfyui.ps1"'; "#
    ));
  }

  #[test]
  fn single_quotes_are_doubled() {
    assert_eq!(ps_quote("O'Brien"), "'O''Brien'");
  }
}
