//! Compatibility binaries copied into `torch/lib`.
//!
//! Each manifest entry is attempted independently: a missing or uncopyable
//! file is recorded and the next entry is still processed. Only an absent
//! source directory stops the phase, before any entry is attempted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::consts::{DEFAULT_PATCHES, PATCH_SOURCE_DIR};
use crate::context::InstallContext;

#[derive(Debug, Error)]
pub enum PatchError {
  #[error("compatibility binary directory {} does not exist", path.display())]
  SourceDirMissing { path: PathBuf },
}

/// One file to copy: source name in the vendor directory, destination name in `torch/lib`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchEntry {
  pub source: String,
  pub dest: String,
}

impl PatchEntry {
  pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      dest: dest.into(),
    }
  }
}

/// Ordered set of files to copy between two directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchManifest {
  pub source_dir: PathBuf,
  pub dest_dir: PathBuf,
  pub entries: Vec<PatchEntry>,
}

impl PatchManifest {
  /// Default entries from the app's `zluda/renamed_dlls` into the environment's `torch/lib`.
  pub fn for_context(ctx: &InstallContext) -> Self {
    let source_dir = PATCH_SOURCE_DIR
      .iter()
      .fold(ctx.app_dir().to_path_buf(), |dir, part| dir.join(part));
    Self {
      source_dir,
      dest_dir: ctx.env().torch_lib_dir(),
      entries: default_entries(),
    }
  }
}

pub fn default_entries() -> Vec<PatchEntry> {
  DEFAULT_PATCHES
    .iter()
    .map(|(source, dest)| PatchEntry::new(*source, *dest))
    .collect()
}

/// Result of one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
  Copied { from: PathBuf, to: PathBuf },
  Missing { path: PathBuf },
  Failed { path: PathBuf, reason: String },
}

impl EntryOutcome {
  pub fn is_error(&self) -> bool {
    !matches!(self, EntryOutcome::Copied { .. })
  }
}

/// Per-entry results, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
  pub outcomes: Vec<EntryOutcome>,
}

impl PatchReport {
  pub fn copied(&self) -> usize {
    self.outcomes.iter().filter(|o| !o.is_error()).count()
  }

  pub fn errors(&self) -> usize {
    self.outcomes.iter().filter(|o| o.is_error()).count()
  }
}

/// Copy every manifest entry, overwriting files already in place.
pub fn apply_patches(manifest: &PatchManifest) -> Result<PatchReport, PatchError> {
  if !manifest.source_dir.is_dir() {
    return Err(PatchError::SourceDirMissing {
      path: manifest.source_dir.clone(),
    });
  }

  info!(
    from = %manifest.source_dir.display(),
    to = %manifest.dest_dir.display(),
    "copying compatibility binaries"
  );
  let outcomes = manifest
    .entries
    .iter()
    .map(|entry| copy_entry(&manifest.source_dir, &manifest.dest_dir, entry))
    .collect();
  Ok(PatchReport { outcomes })
}

fn copy_entry(source_dir: &Path, dest_dir: &Path, entry: &PatchEntry) -> EntryOutcome {
  let from = source_dir.join(&entry.source);
  let to = dest_dir.join(&entry.dest);

  if !from.is_file() {
    error!(path = %from.display(), "compatibility binary does not exist");
    return EntryOutcome::Missing { path: from };
  }

  match fs::copy(&from, &to) {
    Ok(_) => {
      info!(file = %entry.source, dest = %to.display(), "copied compatibility binary");
      EntryOutcome::Copied { from, to }
    }
    Err(e) => {
      error!(path = %to.display(), error = %e, "failed to copy compatibility binary");
      EntryOutcome::Failed {
        path: to,
        reason: e.to_string(),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn manifest(temp: &TempDir) -> PatchManifest {
    let source_dir = temp.path().join("renamed_dlls");
    let dest_dir = temp.path().join("torch").join("lib");
    fs::create_dir_all(&source_dir).unwrap();
    fs::create_dir_all(&dest_dir).unwrap();
    PatchManifest {
      source_dir,
      dest_dir,
      entries: default_entries(),
    }
  }

  #[test]
  #[traced_test]
  fn one_missing_file_does_not_block_the_other() {
    let temp = TempDir::new().unwrap();
    let manifest = manifest(&temp);
    fs::write(manifest.source_dir.join("cusparse64_11.dll"), b"zluda").unwrap();

    let report = apply_patches(&manifest).unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.copied(), 1);
    assert_eq!(report.errors(), 1);
    assert!(matches!(report.outcomes[0], EntryOutcome::Missing { .. }));
    assert_eq!(fs::read(manifest.dest_dir.join("cusparse64_11.dll")).unwrap(), b"zluda");
    logs_assert(|lines: &[&str]| {
      match lines
        .iter()
        .filter(|line| line.contains("compatibility binary does not exist"))
        .count()
      {
        1 => Ok(()),
        n => Err(format!("expected one missing-binary error, logged {n}")),
      }
    });
  }

  #[test]
  fn existing_destination_files_are_overwritten() {
    let temp = TempDir::new().unwrap();
    let manifest = manifest(&temp);
    for (name, _) in DEFAULT_PATCHES {
      fs::write(manifest.source_dir.join(name), b"new").unwrap();
      fs::write(manifest.dest_dir.join(name), b"old nvidia build").unwrap();
    }

    let report = apply_patches(&manifest).unwrap();

    assert_eq!(report.copied(), 2);
    for (_, dest) in DEFAULT_PATCHES {
      assert_eq!(fs::read(manifest.dest_dir.join(dest)).unwrap(), b"new");
    }
  }

  #[test]
  fn absent_source_dir_aborts_before_any_entry() {
    let temp = TempDir::new().unwrap();
    let mut manifest = manifest(&temp);
    manifest.source_dir = temp.path().join("nope");

    let err = apply_patches(&manifest).unwrap_err();

    assert!(matches!(err, PatchError::SourceDirMissing { .. }));
    assert!(err.to_string().contains("nope"));
    assert_eq!(fs::read_dir(&manifest.dest_dir).unwrap().count(), 0);
  }

  #[test]
  fn missing_destination_dir_is_recorded_per_entry() {
    let temp = TempDir::new().unwrap();
    let mut manifest = manifest(&temp);
    manifest.dest_dir = temp.path().join("no-torch");
    for (name, _) in DEFAULT_PATCHES {
      fs::write(manifest.source_dir.join(name), b"x").unwrap();
    }

    let report = apply_patches(&manifest).unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|o| matches!(o, EntryOutcome::Failed { .. })));
  }

  #[test]
  fn destination_name_can_differ_from_source() {
    let temp = TempDir::new().unwrap();
    let mut manifest = manifest(&temp);
    manifest.entries = vec![PatchEntry::new("cublas.dll", "cublas64_11.dll")];
    fs::write(manifest.source_dir.join("cublas.dll"), b"renamed").unwrap();

    apply_patches(&manifest).unwrap();

    assert_eq!(fs::read(manifest.dest_dir.join("cublas64_11.dll")).unwrap(), b"renamed");
  }
}
