//! Implementation of the `comfyzl patch` command.
//!
//! Re-applies the compatibility binaries to an existing installation, e.g.
//! after a torch upgrade replaced them.

use std::path::Path;

use anyhow::{Context, Result, bail};

use comfyzl_lib::context::InstallContext;
use comfyzl_lib::patch::{EntryOutcome, PatchManifest, apply_patches};

use crate::output::{self, OutputFormat};

pub fn cmd_patch(install_dir: &Path, format: OutputFormat) -> Result<()> {
  if !install_dir.is_dir() {
    bail!("install directory {} does not exist", install_dir.display());
  }

  let ctx = InstallContext::resolve(install_dir, None)
    .with_context(|| format!("Failed to prepare {}", install_dir.display()))?;
  let manifest = PatchManifest::for_context(&ctx);
  let report = apply_patches(&manifest).context("Patch phase failed")?;

  if format.is_json() {
    return output::print_json(&report);
  }

  for outcome in &report.outcomes {
    match outcome {
      EntryOutcome::Copied { from, to } => output::print_success(&format!(
        "Copied {} to {}",
        from.file_name().unwrap_or_default().to_string_lossy(),
        to.display()
      )),
      EntryOutcome::Missing { path } => output::print_error(&format!("{} does not exist", path.display())),
      EntryOutcome::Failed { path, reason } => {
        output::print_error(&format!("Could not copy to {}: {reason}", path.display()))
      }
    }
  }
  output::print_stat(
    "Patch",
    &format!("{} copied, {} error(s)", report.copied(), report.errors()),
  );
  Ok(())
}
