// src/commands/check.rs
//! Post-install smoke test command

use anyhow::{bail, Context, Result};
use pocketup::receipt::Receipt;
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Smoke-test an installed environment: the entry-point command must
/// answer `--help` with exit code 0.
pub fn cmd_check(prefix: &Path) -> Result<()> {
    let receipt = Receipt::load(prefix)
        .with_context(|| format!("no environment found at {}", prefix.display()))?;

    let entry = prefix.join("bin").join(&receipt.entry_point);
    if !entry.exists() {
        bail!("entry point {} does not exist", entry.display());
    }

    info!("Running {} --help", entry.display());
    let status = Command::new(&entry)
        .arg("--help")
        .output()
        .with_context(|| format!("failed to run {}", entry.display()))?
        .status;

    if !status.success() {
        bail!(
            "{} --help exited with {} (environment is broken)",
            entry.display(),
            status
        );
    }

    println!("{} --help: OK", receipt.entry_point);
    Ok(())
}
