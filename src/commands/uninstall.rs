// src/commands/uninstall.rs
//! Environment removal command

use anyhow::{Context, Result};
use pocketup::receipt::Receipt;
use std::path::Path;
use tracing::info;

/// Remove an installed environment wholesale.
///
/// Refuses to delete a prefix that carries no install receipt, so it never
/// removes a directory pocketup does not own.
pub fn cmd_uninstall(prefix: &Path) -> Result<()> {
    let receipt = Receipt::load(prefix)
        .with_context(|| format!("refusing to remove {}", prefix.display()))?;

    info!("Uninstalling {} from {}", receipt.package, prefix.display());

    std::fs::remove_dir_all(prefix)
        .with_context(|| format!("failed to remove {}", prefix.display()))?;

    println!(
        "Removed {} {} from {}",
        receipt.package,
        receipt.version,
        prefix.display()
    );
    Ok(())
}
