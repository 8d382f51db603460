// src/commands/lint.rs
//! Manifest validation command

use anyhow::{Context, Result};
use pocketup::manifest::Manifest;
use std::path::Path;

/// Validate a manifest and report per-group record counts
pub fn cmd_lint(manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("manifest {} is invalid", manifest_path.display()))?;

    let counts = manifest.counts();
    println!(
        "{} {} (Python {}): {} resources",
        manifest.package.name,
        manifest.package.version,
        manifest.python.version,
        manifest.resources.len()
    );
    println!("  core: {}", counts.core);
    println!("  docs: {}", counts.docs);
    println!("  dev:  {}", counts.dev);
    println!("OK");
    Ok(())
}
