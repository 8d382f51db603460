// src/commands/install.rs
//! Environment installation command

use anyhow::{Context, Result};
use pocketup::fetch::{Fetcher, HttpFetcher, MirrorFetcher};
use pocketup::install::{InstallOptions, Installer};
use pocketup::manifest::{InstallFlags, Manifest};
use std::path::{Path, PathBuf};
use tracing::info;

/// Install the manifest's package and its selected dependency groups
#[allow(clippy::too_many_arguments)]
pub fn cmd_install(
    manifest_path: &Path,
    prefix: &Path,
    with_docs: bool,
    with_dev: bool,
    python: Option<PathBuf>,
    mirror: Option<PathBuf>,
    force: bool,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("failed to load manifest {}", manifest_path.display()))?;

    info!(
        "Installing {} {} from {}",
        manifest.package.name,
        manifest.package.version,
        manifest_path.display()
    );

    let flags = InstallFlags { with_docs, with_dev };

    let fetcher: Box<dyn Fetcher> = match &mirror {
        Some(root) => Box::new(MirrorFetcher::new(root.clone())),
        None => Box::new(HttpFetcher::new().context("failed to create HTTP client")?),
    };

    let options = InstallOptions {
        flags,
        prefix: prefix.to_path_buf(),
        python,
        force,
        quiet,
    };
    let installer = Installer::new(&manifest, fetcher.as_ref(), options);

    if dry_run {
        let plan = installer.plan().context("manifest validation failed")?;
        println!(
            "Would install {} {} plus {} dependencies to {}",
            manifest.package.name,
            manifest.package.version,
            plan.resources.len(),
            prefix.display()
        );
        for resource in &plan.resources {
            match resource.group {
                Some(group) => println!("  {} ({})", resource.name, group),
                None => println!("  {}", resource.name),
            }
        }
        if plan.skipped_docs > 0 {
            println!("Skipping {} docs resources (enable with --with-docs)", plan.skipped_docs);
        }
        if plan.skipped_dev > 0 {
            println!("Skipping {} dev resources (enable with --with-dev)", plan.skipped_dev);
        }
        return Ok(());
    }

    let report = installer
        .run()
        .with_context(|| format!("failed to install {}", manifest.package.name))?;

    println!(
        "Installed {} {} ({} dependencies) to {}",
        manifest.package.name,
        manifest.package.version,
        report.installed_resources,
        report.prefix.display()
    );
    println!("Entry point: {}", report.entry_point.display());

    if let Some(caveats) = &manifest.package.caveats {
        println!("\n{}", caveats.trim_end());
    }

    Ok(())
}
