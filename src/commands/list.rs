// src/commands/list.rs
//! Installed-environment inspection command

use anyhow::{Context, Result};
use pocketup::receipt::Receipt;
use std::path::Path;

/// Show the installed package set recorded in the environment's receipt
pub fn cmd_list(prefix: &Path, json: bool) -> Result<()> {
    let receipt = Receipt::load(prefix)
        .with_context(|| format!("no environment found at {}", prefix.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&receipt).context("failed to serialize receipt")?
        );
        return Ok(());
    }

    println!(
        "{} {} (Python {}, installed {})",
        receipt.package,
        receipt.version,
        receipt.python_version,
        receipt.installed_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "Flags: with-docs={}, with-dev={}",
        receipt.with_docs, receipt.with_dev
    );
    println!("Dependencies ({}):", receipt.resources.len());
    for resource in &receipt.resources {
        match resource.group {
            Some(group) => println!("  {} ({})", resource.name, group),
            None => println!("  {}", resource.name),
        }
    }
    Ok(())
}
