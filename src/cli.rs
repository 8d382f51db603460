// src/cli.rs
//! CLI definitions for pocketup
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Default environment prefix
pub const DEFAULT_PREFIX: &str = "/opt/pocket";

/// Default manifest path
pub const DEFAULT_MANIFEST: &str = "manifests/super-pocket.toml";

#[derive(Parser)]
#[command(name = "pocketup")]
#[command(author = "Pocketup Contributors")]
#[command(version)]
#[command(about = "Manifest-driven installer for the Super Pocket developer toolkit", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install the package and its selected dependency groups
    Install {
        /// Path to the install manifest
        #[arg(short, long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Environment prefix directory
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        prefix: PathBuf,

        /// Include documentation build dependencies (Sphinx stack)
        #[arg(long)]
        with_docs: bool,

        /// Include development dependencies (pytest stack)
        #[arg(long)]
        with_dev: bool,

        /// Explicit Python interpreter path (must match the manifest pin)
        #[arg(long)]
        python: Option<PathBuf>,

        /// Fetch artifacts from a local mirror directory instead of the network
        #[arg(long)]
        mirror: Option<PathBuf>,

        /// Replace an existing environment at the prefix
        #[arg(long)]
        force: bool,

        /// Show what would be installed without making changes
        #[arg(long)]
        dry_run: bool,

        /// Suppress progress bars
        #[arg(short, long)]
        quiet: bool,
    },

    /// Remove an installed environment
    Uninstall {
        /// Environment prefix directory
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        prefix: PathBuf,
    },

    /// Show the installed package set
    List {
        /// Environment prefix directory
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        prefix: PathBuf,

        /// Output the receipt as JSON
        #[arg(long)]
        json: bool,
    },

    /// Smoke-test an installed environment (entry point must answer --help)
    Check {
        /// Environment prefix directory
        #[arg(short, long, default_value = DEFAULT_PREFIX)]
        prefix: PathBuf,
    },

    /// Validate a manifest and report group counts
    Lint {
        /// Path to the install manifest
        #[arg(short, long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
