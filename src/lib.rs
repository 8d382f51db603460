// src/lib.rs

//! Pocketup
//!
//! Manifest-driven installer for the Super Pocket developer toolkit.
//! A declarative TOML manifest pins every dependency (name, source URL,
//! SHA-256 digest, optional `docs`/`dev` group tag); the installer builds
//! an isolated Python virtualenv containing the base package plus exactly
//! the groups enabled by the install flags.
//!
//! # Architecture
//!
//! - Manifest-as-data: the dependency list is immutable records, not logic
//! - All-or-nothing: installs build in a staging prefix promoted by rename;
//!   a failed install never leaves a runnable environment
//! - Digest-verified: every artifact is checked against its SHA-256 before
//!   pip ever sees it; mismatches are fatal and never retried
//! - Pinned interpreter: the environment is built against the exact Python
//!   minor version the manifest names

mod error;
pub mod fetch;
pub mod hash;
pub mod install;
pub mod manifest;
pub mod progress;
pub mod receipt;
pub mod venv;

pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpFetcher, MirrorFetcher};
pub use install::{InstallOptions, InstallPlan, InstallReport, Installer};
pub use manifest::{Group, InstallFlags, Manifest, PackageSpec, Resource};
pub use receipt::{InstalledResource, Receipt};
pub use venv::{Interpreter, Virtualenv};
