// src/receipt.rs

//! Install receipt
//!
//! A `receipt.json` at the prefix root records what an install put into the
//! environment. Its presence marks the prefix as pocketup-owned: `uninstall`
//! refuses to remove a directory without one, and `list`/`check` read it.

use crate::error::{Error, Result};
use crate::manifest::{Group, InstallFlags, Manifest, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const RECEIPT_FILENAME: &str = "receipt.json";

/// One installed dependency as recorded in the receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledResource {
    pub name: String,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
}

impl From<&Resource> for InstalledResource {
    fn from(r: &Resource) -> Self {
        Self {
            name: r.name.clone(),
            sha256: r.sha256.clone(),
            group: r.group,
        }
    }
}

/// Record of a completed install, written as the final step before the
/// staging prefix is promoted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub package: String,
    pub version: String,
    pub entry_point: String,
    pub python_version: String,
    pub with_docs: bool,
    pub with_dev: bool,
    pub resources: Vec<InstalledResource>,
    pub installed_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt for the resources selected from `manifest` by `flags`
    pub fn new(manifest: &Manifest, flags: InstallFlags, python_version: &str) -> Self {
        Self {
            package: manifest.package.name.clone(),
            version: manifest.package.version.clone(),
            entry_point: manifest.package.entry_point.clone(),
            python_version: python_version.to_string(),
            with_docs: flags.with_docs,
            with_dev: flags.with_dev,
            resources: manifest
                .select(flags)
                .into_iter()
                .map(InstalledResource::from)
                .collect(),
            installed_at: Utc::now(),
        }
    }

    /// Write the receipt to `<prefix>/receipt.json`
    pub fn save(&self, prefix: &Path) -> Result<()> {
        let path = prefix.join(RECEIPT_FILENAME);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::IoError(format!("failed to serialize receipt: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| Error::IoError(format!("failed to write {}: {e}", path.display())))?;
        Ok(())
    }

    /// Load the receipt from `<prefix>/receipt.json`
    pub fn load(prefix: &Path) -> Result<Self> {
        let path = prefix.join(RECEIPT_FILENAME);
        if !path.exists() {
            return Err(Error::NotFoundError(format!(
                "no install receipt at {} (not a pocketup environment?)",
                path.display()
            )));
        }
        let json = std::fs::read_to_string(&path)
            .map_err(|e| Error::IoError(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::IoError(format!("failed to parse {}: {e}", path.display())))
    }

    /// Installed resource names, in install order
    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}
