// src/manifest.rs

//! Declarative install manifest
//!
//! A manifest is static data authored once: the base package, the pinned
//! interpreter, and an ordered list of dependency resources with SHA-256
//! digests. Manifest order is installation order. Resources optionally carry
//! a group tag (`docs` or `dev`) gating them behind install flags; untagged
//! resources are unconditional.

use crate::error::{Error, Result};
use crate::hash::Checksum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Optional feature group a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Documentation build dependencies (Sphinx stack)
    Docs,
    /// Development dependencies (pytest stack)
    Dev,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docs => write!(f, "docs"),
            Self::Dev => write!(f, "dev"),
        }
    }
}

/// One named dependency: where to fetch it and what it must hash to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
}

/// The tool being packaged: installed last, after every selected resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
    pub url: String,
    pub sha256: String,
    /// Command name exposed on the environment's bin path
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Post-install notes shown to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveats: Option<String>,
}

/// Interpreter pin. The environment must be built against exactly this
/// minor version: at least two native-extension resources ship wheels
/// built for it, and other versions are unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonSpec {
    pub version: String,
}

/// Build flags gating optional resource groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallFlags {
    pub with_docs: bool,
    pub with_dev: bool,
}

impl InstallFlags {
    /// Whether a resource in `group` should be installed under these flags
    pub fn includes(&self, group: Option<Group>) -> bool {
        match group {
            None => true,
            Some(Group::Docs) => self.with_docs,
            Some(Group::Dev) => self.with_dev,
        }
    }
}

/// Per-group resource counts, for lint output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub core: usize,
    pub docs: usize,
    pub dev: usize,
}

/// A parsed, validated install manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageSpec,
    pub python: PythonSpec,
    #[serde(default, rename = "resource")]
    pub resources: Vec<Resource>,
}

impl Manifest {
    /// Load and validate a manifest from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ManifestError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a manifest from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)
            .map_err(|e| Error::ManifestError(format!("failed to parse TOML: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the structural invariants: unique names and well-formed digests
    pub fn validate(&self) -> Result<()> {
        if self.package.name.is_empty() {
            return Err(Error::ManifestError("package name is empty".to_string()));
        }
        if self.package.entry_point.is_empty() {
            return Err(Error::ManifestError(
                "package entry_point is empty".to_string(),
            ));
        }
        validate_python_pin(&self.python.version)?;

        self.package.sha256.parse::<Checksum>().map_err(|e| {
            Error::ManifestError(format!(
                "package '{}' has an invalid sha256: {}",
                self.package.name, e
            ))
        })?;

        let mut seen = HashSet::new();
        seen.insert(self.package.name.as_str());

        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(Error::ManifestError("resource with empty name".to_string()));
            }
            if !seen.insert(resource.name.as_str()) {
                return Err(Error::ManifestError(format!(
                    "duplicate resource name: '{}'",
                    resource.name
                )));
            }
            if resource.url.is_empty() {
                return Err(Error::ManifestError(format!(
                    "resource '{}' has an empty url",
                    resource.name
                )));
            }
            resource.sha256.parse::<Checksum>().map_err(|e| {
                Error::ManifestError(format!(
                    "resource '{}' has an invalid sha256: {}",
                    resource.name, e
                ))
            })?;
        }

        Ok(())
    }

    /// Select the resources applicable under `flags`, in manifest order.
    ///
    /// Skips docs-tagged resources unless `with_docs`, dev-tagged resources
    /// unless `with_dev`. Untagged (core) resources are always included.
    pub fn select(&self, flags: InstallFlags) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| flags.includes(r.group))
            .collect()
    }

    /// Count resources per group
    pub fn counts(&self) -> GroupCounts {
        let mut counts = GroupCounts::default();
        for resource in &self.resources {
            match resource.group {
                None => counts.core += 1,
                Some(Group::Docs) => counts.docs += 1,
                Some(Group::Dev) => counts.dev += 1,
            }
        }
        counts
    }
}

/// A pin must be a `major.minor` version like "3.11"
fn validate_python_pin(version: &str) -> Result<()> {
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = parts.len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if well_formed {
        Ok(())
    } else {
        Err(Error::ManifestError(format!(
            "python pin '{}' is not a major.minor version",
            version
        )))
    }
}
