// src/install.rs

//! The install engine
//!
//! A single linear pass with an all-or-nothing outcome: select resources by
//! flags, fetch and digest-verify every artifact, build the virtualenv, pip
//! each artifact in manifest order, install the base package last, link the
//! entry point, write the receipt. Everything happens in a `.partial`
//! staging prefix that is promoted by rename only at the very end, so a
//! failed install never leaves a runnable environment behind.
//!
//! Fetches of independent artifacts run as a parallel wave; installation
//! order stays manifest order, and the first failure in manifest order is
//! the one reported.

use crate::error::{Error, Result};
use crate::fetch::{filename_from_url, Fetcher};
use crate::hash;
use crate::manifest::{Group, InstallFlags, Manifest, Resource};
use crate::progress::DownloadProgress;
use crate::receipt::Receipt;
use crate::venv::{Interpreter, Virtualenv};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the virtualenv directory inside the prefix
const LIBEXEC_DIR: &str = "libexec";

/// Name of the entry-point link directory inside the prefix
const BIN_DIR: &str = "bin";

/// Options for one install invocation
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub flags: InstallFlags,
    /// Final environment prefix
    pub prefix: PathBuf,
    /// Explicit interpreter path; otherwise `python{pin}` is searched on PATH
    pub python: Option<PathBuf>,
    /// Replace an existing environment at the prefix
    pub force: bool,
    /// Suppress progress bars
    pub quiet: bool,
}

/// What an install would do, before it does it
#[derive(Debug)]
pub struct InstallPlan<'a> {
    /// Resources to install, in manifest order
    pub resources: Vec<&'a Resource>,
    pub skipped_docs: usize,
    pub skipped_dev: usize,
}

/// Summary of a completed install
#[derive(Debug)]
pub struct InstallReport {
    pub prefix: PathBuf,
    /// Path of the linked entry-point command
    pub entry_point: PathBuf,
    /// Number of dependency resources installed (excluding the base package)
    pub installed_resources: usize,
}

/// One artifact to fetch and verify
struct FetchJob<'a> {
    name: &'a str,
    url: &'a str,
    sha256: &'a str,
}

/// Drives one install of a manifest through a fetcher
pub struct Installer<'a> {
    manifest: &'a Manifest,
    fetcher: &'a dyn Fetcher,
    options: InstallOptions,
}

impl<'a> Installer<'a> {
    pub fn new(manifest: &'a Manifest, fetcher: &'a dyn Fetcher, options: InstallOptions) -> Self {
        Self {
            manifest,
            fetcher,
            options,
        }
    }

    /// Validate the manifest and compute the selected resource set
    pub fn plan(&self) -> Result<InstallPlan<'a>> {
        self.manifest.validate()?;
        let resources = self.manifest.select(self.options.flags);

        let mut skipped_docs = 0;
        let mut skipped_dev = 0;
        for resource in &self.manifest.resources {
            if !self.options.flags.includes(resource.group) {
                match resource.group {
                    Some(Group::Docs) => skipped_docs += 1,
                    Some(Group::Dev) => skipped_dev += 1,
                    None => unreachable!("core resources are never skipped"),
                }
            }
        }

        Ok(InstallPlan {
            resources,
            skipped_docs,
            skipped_dev,
        })
    }

    /// Run the install end to end
    pub fn run(&self) -> Result<InstallReport> {
        let plan = self.plan()?;
        let prefix = &self.options.prefix;

        if prefix.exists() && !self.options.force {
            return Err(Error::EnvironmentError(format!(
                "an environment already exists at {} (use --force to replace it)",
                prefix.display()
            )));
        }

        // Fail fast on a missing interpreter, before any disk writes
        let interpreter =
            Interpreter::locate(&self.manifest.python.version, self.options.python.as_deref())?;

        let staging = staging_path(prefix);
        if staging.exists() {
            warn!("Removing leftover staging tree at {}", staging.display());
            fs::remove_dir_all(&staging).map_err(|e| {
                Error::IoError(format!("failed to remove {}: {e}", staging.display()))
            })?;
        }
        fs::create_dir_all(&staging).map_err(|e| {
            Error::IoError(format!("failed to create {}: {e}", staging.display()))
        })?;

        let result = self.run_staged(&plan, &interpreter, &staging);

        match result {
            Ok(entry_point_name) => {
                // Promote: replace any existing environment wholesale
                if prefix.exists() {
                    fs::remove_dir_all(prefix).map_err(|e| {
                        Error::IoError(format!("failed to remove {}: {e}", prefix.display()))
                    })?;
                }
                fs::rename(&staging, prefix).map_err(|e| {
                    Error::IoError(format!(
                        "failed to move {} to {}: {e}",
                        staging.display(),
                        prefix.display()
                    ))
                })?;

                info!("Installed {} to {}", self.manifest.package.name, prefix.display());
                Ok(InstallReport {
                    prefix: prefix.clone(),
                    entry_point: prefix.join(BIN_DIR).join(entry_point_name),
                    installed_resources: plan.resources.len(),
                })
            }
            Err(e) => {
                // No partial environment is left usable
                if let Err(cleanup_err) = fs::remove_dir_all(&staging) {
                    warn!(
                        "Failed to clean up staging tree {}: {}",
                        staging.display(),
                        cleanup_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Everything that happens inside the staging tree
    fn run_staged(
        &self,
        plan: &InstallPlan<'a>,
        interpreter: &Interpreter,
        staging: &Path,
    ) -> Result<String> {
        let cache_dir = staging.join("cache");

        // Base package is fetched with the wave but installed last
        let mut jobs: Vec<FetchJob<'_>> = plan
            .resources
            .iter()
            .map(|r| FetchJob {
                name: &r.name,
                url: &r.url,
                sha256: &r.sha256,
            })
            .collect();
        jobs.push(FetchJob {
            name: &self.manifest.package.name,
            url: &self.manifest.package.url,
            sha256: &self.manifest.package.sha256,
        });

        let artifacts = self.fetch_all(&jobs, &cache_dir)?;

        let venv = Virtualenv::create(&staging.join(LIBEXEC_DIR), interpreter)?;

        // Sequential installs in manifest order; the manifest is the
        // dependency resolution
        let (base_artifact, resource_artifacts) =
            artifacts.split_last().expect("jobs always include the base package");
        for (resource, artifact) in plan.resources.iter().zip(resource_artifacts) {
            venv.pip_install(&resource.name, artifact)?;
        }
        venv.pip_install(&self.manifest.package.name, base_artifact)?;

        // The cache is a build input, not part of the environment: the
        // promoted prefix is libexec/ + bin/ + receipt.json only
        fs::remove_dir_all(&cache_dir).map_err(|e| {
            Error::IoError(format!("failed to remove {}: {e}", cache_dir.display()))
        })?;

        let entry = &self.manifest.package.entry_point;
        link_entry_point(&venv, staging, entry)?;

        let receipt = Receipt::new(self.manifest, self.options.flags, interpreter.version());
        receipt.save(staging)?;

        Ok(entry.clone())
    }

    /// Fetch and digest-verify every artifact, in parallel.
    ///
    /// Returns artifact paths in job order. The wave runs to completion
    /// even if a fetch fails; the first failure in manifest order is
    /// returned, so no installation step ever runs after any failure.
    fn fetch_all(&self, jobs: &[FetchJob<'_>], cache_dir: &Path) -> Result<Vec<PathBuf>> {
        let progress = (!self.options.quiet).then(|| DownloadProgress::new(jobs.len()));

        let results: Vec<Result<PathBuf>> = jobs
            .par_iter()
            .map(|job| {
                let pb = progress.as_ref().map(|p| p.add_download(job.name));
                let result = self.fetch_one(job, cache_dir, pb.as_ref());

                if let Some(p) = progress.as_ref() {
                    let pb = pb.as_ref().expect("bar exists when progress does");
                    match &result {
                        Ok(_) => p.finish_download(pb, job.name),
                        Err(e) => p.fail_download(pb, job.name, &e.to_string()),
                    }
                }
                result
            })
            .collect();

        if let Some(p) = progress.as_ref() {
            let failed = results.iter().filter(|r| r.is_err()).count();
            p.finish_all(results.len() - failed, failed);
        }

        results.into_iter().collect()
    }

    /// Fetch one artifact and verify it against its manifest digest.
    ///
    /// A digest mismatch removes the fetched file and is never retried:
    /// it may indicate tampering, not just corruption.
    fn fetch_one(
        &self,
        job: &FetchJob<'_>,
        cache_dir: &Path,
        progress: Option<&indicatif::ProgressBar>,
    ) -> Result<PathBuf> {
        // Per-resource subdirectory: keeps the pip-meaningful filename
        // from the URL while ruling out collisions between resources
        let filename = filename_from_url(job.url)
            .ok_or_else(|| Error::DownloadError(format!("no filename in URL: {}", job.url)))?;
        let dest = cache_dir.join(job.name).join(filename);

        self.fetcher.fetch(job.url, &dest, progress)?;

        match hash::verify_file(&dest, job.sha256) {
            Ok(()) => Ok(dest),
            Err(hash::FileVerifyError::Mismatch(e)) => {
                let _ = fs::remove_file(&dest);
                Err(Error::ChecksumMismatch {
                    name: job.name.to_string(),
                    expected: e.expected,
                    actual: e.actual,
                })
            }
            Err(hash::FileVerifyError::Io(e)) => Err(Error::IoError(format!(
                "failed to read {}: {e}",
                dest.display()
            ))),
        }
    }
}

/// Staging tree path: a `.partial` sibling of the final prefix
fn staging_path(prefix: &Path) -> PathBuf {
    let name = prefix
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pocket".to_string());
    prefix.with_file_name(format!("{name}.partial"))
}

/// Link the installed entry-point command into `<prefix>/bin`.
///
/// The link target is relative so it survives the staging rename.
fn link_entry_point(venv: &Virtualenv, staging: &Path, entry: &str) -> Result<()> {
    let installed = venv.entry_point_path(entry);
    if !installed.exists() {
        return Err(Error::InstallError(format!(
            "entry point '{}' was not created by the package install",
            entry
        )));
    }

    let bin_dir = staging.join(BIN_DIR);
    fs::create_dir_all(&bin_dir)
        .map_err(|e| Error::IoError(format!("failed to create {}: {e}", bin_dir.display())))?;

    let link = bin_dir.join(entry);
    let target = Path::new("..").join(LIBEXEC_DIR).join(BIN_DIR).join(entry);

    #[cfg(unix)]
    std::os::unix::fs::symlink(&target, &link).map_err(|e| {
        Error::InstallError(format!("failed to link entry point {}: {e}", link.display()))
    })?;

    #[cfg(not(unix))]
    fs::copy(&installed, &link).map_err(|e| {
        Error::InstallError(format!("failed to copy entry point {}: {e}", link.display()))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MirrorFetcher;

    fn manifest_with_one_resource(resource_hash: &str) -> Manifest {
        let base_hash = crate::hash::sha256_bytes(b"base artifact");
        Manifest::parse(&format!(
            r#"
[package]
name = "super-pocket"
version = "1.0.2"
url = "https://example.com/super-pocket-1.0.2.tar.gz"
sha256 = "{base_hash}"
entry_point = "pocket"

[python]
version = "3.11"

[[resource]]
name = "click"
url = "https://example.com/click-8.3.1.tar.gz"
sha256 = "{resource_hash}"
"#
        ))
        .unwrap()
    }

    fn options(prefix: PathBuf) -> InstallOptions {
        InstallOptions {
            flags: InstallFlags::default(),
            prefix,
            python: None,
            force: false,
            quiet: true,
        }
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("/opt/pocket")),
            PathBuf::from("/opt/pocket.partial")
        );
    }

    #[test]
    fn test_plan_counts_skipped_groups() {
        let hash = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let manifest = Manifest::parse(&format!(
            r#"
[package]
name = "super-pocket"
version = "1.0.2"
url = "https://example.com/super-pocket-1.0.2.tar.gz"
sha256 = "{hash}"
entry_point = "pocket"

[python]
version = "3.11"

[[resource]]
name = "click"
url = "https://example.com/click.tar.gz"
sha256 = "{hash}"

[[resource]]
name = "sphinx"
url = "https://example.com/sphinx.tar.gz"
sha256 = "{hash}"
group = "docs"

[[resource]]
name = "pytest"
url = "https://example.com/pytest.tar.gz"
sha256 = "{hash}"
group = "dev"
"#
        ))
        .unwrap();

        let mirror = tempfile::tempdir().unwrap();
        let fetcher = MirrorFetcher::new(mirror.path());
        let prefix = tempfile::tempdir().unwrap().path().join("pocket");

        let installer = Installer::new(&manifest, &fetcher, options(prefix));
        let plan = installer.plan().unwrap();

        assert_eq!(plan.resources.len(), 1);
        assert_eq!(plan.skipped_docs, 1);
        assert_eq!(plan.skipped_dev, 1);
    }

    #[test]
    fn test_fetch_one_verifies_digest() {
        let mirror = tempfile::tempdir().unwrap();
        std::fs::write(mirror.path().join("click-8.3.1.tar.gz"), b"resource bytes").unwrap();

        let manifest = manifest_with_one_resource(&crate::hash::sha256_bytes(b"resource bytes"));
        let fetcher = MirrorFetcher::new(mirror.path());
        let cache = tempfile::tempdir().unwrap();

        let installer = Installer::new(&manifest, &fetcher, options(PathBuf::from("/unused")));
        let job = FetchJob {
            name: "click",
            url: "https://example.com/click-8.3.1.tar.gz",
            sha256: &manifest.resources[0].sha256,
        };

        let path = installer.fetch_one(&job, cache.path(), None).unwrap();
        assert!(path.ends_with("click/click-8.3.1.tar.gz"));
        assert!(path.exists());
    }

    #[test]
    fn test_fetch_one_removes_corrupt_artifact() {
        let mirror = tempfile::tempdir().unwrap();
        std::fs::write(mirror.path().join("click-8.3.1.tar.gz"), b"tampered bytes").unwrap();

        let expected = crate::hash::sha256_bytes(b"resource bytes");
        let manifest = manifest_with_one_resource(&expected);
        let fetcher = MirrorFetcher::new(mirror.path());
        let cache = tempfile::tempdir().unwrap();

        let installer = Installer::new(&manifest, &fetcher, options(PathBuf::from("/unused")));
        let job = FetchJob {
            name: "click",
            url: "https://example.com/click-8.3.1.tar.gz",
            sha256: &expected,
        };

        let err = installer.fetch_one(&job, cache.path(), None).unwrap_err();
        match err {
            Error::ChecksumMismatch { name, expected: e, actual } => {
                assert_eq!(name, "click");
                assert_eq!(e, expected);
                assert_eq!(actual, crate::hash::sha256_bytes(b"tampered bytes"));
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
        assert!(
            !cache.path().join("click/click-8.3.1.tar.gz").exists(),
            "corrupt artifact must be removed"
        );
    }

    #[test]
    fn test_fetch_one_unreadable_artifact_is_io_error() {
        // A fetcher that claims success without producing the file: the
        // resulting read failure is an io error, not a digest mismatch
        struct VanishingFetcher;
        impl Fetcher for VanishingFetcher {
            fn fetch(
                &self,
                _url: &str,
                _dest: &Path,
                _progress: Option<&indicatif::ProgressBar>,
            ) -> Result<()> {
                Ok(())
            }
        }

        let expected = crate::hash::sha256_bytes(b"resource bytes");
        let manifest = manifest_with_one_resource(&expected);
        let fetcher = VanishingFetcher;
        let cache = tempfile::tempdir().unwrap();

        let installer = Installer::new(&manifest, &fetcher, options(PathBuf::from("/unused")));
        let job = FetchJob {
            name: "click",
            url: "https://example.com/click-8.3.1.tar.gz",
            sha256: &expected,
        };

        let err = installer.fetch_one(&job, cache.path(), None).unwrap_err();
        assert!(matches!(err, Error::IoError(_)), "got {err:?}");
    }

    #[test]
    fn test_fetch_all_reports_first_failure_in_manifest_order() {
        let mirror = tempfile::tempdir().unwrap();
        // Neither artifact exists in the mirror; both fetches fail
        let manifest = manifest_with_one_resource(&crate::hash::sha256_bytes(b"resource bytes"));
        let fetcher = MirrorFetcher::new(mirror.path());
        let cache = tempfile::tempdir().unwrap();

        let installer = Installer::new(&manifest, &fetcher, options(PathBuf::from("/unused")));
        let jobs = vec![
            FetchJob {
                name: "click",
                url: "https://example.com/click-8.3.1.tar.gz",
                sha256: &manifest.resources[0].sha256,
            },
            FetchJob {
                name: "super-pocket",
                url: "https://example.com/super-pocket-1.0.2.tar.gz",
                sha256: &manifest.package.sha256,
            },
        ];

        let err = installer.fetch_all(&jobs, cache.path()).unwrap_err();
        assert!(
            err.to_string().contains("click"),
            "first failing job in manifest order should be reported, got: {err}"
        );
    }

    #[test]
    fn test_run_refuses_existing_prefix_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("pocket");
        std::fs::create_dir_all(&prefix).unwrap();

        let manifest = manifest_with_one_resource(&crate::hash::sha256_bytes(b"resource bytes"));
        let mirror = tempfile::tempdir().unwrap();
        let fetcher = MirrorFetcher::new(mirror.path());

        let installer = Installer::new(&manifest, &fetcher, options(prefix));
        let err = installer.run().unwrap_err();
        assert!(matches!(err, Error::EnvironmentError(_)));
        assert!(err.to_string().contains("--force"));
    }
}
