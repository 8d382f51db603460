// src/venv.rs

//! Pinned-interpreter discovery and virtualenv operations
//!
//! The manifest pins an exact Python minor version; the environment is
//! always built against it. Resources are installed with `pip install
//! --no-deps --no-index`: the manifest is the dependency resolution, pip is
//! only the unpacker.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// A located Python interpreter matching the manifest pin
#[derive(Debug, Clone)]
pub struct Interpreter {
    path: PathBuf,
    version: String,
}

impl Interpreter {
    /// Locate an interpreter for `pin` (e.g. "3.11").
    ///
    /// With `explicit` set, that path is probed and must match the pin.
    /// Otherwise `python{pin}` is searched for on PATH.
    pub fn locate(pin: &str, explicit: Option<&Path>) -> Result<Self> {
        let candidate = match explicit {
            Some(path) => path.to_path_buf(),
            None => find_on_path(&format!("python{pin}")).ok_or_else(|| {
                Error::EnvironmentError(format!(
                    "python{pin} not found on PATH; install Python {pin} or pass --python"
                ))
            })?,
        };
        Self::probe(&candidate, pin)
    }

    /// Run `--version` on a candidate and check it against the pin
    fn probe(path: &Path, pin: &str) -> Result<Self> {
        let output = Command::new(path).arg("--version").output().map_err(|e| {
            Error::EnvironmentError(format!("failed to run {}: {e}", path.display()))
        })?;

        if !output.status.success() {
            return Err(Error::EnvironmentError(format!(
                "{} --version exited with {}",
                path.display(),
                output.status
            )));
        }

        // "Python X.Y.Z" on stdout (stderr on some older builds)
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let version = combined
            .split_whitespace()
            .nth(1)
            .unwrap_or("")
            .to_string();

        if version == pin || version.starts_with(&format!("{pin}.")) {
            debug!("Located Python {} at {}", version, path.display());
            Ok(Self {
                path: path.to_path_buf(),
                version,
            })
        } else {
            Err(Error::EnvironmentError(format!(
                "{} reports Python '{}' but the manifest pins {} \
                 (other versions are unsupported: native-extension wheels \
                 are built against the pinned version)",
                path.display(),
                version,
                pin
            )))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Search PATH for an executable by name
fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// An isolated virtual environment rooted at a directory
#[derive(Debug)]
pub struct Virtualenv {
    root: PathBuf,
}

impl Virtualenv {
    /// Create a fresh virtualenv at `root` using the pinned interpreter
    pub fn create(root: &Path, interpreter: &Interpreter) -> Result<Self> {
        info!(
            "Creating virtualenv at {} with Python {}",
            root.display(),
            interpreter.version()
        );

        let output = Command::new(interpreter.path())
            .args(["-m", "venv", "--clear"])
            .arg(root)
            .output()
            .map_err(|e| {
                Error::EnvironmentError(format!(
                    "failed to run {} -m venv: {e}",
                    interpreter.path().display()
                ))
            })?;

        if !output.status.success() {
            return Err(Error::EnvironmentError(format!(
                "virtualenv creation failed: {}",
                stderr_tail(&output.stderr)
            )));
        }

        let venv = Self {
            root: root.to_path_buf(),
        };

        if !venv.python().exists() {
            return Err(Error::EnvironmentError(format!(
                "virtualenv at {} has no python executable",
                root.display()
            )));
        }

        Ok(venv)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn python(&self) -> PathBuf {
        self.bin_dir().join("python")
    }

    /// Path an installed entry-point script would have inside the venv
    pub fn entry_point_path(&self, entry: &str) -> PathBuf {
        self.bin_dir().join(entry)
    }

    /// Install one verified local artifact into the environment.
    ///
    /// `--no-deps --no-index` keeps pip from resolving or fetching
    /// anything on its own; the manifest already did both.
    pub fn pip_install(&self, name: &str, artifact: &Path) -> Result<()> {
        info!("Installing {} into {}", name, self.root.display());

        let output = Command::new(self.python())
            .args(["-m", "pip", "install", "--no-deps", "--no-index", "--quiet"])
            .arg(artifact)
            .output()
            .map_err(|e| Error::InstallError(format!("failed to run pip for '{name}': {e}")))?;

        if !output.status.success() {
            return Err(Error::InstallError(format!(
                "pip install of '{}' failed: {}",
                name,
                stderr_tail(&output.stderr)
            )));
        }

        Ok(())
    }
}

/// Last lines of a subprocess stderr, for error messages
fn stderr_tail(stderr: &[u8]) -> String {
    const MAX_LINES: usize = 15;

    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return "<no output>".to_string();
    }
    let start = lines.len().saturating_sub(MAX_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn write_stub_interpreter(dir: &Path, reported_version: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("python3.11");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo \"Python {reported_version}\"; exit 0; fi\nexit 1\n"
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_matching_pin() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub_interpreter(dir.path(), "3.11.9");

        let interp = Interpreter::locate("3.11", Some(&stub)).unwrap();
        assert_eq!(interp.version(), "3.11.9");
        assert_eq!(interp.path(), stub.as_path());
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_rejects_wrong_minor() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub_interpreter(dir.path(), "3.12.1");

        let err = Interpreter::locate("3.11", Some(&stub)).unwrap_err();
        assert!(matches!(err, Error::EnvironmentError(_)));
        assert!(err.to_string().contains("pins 3.11"));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_pin_is_not_a_prefix_match() {
        // Python 3.11 must not satisfy a 3.1 pin
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub_interpreter(dir.path(), "3.11.9");

        assert!(Interpreter::locate("3.1", Some(&stub)).is_err());
    }

    #[test]
    fn test_locate_missing_interpreter() {
        let err =
            Interpreter::locate("3.11", Some(Path::new("/nonexistent/python3.11"))).unwrap_err();
        assert!(matches!(err, Error::EnvironmentError(_)));
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let many_lines = (0..100).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(many_lines.as_bytes());
        assert!(tail.starts_with("line 85"));
        assert!(tail.ends_with("line 99"));
    }

    #[test]
    fn test_stderr_tail_empty() {
        assert_eq!(stderr_tail(b""), "<no output>");
    }

    #[test]
    fn test_venv_paths() {
        let venv = Virtualenv {
            root: PathBuf::from("/opt/pocket/libexec"),
        };
        assert_eq!(venv.python(), PathBuf::from("/opt/pocket/libexec/bin/python"));
        assert_eq!(
            venv.entry_point_path("pocket"),
            PathBuf::from("/opt/pocket/libexec/bin/pocket")
        );
    }
}
