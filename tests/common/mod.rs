// tests/common/mod.rs

//! Shared helpers for integration tests
//!
//! Installs run hermetically: artifacts come from a `MirrorFetcher`
//! directory and the Python interpreter is a stub shell script that
//! mimics `-m venv` and `-m pip` just enough for the engine. The pip
//! stub logs every installed artifact to `<venv>/installed.txt` and
//! creates the `pocket` entry-point script when the base package lands.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const STUB_INTERPRETER: &str = r#"#!/bin/sh
set -e
if [ "$1" = "--version" ]; then
    echo "Python 3.11.9"
    exit 0
fi
if [ "$1" = "-m" ]; then
    module="$2"
    shift 2
    if [ "$module" = "venv" ]; then
        target=""
        for arg in "$@"; do
            case "$arg" in
                -*) ;;
                *) target="$arg" ;;
            esac
        done
        mkdir -p "$target/bin"
        cp "$0" "$target/bin/python"
        chmod 755 "$target/bin/python"
        exit 0
    fi
    if [ "$module" = "pip" ]; then
        artifact=""
        for arg in "$@"; do
            case "$arg" in
                install|-*) ;;
                *) artifact="$arg" ;;
            esac
        done
        bindir=$(cd "$(dirname "$0")" && pwd)
        base=$(basename "$artifact")
        echo "$base" >> "$bindir/../installed.txt"
        case "$base" in
            super-pocket-*|super_pocket-*)
                printf '#!/bin/sh\nexit 0\n' > "$bindir/pocket"
                chmod 755 "$bindir/pocket"
                ;;
        esac
        exit 0
    fi
fi
exit 1
"#;

/// Write the stub interpreter script into `dir` and return its path
pub fn write_stub_python(dir: &Path) -> PathBuf {
    let path = dir.join("python3.11");
    std::fs::write(&path, STUB_INTERPRETER).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Place an artifact in the mirror directory and return its SHA-256
pub fn add_artifact(mirror: &Path, filename: &str, content: &[u8]) -> String {
    std::fs::write(mirror.join(filename), content).unwrap();
    pocketup::hash::sha256_bytes(content)
}

/// A manifest with 3 core, 2 docs and 1 dev resource, all backed by
/// artifacts placed in `mirror`
pub fn standard_manifest(mirror: &Path) -> pocketup::Manifest {
    let base = add_artifact(mirror, "super-pocket-1.0.2.tar.gz", b"base package");
    let click = add_artifact(mirror, "click-8.3.1.tar.gz", b"click");
    let pyyaml = add_artifact(mirror, "pyyaml-6.0.3.tar.gz", b"pyyaml");
    let requests = add_artifact(mirror, "requests-2.32.0.tar.gz", b"requests");
    let sphinx = add_artifact(mirror, "sphinx-8.2.0.tar.gz", b"sphinx");
    let alabaster = add_artifact(mirror, "alabaster-1.0.0.tar.gz", b"alabaster");
    let pytest = add_artifact(mirror, "pytest-8.3.0.tar.gz", b"pytest");

    pocketup::Manifest::parse(&format!(
        r#"
[package]
name = "super-pocket"
version = "1.0.2"
url = "https://mirror.invalid/super-pocket-1.0.2.tar.gz"
sha256 = "{base}"
entry_point = "pocket"

[python]
version = "3.11"

[[resource]]
name = "click"
url = "https://mirror.invalid/click-8.3.1.tar.gz"
sha256 = "{click}"

[[resource]]
name = "pyyaml"
url = "https://mirror.invalid/pyyaml-6.0.3.tar.gz"
sha256 = "{pyyaml}"

[[resource]]
name = "requests"
url = "https://mirror.invalid/requests-2.32.0.tar.gz"
sha256 = "{requests}"

[[resource]]
name = "sphinx"
url = "https://mirror.invalid/sphinx-8.2.0.tar.gz"
sha256 = "{sphinx}"
group = "docs"

[[resource]]
name = "alabaster"
url = "https://mirror.invalid/alabaster-1.0.0.tar.gz"
sha256 = "{alabaster}"
group = "docs"

[[resource]]
name = "pytest"
url = "https://mirror.invalid/pytest-8.3.0.tar.gz"
sha256 = "{pytest}"
group = "dev"
"#
    ))
    .unwrap()
}

/// Read the pip stub's install log from an installed prefix
pub fn installed_log(prefix: &Path) -> Vec<String> {
    let log = prefix.join("libexec/installed.txt");
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(|l| l.to_string())
        .collect()
}
