// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Launcher that resolves its base dir relative to itself, like the real `ubo`
pub const UBO_LAUNCHER: &str = r#"#!/bin/sh
set -e
BASE_DIR="$(cd "$(dirname "$0")/.." && pwd)"
. "$BASE_DIR/lib/common.sh"

case "$1" in
  version) echo "ubo $UBO_VERSION" ;;
  where) echo "$BASE_DIR" ;;
  *) echo "usage: ubo version" >&2; exit 1 ;;
esac
"#;

/// Builder for an extracted source tree laid out as `bin/`, `lib/`, `resources/`
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    /// Create the tree at `dir/<name>` with a working `ubo` launcher
    pub fn ubo(dir: &Path) -> Self {
        let tree = Self {
            root: dir.join("ubo-0.1.0"),
        };
        tree.executable("ubo", UBO_LAUNCHER)
            .file("lib/common.sh", "UBO_VERSION=0.1.0\n")
            .file("lib/a.txt", "library data\n")
            .file("resources/b.txt", "resource data\n")
            .file("resources/icons/app.icns", "icon\n")
    }

    /// Create an empty tree at `dir/<name>`
    pub fn empty(dir: &Path, name: &str) -> Self {
        let root = dir.join(name);
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn executable(self, name: &str, content: &str) -> Self {
        let path = self.root.join("bin").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        self
    }

    pub fn remove(self, relative: &str) -> Self {
        let path = self.root.join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).unwrap();
        } else {
            fs::remove_file(&path).unwrap();
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Pack the tree as a release-style `.tar.gz` with a single top-level dir
    pub fn pack(&self, dest: &Path) -> PathBuf {
        let file = File::create(dest).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let prefix = self.root.file_name().unwrap();
        builder.append_dir_all(prefix, &self.root).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        dest.to_path_buf()
    }
}

/// Every regular file under `dir`, relative path to content
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(dir).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

/// Recipe text pointing at a local archive
pub fn recipe_for(archive: &Path, sha256: &str) -> String {
    format!(
        r#"
[package]
name = "ubo"
version = "0.1.0"
description = "One-command uBlock Origin installer for Google Chrome on macOS"
homepage = "https://github.com/neel49/ubo"
license = "MIT"

[source]
url = "{}"
sha256 = "{}"

[caveats]
text = """
To set up uBlock Origin in Chrome, run:
  ubo install
"""

[test]
expect = "ubo"
"#,
        archive.display(),
        sha256
    )
}
