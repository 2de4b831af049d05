// src/install/patch.rs

//! Base-directory rewrite for relocated executables
//!
//! Distributed launcher scripts compute their support-file location with a
//! line like `BASE_DIR="$(cd "$(dirname "$0")/.." && pwd)"`. Once the script
//! lives in a bin directory away from its `lib/` and `resources/`, that
//! computation is wrong, so the line is replaced with a literal assignment
//! to the install root.
//!
//! Exactly one line may match. Zero or several matches mean the executable
//! is not the version the recipe was written for.

use crate::error::{Error, Result};
use regex::bytes::Regex;
use std::fs;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A single `NAME=...` line substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPatch {
    variable: String,
    install_root: PathBuf,
}

impl ConfigPatch {
    /// Patch `variable` to point at `install_root`
    pub fn new(variable: impl Into<String>, install_root: impl Into<PathBuf>) -> Self {
        Self {
            variable: variable.into(),
            install_root: install_root.into(),
        }
    }

    /// Patch the conventional `BASE_DIR` variable
    pub fn base_dir(install_root: impl Into<PathBuf>) -> Self {
        Self::new("BASE_DIR", install_root)
    }

    /// Variable being rewritten
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The line that replaces the matched assignment, without line ending
    ///
    /// The root is double-quoted; `\`, `"`, `$` and backticks are escaped so
    /// the shell reads the path literally.
    pub fn replacement_line(&self) -> Vec<u8> {
        let root = self.install_root.as_os_str().as_bytes();
        let mut line = Vec::with_capacity(self.variable.len() + root.len() + 3);
        line.extend_from_slice(self.variable.as_bytes());
        line.extend_from_slice(b"=\"");
        for &byte in root {
            if matches!(byte, b'\\' | b'"' | b'$' | b'`') {
                line.push(b'\\');
            }
            line.push(byte);
        }
        line.push(b'"');
        line
    }

    /// Rewrite the matching line in `content`
    ///
    /// Everything outside the matched line is returned byte for byte,
    /// including a trailing `\r` on CRLF files.
    pub fn apply_to_bytes(&self, content: &[u8], path: &Path) -> Result<Vec<u8>> {
        let matches = assignment_lines(&self.variable, content)?;

        match matches.len() {
            0 => Err(Error::PatchTargetNotFound {
                path: path.to_path_buf(),
                variable: self.variable.clone(),
            }),
            1 => {
                let (start, end) = matches[0];
                let replacement = self.replacement_line();
                let mut patched =
                    Vec::with_capacity(content.len() - (end - start) + replacement.len());
                patched.extend_from_slice(&content[..start]);
                patched.extend_from_slice(&replacement);
                patched.extend_from_slice(&content[end..]);
                Ok(patched)
            }
            count => Err(Error::PatchTargetAmbiguous {
                path: path.to_path_buf(),
                variable: self.variable.clone(),
                count,
            }),
        }
    }

    /// Rewrite the file at `path` in place
    ///
    /// The new content goes to a temporary file in the same directory which
    /// then replaces the original, so readers never observe a half-written
    /// executable. Permission bits are carried over.
    pub fn apply(&self, path: &Path) -> Result<()> {
        let write_error = |source| Error::PatchWriteError {
            path: path.to_path_buf(),
            source,
        };

        let content = fs::read(path).map_err(write_error)?;
        let patched = self.apply_to_bytes(&content, path)?;

        let dir = path.parent().unwrap_or(Path::new("."));
        let permissions = fs::metadata(path).map_err(write_error)?.permissions();

        let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
        temp.write_all(&patched).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        fs::set_permissions(temp.path(), permissions).map_err(write_error)?;
        temp.persist(path).map_err(|e| write_error(e.error))?;

        debug!(
            "Patched {} in {} -> {}",
            self.variable,
            path.display(),
            self.install_root.display()
        );
        Ok(())
    }
}

/// Multi-line, byte-oriented pattern for `^NAME=<rest of line>`
///
/// `(?-u)` keeps `[^\n]` matching arbitrary bytes so non-UTF-8 content
/// after the `=` is still covered by the match.
fn assignment_pattern(variable: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?m-u)^{}=[^\n]*", regex::escape(variable)))
        .map_err(|e| Error::InvalidRecipe(format!("patch variable '{}': {}", variable, e)))
}

/// Byte ranges of every assignment line, excluding a CRLF's `\r`
///
/// A `\r` elsewhere in the line is part of the assignment.
fn assignment_lines(variable: &str, content: &[u8]) -> Result<Vec<(usize, usize)>> {
    let pattern = assignment_pattern(variable)?;
    Ok(pattern
        .find_iter(content)
        .map(|m| {
            let end = if content[m.start()..m.end()].ends_with(b"\r") {
                m.end() - 1
            } else {
                m.end()
            };
            (m.start(), end)
        })
        .collect())
}

/// Read back the current value assigned to `variable`, if exactly one line assigns it
pub fn read_assignment(path: &Path, variable: &str) -> Result<Option<String>> {
    let content = fs::read(path)?;
    let found = assignment_lines(variable, &content)?;

    match found.as_slice() {
        [(start, end)] => {
            let line = String::from_utf8_lossy(&content[*start..*end]);
            Ok(line.split_once('=').map(|(_, value)| value.to_string()))
        }
        _ => Ok(None),
    }
}
