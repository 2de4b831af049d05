// src/filesystem/path.rs

//! Path checks for entries coming out of untrusted archives
//!
//! Source archives are verified by checksum, but the checksum only proves
//! the archive is the one the recipe names. Entry paths and symlink targets
//! are still checked so extraction never writes outside its destination.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Validate an archive entry path and return it in normalized relative form
///
/// Rejects absolute paths and any `..` component. `.` components are
/// dropped. Empty results (e.g. the `./` entry many tarballs start with)
/// return `Ok(None)`.
///
/// # Examples
///
/// ```
/// use relocator::filesystem::path::archive_entry_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     archive_entry_path("ubo-0.1.0/bin/ubo").unwrap(),
///     Some(PathBuf::from("ubo-0.1.0/bin/ubo"))
/// );
/// assert_eq!(archive_entry_path("./").unwrap(), None);
/// assert!(archive_entry_path("../etc/passwd").is_err());
/// assert!(archive_entry_path("/etc/passwd").is_err());
/// ```
pub fn archive_entry_path(path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::ArchiveError(format!(
                    "entry escapes extraction root: {}",
                    path.display()
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::ArchiveError(format!(
                    "absolute entry path: {}",
                    path.display()
                )));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(normalized))
    }
}

/// Check that a symlink at `entry` pointing to `target` stays inside the archive root
///
/// `entry` is the normalized relative path of the link itself. Absolute
/// targets and relative targets that climb above the root are rejected.
pub fn check_link_target(entry: &Path, target: &Path) -> Result<()> {
    let escapes = || {
        Error::ArchiveError(format!(
            "link {} -> {} points outside extraction root",
            entry.display(),
            target.display()
        ))
    };

    let mut depth = entry.components().count().saturating_sub(1);
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => depth = depth.checked_sub(1).ok_or_else(escapes)?,
            Component::Prefix(_) | Component::RootDir => return Err(escapes()),
        }
    }
    Ok(())
}
