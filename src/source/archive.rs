// src/source/archive.rs

//! Gzip-compressed tar extraction for source archives

use crate::error::{Error, Result};
use crate::filesystem::{archive_entry_path, check_link_target};
use flate2::read::GzDecoder;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::debug;

fn archive_error(archive: &Path, e: impl std::fmt::Display) -> Error {
    Error::ArchiveError(format!("{}: {}", archive.display(), e))
}

/// Extract a `.tar.gz` archive into `dest` and return the source tree root
///
/// Release archives usually wrap everything in a single `<name>-<version>/`
/// directory; when that is the case the returned path is that directory,
/// otherwise it is `dest` itself.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::open(archive).map_err(|e| archive_error(archive, e))?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);

    fs::create_dir_all(dest)?;

    let mut top_level: BTreeSet<OsString> = BTreeSet::new();
    let mut unpacked = 0usize;

    for entry in tar.entries().map_err(|e| archive_error(archive, e))? {
        let mut entry = entry.map_err(|e| archive_error(archive, e))?;

        let entry_type = entry.header().entry_type();
        match entry_type {
            EntryType::XGlobalHeader | EntryType::XHeader => continue,
            EntryType::Link => {
                return Err(archive_error(archive, "hard link entries are not supported"));
            }
            _ => {}
        }

        let raw = entry
            .path()
            .map_err(|e| archive_error(archive, e))?
            .into_owned();
        let Some(relative) = archive_entry_path(&raw)? else {
            continue;
        };

        if entry_type == EntryType::Symlink {
            let target = entry
                .link_name()
                .map_err(|e| archive_error(archive, e))?
                .ok_or_else(|| archive_error(archive, "symlink entry without a target"))?;
            check_link_target(&relative, &target)?;
        }

        if let Some(Component::Normal(first)) = relative.components().next() {
            top_level.insert(first.to_os_string());
        }

        // unpack_in refuses to write through a parent that resolves outside dest
        let written = entry
            .unpack_in(dest)
            .map_err(|e| archive_error(archive, format!("{}: {}", relative.display(), e)))?;
        if !written {
            return Err(archive_error(
                archive,
                format!("{}: entry escapes extraction root", relative.display()),
            ));
        }
        unpacked += 1;
    }

    debug!("Extracted {} entries from {}", unpacked, archive.display());

    if let (1, Some(only)) = (top_level.len(), top_level.first()) {
        let only = dest.join(only);
        let is_real_dir = only
            .symlink_metadata()
            .map(|m| m.file_type().is_dir())
            .unwrap_or(false);
        if is_real_dir {
            return Ok(only);
        }
    }
    Ok(dest.to_path_buf())
}
