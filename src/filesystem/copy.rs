// src/filesystem/copy.rs

//! File and directory-tree copies used while staging an install

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

fn copy_error(from: &Path, to: &Path, source: io::Error) -> Error {
    Error::CopyError {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}

/// Copy a single regular file, creating parent directories as needed
///
/// Permission bits travel with the content (`fs::copy` semantics), so an
/// executable stays executable.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if !src.is_file() {
        return Err(copy_error(
            src,
            dst,
            io::Error::new(io::ErrorKind::NotFound, "source is not a regular file"),
        ));
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| copy_error(src, dst, e))?;
    }

    fs::copy(src, dst).map_err(|e| copy_error(src, dst, e))
}

/// Recursively copy the contents of `src` into `dst`
///
/// `dst` is created if missing. Symlinks are recreated as symlinks rather
/// than followed. Returns the number of files and links copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).map_err(|e| copy_error(src, dst, e))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| copy_error(src, dst, e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| copy_error(src, dst, io::Error::other(e)))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_error(entry.path(), &target, e))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path()).map_err(|e| copy_error(entry.path(), &target, e))?;
            if target.symlink_metadata().is_ok() {
                fs::remove_file(&target).map_err(|e| copy_error(entry.path(), &target, e))?;
            }
            std::os::unix::fs::symlink(&link, &target)
                .map_err(|e| copy_error(entry.path(), &target, e))?;
            copied += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| copy_error(entry.path(), &target, e))?;
            copied += 1;
        }
    }

    debug!("Copied {} entries from {} to {}", copied, src.display(), dst.display());
    Ok(copied)
}

/// Move a file or directory into place, replacing nothing
///
/// Tries `rename` first. When source and destination live on different
/// filesystems (`EXDEV`), falls back to copy, fsync, then delete the source.
/// The destination must not exist.
pub fn move_into_place(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            debug!(
                "Cross-filesystem move detected ({} -> {}), using copy fallback",
                src.display(),
                dst.display()
            );

            if src.is_dir() {
                copy_tree(src, dst)?;
                fs::remove_dir_all(src)?;
            } else {
                copy_file(src, dst)?;
                File::open(dst)?.sync_all()?;
                fs::remove_file(src)?;
            }

            // Not all filesystems support fsync on directories
            if let Some(parent) = dst.parent() {
                if let Ok(dir) = File::open(parent) {
                    let _ = dir.sync_all();
                }
            }
            Ok(())
        }
        Err(e) => Err(copy_error(src, dst, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_copy_file_preserves_mode() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("tool");
        fs::write(&src, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();

        let dst = temp.path().join("out/bin/tool");
        copy_file(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "#!/bin/sh\necho hi\n");
        assert_eq!(fs::metadata(&dst).unwrap().permissions().mode() & 0o777, 0o755);
    }

    #[test]
    fn test_copy_file_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = copy_file(&temp.path().join("missing"), &temp.path().join("dst"));
        assert!(matches!(result, Err(Error::CopyError { .. })));
    }

    #[test]
    fn test_copy_tree_nested_and_symlinks() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("lib");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("a.sh"), "a").unwrap();
        fs::write(src.join("nested/deeper/b.sh"), "b").unwrap();
        std::os::unix::fs::symlink("a.sh", src.join("link.sh")).unwrap();

        let dst = temp.path().join("out/lib");
        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 3);
        assert_eq!(fs::read_to_string(dst.join("nested/deeper/b.sh")).unwrap(), "b");
        assert!(dst.join("link.sh").is_symlink());
        assert_eq!(fs::read_link(dst.join("link.sh")).unwrap(), Path::new("a.sh"));
    }

    #[test]
    fn test_copy_tree_empty_dir() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("resources");
        fs::create_dir_all(&src).unwrap();

        let dst = temp.path().join("out/resources");
        assert_eq!(copy_tree(&src, &dst).unwrap(), 0);
        assert!(dst.is_dir());
    }

    #[test]
    fn test_move_into_place_same_fs() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staged");
        fs::create_dir_all(src.join("inner")).unwrap();
        fs::write(src.join("inner/file"), "content").unwrap();

        let dst = temp.path().join("final");
        move_into_place(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("inner/file")).unwrap(), "content");
    }
}
