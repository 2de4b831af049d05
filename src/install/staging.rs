// src/install/staging.rs

//! Staging area and install-root lock
//!
//! Everything an install writes is first assembled in a temporary directory
//! next to the install root. Only a fully staged and patched tree is moved
//! into place, so a failed patch or a crash mid-copy never leaves a partial
//! install behind.

use crate::error::{Error, Result};
use crate::filesystem::{copy_file, copy_tree, move_into_place};
use fs2::FileExt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Lock file name under the install root
pub const LOCK_FILE: &str = ".relocator.lock";

/// Exclusive advisory lock on an install root
///
/// The lock file lives inside the root as `.relocator.lock`, so an install
/// writes nothing outside the root and the bin directory. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Lock file path for `install_root`
    pub fn path_for(install_root: &Path) -> PathBuf {
        install_root.join(LOCK_FILE)
    }

    /// Take the lock without blocking
    ///
    /// Returns `InstallRootLocked` if another installer holds it.
    pub fn acquire(install_root: &Path) -> Result<Self> {
        fs::create_dir_all(install_root)?;
        let path = Self::path_for(install_root);
        let file = File::create(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired install lock at {}", path.display());
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                Err(Error::InstallRootLocked(install_root.to_path_buf()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// A temporary tree mirroring the final install
///
/// ```text
/// <staging>/bin/<executable>
/// <staging>/root/<lib>
/// <staging>/root/<resources>
/// ```
///
/// The directory is removed on drop, together with anything the commit
/// displaced.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
    executable: String,
}

impl Staging {
    /// Create a staging directory in the parent of `install_root`
    ///
    /// Staging on the same filesystem as the root keeps the commit a series
    /// of renames.
    pub fn new(install_root: &Path, executable: &str) -> Result<Self> {
        let parent = install_root
            .parent()
            .ok_or_else(|| Error::InvalidInstallRoot(install_root.to_path_buf()))?;
        let name = install_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let dir = tempfile::Builder::new()
            .prefix(&format!(".{}-staging-", name))
            .tempdir_in(parent)?;
        debug!("Staging in {}", dir.path().display());

        Ok(Self {
            dir,
            executable: executable.to_string(),
        })
    }

    /// Root of the staging directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Staged executable
    pub fn executable_path(&self) -> PathBuf {
        self.dir.path().join("bin").join(&self.executable)
    }

    /// Staged counterpart of a directory under the install root
    pub fn root_entry(&self, relative: &str) -> PathBuf {
        self.dir.path().join("root").join(relative)
    }

    /// Copy the executable from the source tree
    pub fn stage_executable(&self, source: &Path) -> Result<()> {
        let bytes = copy_file(source, &self.executable_path())?;
        debug!("Staged executable {} ({} bytes)", self.executable, bytes);
        Ok(())
    }

    /// Copy a support directory from the source tree
    pub fn stage_tree(&self, source: &Path, relative: &str) -> Result<()> {
        let count = copy_tree(source, &self.root_entry(relative))?;
        debug!("Staged {} ({} entries)", relative, count);
        Ok(())
    }

    /// Move the staged tree into its final location
    ///
    /// Support directories go first so the executable never appears at its
    /// final path before the files it sources. Existing directories are
    /// moved aside into the staging area and deleted with it. The executable
    /// is replaced with a rename inside `bin_dir`.
    pub fn commit(
        self,
        install_root: &Path,
        support_dirs: &[&str],
        bin_dir: &Path,
    ) -> Result<PathBuf> {
        fs::create_dir_all(install_root)?;
        let displaced = self.dir.path().join("displaced");
        fs::create_dir_all(&displaced)?;

        for (index, relative) in support_dirs.iter().enumerate() {
            let target = install_root.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            if target.symlink_metadata().is_ok() {
                move_into_place(&target, &displaced.join(index.to_string()))?;
            }
            move_into_place(&self.root_entry(relative), &target)?;
            debug!("Committed {}", target.display());
        }

        fs::create_dir_all(bin_dir)?;
        let final_path = bin_dir.join(&self.executable);
        let temp_path = bin_dir.join(format!(".{}.relocator-new", self.executable));
        if temp_path.symlink_metadata().is_ok() {
            fs::remove_file(&temp_path)?;
        }
        move_into_place(&self.executable_path(), &temp_path)?;
        fs::rename(&temp_path, &final_path).map_err(|e| Error::CopyError {
            from: temp_path.clone(),
            to: final_path.clone(),
            source: e,
        })?;

        info!("Installed {}", final_path.display());
        Ok(final_path)
    }
}
