// src/error.rs

//! Error types for fetching, staging and relocating a tool install

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by any step of a relocatable install
///
/// Every variant is fatal: callers surface it to the operator and stop.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Checksum mismatch for {origin}: expected sha256:{expected}, got sha256:{actual}")]
    ChecksumMismatch {
        origin: String,
        expected: String,
        actual: String,
    },

    #[error("Source tree {root} is missing required entry '{entry}'")]
    MissingSourceEntry { root: PathBuf, entry: String },

    #[error("Failed to copy {from} to {to}: {source}")]
    CopyError {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("No line assigning {variable}= found in {path}; incompatible executable")]
    PatchTargetNotFound { path: PathBuf, variable: String },

    #[error("{count} lines assign {variable}= in {path}; refusing to patch an ambiguous executable")]
    PatchTargetAmbiguous {
        path: PathBuf,
        variable: String,
        count: usize,
    },

    #[error("Failed to rewrite {path}: {source}")]
    PatchWriteError { path: PathBuf, source: io::Error },

    #[error("Smoke test failed for {executable}: {reason}")]
    SmokeTestFailed { executable: PathBuf, reason: String },

    #[error("Smoke test for {executable} timed out after {seconds} seconds")]
    SmokeTestTimeout { executable: PathBuf, seconds: u64 },

    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Invalid install root {0}: must be an absolute path")]
    InvalidInstallRoot(PathBuf),

    #[error("Install root {0} is locked by another installer")]
    InstallRootLocked(PathBuf),

    #[error("{package} requires one of [{required}], but this system is {actual}")]
    UnsupportedPlatform {
        package: String,
        required: String,
        actual: String,
    },

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
