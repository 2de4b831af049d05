// src/source/mod.rs

//! Source package fetching and verification
//!
//! A [`SourcePackage`] is a URL plus the SHA-256 the recipe declares for it.
//! Fetched archives land in a cache keyed by that digest; nothing is
//! extracted until the bytes on disk hash to the declared value.

mod archive;

pub use archive::extract_archive;

use crate::error::{Error, Result};
use crate::hash::{self, Sha256Digest};
use crate::recipe::Recipe;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An immutable, content-addressed source archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePackage {
    /// Where the archive is fetched from (HTTP(S) URL, `file://` URL or path)
    pub url: String,
    /// Declared digest of the archive bytes
    pub sha256: Sha256Digest,
}

impl SourcePackage {
    /// Create a source package, validating the declared digest
    pub fn new(url: impl Into<String>, sha256: &str) -> Result<Self> {
        let sha256 = Sha256Digest::parse(sha256.trim())
            .map_err(|e| Error::InvalidRecipe(format!("source sha256: {}", e)))?;
        Ok(Self {
            url: url.into(),
            sha256,
        })
    }

    /// Build the source package a recipe declares
    pub fn from_recipe(recipe: &Recipe) -> Result<Self> {
        Self::new(recipe.source_url(), &recipe.source.sha256)
    }

    /// File name the archive is cached under
    pub fn cache_file_name(&self) -> String {
        format!("{}.tar.gz", self.sha256)
    }

    /// Fetch the archive into `cache_dir` and verify it
    ///
    /// A cached copy is reused only if it still verifies; a corrupt cache
    /// entry is removed and fetched again. A fresh download that fails
    /// verification is deleted before `ChecksumMismatch` is returned.
    pub fn fetch(&self, cache_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(cache_dir)?;

        let cached_path = cache_dir.join(self.cache_file_name());
        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            match hash::verify_file(&cached_path, &self.sha256)? {
                Ok(()) => return Ok(cached_path),
                Err(actual) => {
                    warn!(
                        "Cached source {} has digest {}, re-fetching",
                        cached_path.display(),
                        actual
                    );
                    fs::remove_file(&cached_path)?;
                }
            }
        }

        let part_path = cache_dir.join(format!("{}.part", self.cache_file_name()));
        info!("Fetching {}", self.url);
        if let Err(e) = download(&self.url, &part_path) {
            let _ = fs::remove_file(&part_path);
            return Err(e);
        }

        if let Err(actual) = hash::verify_file(&part_path, &self.sha256)? {
            fs::remove_file(&part_path)?;
            return Err(Error::ChecksumMismatch {
                origin: self.url.clone(),
                expected: self.sha256.to_string(),
                actual: actual.to_string(),
            });
        }

        fs::rename(&part_path, &cached_path)?;
        info!("Verified {} ({})", self.url, self.sha256.to_prefixed_string());
        Ok(cached_path)
    }

    /// Fetch, verify and extract into `work_dir`, returning the source tree root
    pub fn fetch_and_extract(&self, cache_dir: &Path, work_dir: &Path) -> Result<PathBuf> {
        let archive = self.fetch(cache_dir)?;
        extract_archive(&archive, work_dir)
    }
}

/// Copy `url` to `dest`, from the network or the local filesystem
fn download(url: &str, dest: &Path) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("relocator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::DownloadError(format!("failed to build HTTP client: {}", e)))?;

        let mut response = client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let mut file = File::create(dest)?;
        response
            .copy_to(&mut file)
            .map_err(|e| Error::DownloadError(format!("{}: {}", url, e)))?;
        file.sync_all()?;
        Ok(())
    } else {
        let local = Path::new(url.strip_prefix("file://").unwrap_or(url));
        fs::copy(local, dest)
            .map_err(|e| Error::DownloadError(format!("{}: {}", local.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_local_file_verifies_and_caches() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("ubo.tar.gz");
        fs::write(&origin, b"archive bytes").unwrap();
        let digest = hash::sha256_bytes(b"archive bytes");

        let source =
            SourcePackage::new(format!("file://{}", origin.display()), digest.as_str()).unwrap();
        let cache = temp.path().join("cache");
        let cached = source.fetch(&cache).unwrap();

        assert_eq!(cached, cache.join(format!("{}.tar.gz", digest)));
        assert_eq!(fs::read(&cached).unwrap(), b"archive bytes");

        // Second fetch is served from cache even with the origin gone
        fs::remove_file(&origin).unwrap();
        assert_eq!(source.fetch(&cache).unwrap(), cached);
    }

    #[test]
    fn test_fetch_mismatch_leaves_nothing_cached() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("ubo.tar.gz");
        fs::write(&origin, b"tampered").unwrap();

        let source = SourcePackage::new(origin.display().to_string(), &"0".repeat(64)).unwrap();
        let cache = temp.path().join("cache");
        let err = source.fetch(&cache).unwrap_err();

        match err {
            Error::ChecksumMismatch { expected, actual, .. } => {
                assert_eq!(expected, "0".repeat(64));
                assert_eq!(actual, hash::sha256_bytes(b"tampered").to_string());
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
    }

    #[test]
    fn test_fetch_replaces_corrupt_cache_entry() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("ubo.tar.gz");
        fs::write(&origin, b"good").unwrap();
        let digest = hash::sha256_bytes(b"good");

        let source = SourcePackage::new(origin.display().to_string(), digest.as_str()).unwrap();
        let cache = temp.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join(source.cache_file_name()), b"corrupt").unwrap();

        let cached = source.fetch(&cache).unwrap();
        assert_eq!(fs::read(cached).unwrap(), b"good");
    }

    #[test]
    fn test_fetch_missing_local_file() {
        let temp = TempDir::new().unwrap();
        let source =
            SourcePackage::new(temp.path().join("nope").display().to_string(), &"0".repeat(64))
                .unwrap();

        assert!(matches!(
            source.fetch(&temp.path().join("cache")),
            Err(Error::DownloadError(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_digest() {
        assert!(matches!(
            SourcePackage::new("https://example.com/a.tar.gz", "xyz"),
            Err(Error::InvalidRecipe(_))
        ));
    }
}
