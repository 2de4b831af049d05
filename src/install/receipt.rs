// src/install/receipt.rs

//! Install receipt written into the install root after a successful commit

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Record of what was installed where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub package: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Verified archive digest, `sha256:` prefixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,

    pub executable: PathBuf,
    pub install_root: PathBuf,
    pub installed_at: DateTime<Utc>,
}

impl InstallReceipt {
    pub const FILE_NAME: &'static str = "INSTALL_RECEIPT.json";

    /// Receipt location inside `install_root`
    pub fn path_in(install_root: &Path) -> PathBuf {
        install_root.join(Self::FILE_NAME)
    }

    /// Write the receipt atomically into `install_root`
    pub fn write(&self, install_root: &Path) -> Result<PathBuf> {
        let path = Self::path_in(install_root);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let mut temp = NamedTempFile::new_in(install_root)?;
        temp.write_all(json.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;
        Ok(path)
    }

    /// Read the receipt from `install_root`, if present
    pub fn read(install_root: &Path) -> Result<Option<Self>> {
        let path = Self::path_in(install_root);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let receipt = serde_json::from_str(&content)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        Ok(Some(receipt))
    }
}
