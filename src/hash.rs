// src/hash.rs

//! SHA-256 digests for source archive integrity
//!
//! Declared checksums come from recipes as bare hex or with a `sha256:`
//! prefix. [`Sha256Digest`] normalizes both forms so comparisons are
//! case-insensitive and prefix-agnostic.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Length of a SHA-256 digest rendered as hex
pub const SHA256_HEX_LEN: usize = 64;

/// Digest parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// Prefix names an algorithm other than sha256
    UnknownAlgorithm(String),
    /// Hex string has the wrong length
    InvalidLength { expected: usize, got: usize },
    /// Hex string contains non-hex characters
    InvalidHex(String),
}

impl fmt::Display for DigestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(f, "unsupported digest algorithm: {}", name),
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid digest length: expected {}, got {}", expected, got)
            }
            Self::InvalidHex(s) => write!(f, "invalid hex in digest: {}", s),
        }
    }
}

impl std::error::Error for DigestError {}

/// A validated, lowercase SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parse a digest, accepting an optional `sha256:` prefix
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let hex = match s.split_once(':') {
            Some((algo, hex)) => {
                if !matches!(algo.to_lowercase().as_str(), "sha256" | "sha-256") {
                    return Err(DigestError::UnknownAlgorithm(algo.to_string()));
                }
                hex
            }
            None => s,
        };

        if hex.len() != SHA256_HEX_LEN {
            return Err(DigestError::InvalidLength {
                expected: SHA256_HEX_LEN,
                got: hex.len(),
            });
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidHex(hex.to_string()));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Hex form without prefix
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex form with `sha256:` prefix
    pub fn to_prefixed_string(&self) -> String {
        format!("sha256:{}", self.0)
    }
}

impl FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the SHA-256 digest of a byte slice
pub fn sha256_bytes(data: &[u8]) -> Sha256Digest {
    Sha256Digest(format!("{:x}", Sha256::digest(data)))
}

/// Compute the SHA-256 digest of everything a reader yields
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Sha256Digest(format!("{:x}", hasher.finalize())))
}

/// Compute the SHA-256 digest of a file, streaming its content
pub fn sha256_file(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = File::open(path)?;
    sha256_reader(&mut file)
}

/// Verify a file against an expected digest
///
/// Returns the actual digest on mismatch so callers can report it.
pub fn verify_file(path: &Path, expected: &Sha256Digest) -> io::Result<Result<(), Sha256Digest>> {
    let actual = sha256_file(path)?;
    if &actual == expected {
        Ok(Ok(()))
    } else {
        Ok(Err(actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_WORLD: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_bytes_known_value() {
        assert_eq!(sha256_bytes(b"hello world").as_str(), HELLO_WORLD);
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data = b"Hello, World!";
        let mut cursor = std::io::Cursor::new(data);
        assert_eq!(sha256_reader(&mut cursor).unwrap(), sha256_bytes(data));
    }

    #[test]
    fn test_parse_prefixed_and_bare() {
        let bare = Sha256Digest::parse(HELLO_WORLD).unwrap();
        let prefixed = Sha256Digest::parse(&format!("sha256:{}", HELLO_WORLD)).unwrap();
        assert_eq!(bare, prefixed);
        assert_eq!(prefixed.to_prefixed_string(), format!("sha256:{}", HELLO_WORLD));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let upper = Sha256Digest::parse(&HELLO_WORLD.to_uppercase()).unwrap();
        assert_eq!(upper.as_str(), HELLO_WORLD);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Sha256Digest::parse("abc123"),
            Err(DigestError::InvalidLength { .. })
        ));
        assert!(matches!(
            Sha256Digest::parse(&"g".repeat(64)),
            Err(DigestError::InvalidHex(_))
        ));
        assert!(matches!(
            Sha256Digest::parse(&format!("md5:{}", HELLO_WORLD)),
            Err(DigestError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_verify_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("data");
        std::fs::write(&path, b"hello world").unwrap();

        let good = Sha256Digest::parse(HELLO_WORLD).unwrap();
        assert!(verify_file(&path, &good).unwrap().is_ok());

        let bad = Sha256Digest::parse(&"0".repeat(64)).unwrap();
        let actual = verify_file(&path, &bad).unwrap().unwrap_err();
        assert_eq!(actual.as_str(), HELLO_WORLD);
    }
}
