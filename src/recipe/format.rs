// src/recipe/format.rs

//! Recipe file format definitions
//!
//! A recipe is a TOML file describing one relocatable tool: where its source
//! archive lives, what the extracted tree looks like, which assignment in the
//! executable gets rewritten, and how to smoke test the result.

use serde::{Deserialize, Serialize};

/// A complete install recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Source archive and its checksum
    pub source: SourceSection,

    /// Layout of the extracted source tree
    #[serde(default)]
    pub layout: LayoutSection,

    /// Base-directory assignment to rewrite
    #[serde(default)]
    pub patch: PatchSection,

    /// Post-install guidance
    #[serde(default)]
    pub caveats: Option<CaveatsSection>,

    /// Smoke test definition
    #[serde(default)]
    pub test: Option<TestSection>,
}

impl Recipe {
    /// Substitute `%(name)s` and `%(version)s` in a template
    pub fn substitute(&self, template: &str) -> String {
        template
            .replace("%(version)s", &self.package.version)
            .replace("%(name)s", &self.package.name)
    }

    /// Source URL with variables substituted
    pub fn source_url(&self) -> String {
        self.substitute(&self.source.url)
    }

    /// Caveats text, if any, exactly as written in the recipe
    pub fn caveats_text(&self) -> Option<&str> {
        self.caveats.as_ref().map(|c| c.text.as_str())
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Upstream version
    pub version: String,

    /// One-line description
    #[serde(default)]
    pub description: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Operating systems the tool supports (empty = any)
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// Source archive section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Archive URL, local path or `file://` URL
    ///
    /// Supports `%(version)s` and `%(name)s` substitution.
    pub url: String,

    /// SHA-256 of the archive, bare hex or `sha256:` prefixed
    pub sha256: String,
}

/// Source tree layout contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSection {
    /// Executable file name under `bin/` (defaults to the package name)
    #[serde(default)]
    pub executable: Option<String>,

    /// Library directory, relative to the source tree root
    #[serde(default = "default_lib")]
    pub lib: String,

    /// Resources directory, relative to the source tree root
    #[serde(default = "default_resources")]
    pub resources: String,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            executable: None,
            lib: default_lib(),
            resources: default_resources(),
        }
    }
}

fn default_lib() -> String {
    "lib".to_string()
}

fn default_resources() -> String {
    "resources".to_string()
}

/// Base-directory patch section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSection {
    /// Variable whose assignment is rewritten to the install root
    #[serde(default = "default_variable")]
    pub variable: String,
}

impl Default for PatchSection {
    fn default() -> Self {
        Self {
            variable: default_variable(),
        }
    }
}

fn default_variable() -> String {
    "BASE_DIR".to_string()
}

/// Caveats shown after install
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaveatsSection {
    /// Literal guidance text
    pub text: String,
}

/// Smoke test section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSection {
    /// Arguments passed to the installed executable
    #[serde(default = "default_test_args")]
    pub args: Vec<String>,

    /// Substring expected in combined stdout and stderr
    pub expect: String,

    /// Bound on the child's runtime
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_test_args() -> Vec<String> {
    vec!["version".to_string()]
}

fn default_timeout_secs() -> u64 {
    10
}
