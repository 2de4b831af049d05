// src/install/mod.rs

//! Relocatable installs
//!
//! The [`Installer`] takes a verified, extracted source tree and lays it out
//! as:
//!
//! ```text
//! <bin_dir>/<executable>          patched: BASE_DIR="<install_root>"
//! <install_root>/lib/...
//! <install_root>/resources/...
//! <install_root>/INSTALL_RECEIPT.json
//! ```
//!
//! # Flow
//!
//! ```text
//! check source tree -> lock -> stage -> patch staged executable
//!                   -> commit -> receipt -> caveats -> smoke test
//! ```
//!
//! The source tree is checked before anything is written. Copying and
//! patching happen in a staging directory beside the install root, so a
//! failed patch never leaves an unpatched executable on the `PATH`.

mod patch;
mod receipt;
mod smoke;
mod staging;

pub use patch::{ConfigPatch, read_assignment};
pub use receipt::InstallReceipt;
pub use smoke::{DEFAULT_TIMEOUT, SmokeTest};
pub use staging::{InstallLock, Staging};

use crate::error::{Error, Result};
use crate::recipe::{self, Recipe};
use crate::source::SourcePackage;
use chrono::Utc;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Where an install puts each piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub install_root: PathBuf,
    pub bin_dir: PathBuf,
    pub executable: String,
    pub lib: String,
    pub resources: String,
}

impl InstallLayout {
    /// Layout with the default `lib` and `resources` directory names
    pub fn new(
        install_root: impl Into<PathBuf>,
        bin_dir: impl Into<PathBuf>,
        executable: impl Into<String>,
    ) -> Self {
        Self {
            install_root: install_root.into(),
            bin_dir: bin_dir.into(),
            executable: executable.into(),
            lib: "lib".to_string(),
            resources: "resources".to_string(),
        }
    }

    pub fn executable_path(&self) -> PathBuf {
        self.bin_dir.join(&self.executable)
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.install_root.join(&self.lib)
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.install_root.join(&self.resources)
    }
}

/// Result of a successful install
#[derive(Debug, Clone)]
pub struct InstalledLayout {
    pub install_root: PathBuf,
    pub executable: PathBuf,
    pub lib_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub receipt: PathBuf,

    /// Guidance for the operator, verbatim
    pub caveats: Option<String>,

    /// Combined smoke test output, if the test ran
    pub smoke_test_output: Option<String>,
}

/// Installs one tool from an extracted source tree
#[derive(Debug, Clone)]
pub struct Installer {
    executable: String,
    lib: String,
    resources: String,
    variable: String,
    caveats: Option<String>,
    smoke_test: Option<SmokeTest>,
    package: Option<String>,
    version: Option<String>,
    source: Option<SourcePackage>,
}

impl Installer {
    /// Installer for `bin/<executable>` with default layout and no smoke test
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            lib: "lib".to_string(),
            resources: "resources".to_string(),
            variable: "BASE_DIR".to_string(),
            caveats: None,
            smoke_test: None,
            package: None,
            version: None,
            source: None,
        }
    }

    /// Installer configured from a recipe
    pub fn from_recipe(recipe: &Recipe) -> Result<Self> {
        let mut installer = Self::new(recipe::executable_name(recipe))
            .with_support_dirs(&recipe.layout.lib, &recipe.layout.resources)
            .with_variable(&recipe.patch.variable)
            .with_package(&recipe.package.name, &recipe.package.version)
            .with_source(SourcePackage::from_recipe(recipe)?);

        if let Some(text) = recipe.caveats_text() {
            installer = installer.with_caveats(text);
        }
        if let Some(test) = &recipe.test {
            installer = installer.with_smoke_test(SmokeTest::from_recipe(test));
        }
        Ok(installer)
    }

    /// Rewrite `variable` instead of `BASE_DIR`
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    /// Use different library and resources directory names
    pub fn with_support_dirs(mut self, lib: impl Into<String>, resources: impl Into<String>) -> Self {
        self.lib = lib.into();
        self.resources = resources.into();
        self
    }

    pub fn with_caveats(mut self, caveats: impl Into<String>) -> Self {
        self.caveats = Some(caveats.into());
        self
    }

    pub fn with_smoke_test(mut self, test: SmokeTest) -> Self {
        self.smoke_test = Some(test);
        self
    }

    pub fn without_smoke_test(mut self) -> Self {
        self.smoke_test = None;
        self
    }

    /// Smoke test run after commit, if any
    pub fn smoke_test(&self) -> Option<&SmokeTest> {
        self.smoke_test.as_ref()
    }

    /// Package name and version recorded in the receipt
    pub fn with_package(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.package = Some(name.into());
        self.version = Some(version.into());
        self
    }

    /// Verified source recorded in the receipt
    pub fn with_source(mut self, source: SourcePackage) -> Self {
        self.source = Some(source);
        self
    }

    /// Layout this installer produces for the given locations
    pub fn layout(&self, install_root: &Path, bin_dir: &Path) -> InstallLayout {
        InstallLayout {
            install_root: install_root.to_path_buf(),
            bin_dir: bin_dir.to_path_buf(),
            executable: self.executable.clone(),
            lib: self.lib.clone(),
            resources: self.resources.clone(),
        }
    }

    /// Install `source_tree` into `install_root`, with the executable in `bin_dir`
    pub fn install(
        &self,
        source_tree: &Path,
        install_root: &Path,
        bin_dir: &Path,
    ) -> Result<InstalledLayout> {
        if !install_root.is_absolute() || install_root.parent().is_none() {
            return Err(Error::InvalidInstallRoot(install_root.to_path_buf()));
        }
        check_support_dirs(&self.lib, &self.resources)?;
        check_source_tree(source_tree, &self.executable, &self.lib, &self.resources)?;

        let layout = self.layout(install_root, bin_dir);
        info!(
            "Installing {} into {}",
            self.executable,
            install_root.display()
        );

        if let Some(parent) = install_root.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock = InstallLock::acquire(install_root)?;

        let staging = Staging::new(install_root, &self.executable)?;
        staging.stage_executable(&source_tree.join("bin").join(&self.executable))?;
        staging.stage_tree(&source_tree.join(&self.lib), &self.lib)?;
        staging.stage_tree(&source_tree.join(&self.resources), &self.resources)?;

        ConfigPatch::new(&self.variable, install_root).apply(&staging.executable_path())?;

        let executable =
            staging.commit(install_root, &[&self.lib, &self.resources], bin_dir)?;

        let receipt = InstallReceipt {
            package: self
                .package
                .clone()
                .unwrap_or_else(|| self.executable.clone()),
            version: self.version.clone(),
            source_url: self.source.as_ref().map(|s| s.url.clone()),
            source_sha256: self.source.as_ref().map(|s| s.sha256.to_prefixed_string()),
            executable: executable.clone(),
            install_root: install_root.to_path_buf(),
            installed_at: Utc::now(),
        };
        let receipt_path = receipt.write(install_root)?;
        debug!("Wrote receipt {}", receipt_path.display());
        drop(lock);

        if let Some(caveats) = &self.caveats {
            info!("Caveats for {}:\n{}", self.executable, caveats);
        }

        let smoke_test_output = match &self.smoke_test {
            Some(test) => Some(test.run(&executable)?),
            None => {
                debug!("No smoke test configured");
                None
            }
        };

        Ok(InstalledLayout {
            install_root: install_root.to_path_buf(),
            executable,
            lib_dir: layout.lib_dir(),
            resources_dir: layout.resources_dir(),
            receipt: receipt_path,
            caveats: self.caveats.clone(),
            smoke_test_output,
        })
    }
}

/// Check that the library and resources directory names are usable
///
/// Both must be relative paths made only of normal components, and neither
/// may equal or contain the other: each is replaced wholesale on commit.
pub fn check_support_dirs(lib: &str, resources: &str) -> Result<()> {
    let invalid = |msg: String| Error::InvalidRecipe(format!("layout: {}", msg));

    for (label, dir) in [("lib", lib), ("resources", resources)] {
        let path = Path::new(dir);
        let normal = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if dir.is_empty() || !normal {
            return Err(invalid(format!(
                "{} must be a relative path inside the source tree, got '{}'",
                label, dir
            )));
        }
    }

    let (lib_path, resources_path) = (Path::new(lib), Path::new(resources));
    if lib_path.starts_with(resources_path) || resources_path.starts_with(lib_path) {
        return Err(invalid(format!(
            "lib '{}' and resources '{}' must be separate directories",
            lib, resources
        )));
    }
    Ok(())
}

/// Check that a source tree carries everything an install needs
///
/// Performs no writes. The first missing entry is reported as
/// `MissingSourceEntry`.
pub fn check_source_tree(
    source_tree: &Path,
    executable: &str,
    lib: &str,
    resources: &str,
) -> Result<()> {
    let missing = |entry: String| Error::MissingSourceEntry {
        root: source_tree.to_path_buf(),
        entry,
    };

    let exe = format!("bin/{}", executable);
    if !source_tree.join(&exe).is_file() {
        return Err(missing(exe));
    }
    for dir in [lib, resources] {
        if !source_tree.join(dir).is_dir() {
            return Err(missing(dir.to_string()));
        }
    }

    if source_tree.join("bin").read_dir()?.count() > 1 {
        warn!(
            "Source tree {} has more than one file in bin/; only {} is installed",
            source_tree.display(),
            executable
        );
    }
    Ok(())
}
