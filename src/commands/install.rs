// src/commands/install.rs

//! Install command - fetch, verify, stage, patch and smoke test

use super::{cache_dir, load_recipe};
use anyhow::{Context, Result, bail};
use relocator::recipe::check_platform;
use relocator::{Installer, SmokeTest, SourcePackage};
use std::io::{self, Write};
use std::path::{self, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{info, warn};

/// Options for `relocator install`
pub struct InstallOptions<'a> {
    pub root: &'a str,
    pub bin_dir: &'a str,
    pub cache_dir: Option<&'a str>,
    pub source: Option<&'a str>,
    pub no_test: bool,
    pub ignore_platform: bool,
    pub timeout: Option<u64>,
}

/// Install a tool from its recipe
pub fn cmd_install(recipe_path: &str, opts: InstallOptions<'_>) -> Result<()> {
    install_to(&mut io::stdout().lock(), recipe_path, opts)
}

/// Install, reporting progress to `out`
///
/// Caveats are printed as soon as the files are in place, before the smoke
/// test runs, so they are shown even when the test fails.
fn install_to<W: Write>(out: &mut W, recipe_path: &str, opts: InstallOptions<'_>) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    writeln!(
        out,
        "Installing {} {}",
        recipe.package.name, recipe.package.version
    )?;

    if opts.ignore_platform {
        info!("Skipping platform check");
    } else {
        check_platform(&recipe)?;
    }

    let smoke_test = match (opts.no_test, opts.timeout, &recipe.test) {
        (true, timeout, _) => {
            if timeout.is_some() {
                warn!("--timeout has no effect with --no-test");
            }
            None
        }
        (false, Some(secs), Some(section)) => {
            Some(SmokeTest::from_recipe(section).with_timeout(Duration::from_secs(secs)))
        }
        (false, Some(_), None) => {
            bail!(
                "--timeout given but recipe {} defines no [test] section",
                recipe_path
            );
        }
        (false, None, section) => section.as_ref().map(SmokeTest::from_recipe),
    };

    let root = path::absolute(opts.root)
        .with_context(|| format!("Invalid install root: {}", opts.root))?;
    let bin_dir = PathBuf::from(opts.bin_dir);

    let installer = Installer::from_recipe(&recipe)?.without_smoke_test();

    // Keeps the extracted tree alive until the install finishes
    let work_dir;
    let source_tree = match opts.source {
        Some(dir) => {
            writeln!(out, "Using source tree: {}", dir)?;
            PathBuf::from(dir)
        }
        None => {
            let cache = cache_dir(opts.cache_dir)?;
            let source = SourcePackage::from_recipe(&recipe)?;
            work_dir = TempDir::new().context("Failed to create work directory")?;
            let tree = source
                .fetch_and_extract(&cache, work_dir.path())
                .with_context(|| format!("Failed to fetch {}", source.url))?;
            writeln!(out, "Verified {}", source.sha256.to_prefixed_string())?;
            tree
        }
    };

    let installed = installer
        .install(&source_tree, &root, &bin_dir)
        .with_context(|| format!("Failed to install {}", recipe.package.name))?;

    writeln!(out, "[OK] Installed")?;
    writeln!(out, "  Executable: {}", installed.executable.display())?;
    writeln!(out, "  Support files: {}", installed.install_root.display())?;

    if let Some(caveats) = &installed.caveats {
        writeln!(out)?;
        writeln!(out, "==> Caveats")?;
        write!(out, "{}", caveats)?;
        out.flush()?;
    }

    if let Some(test) = smoke_test {
        let output = test
            .run(&installed.executable)
            .with_context(|| format!("Smoke test failed for {}", recipe.package.name))?;
        writeln!(out)?;
        writeln!(
            out,
            "Smoke test: {}",
            output.lines().next().unwrap_or_default()
        )?;
    }

    Ok(())
}
