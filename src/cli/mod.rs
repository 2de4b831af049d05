// src/cli/mod.rs
//! CLI definitions for relocator
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations are in the `commands` module.
//!
//! - `install` - Fetch, verify and install a tool from its recipe
//! - `fetch` - Fetch and verify a source archive into the cache
//! - `test` - Smoke test an installed tool
//! - `info` - Show recipe metadata and validation warnings

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relocator")]
#[command(author = "Relocator Contributors")]
#[command(version)]
#[command(about = "Relocatable installer for self-contained command-line tools", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a tool from a recipe
    Install {
        /// Path to the recipe file
        recipe: String,

        /// Installation root for lib/ and resources/
        #[arg(short, long)]
        root: String,

        /// Directory the executable is installed into
        #[arg(short, long)]
        bin_dir: String,

        /// Source archive cache directory
        #[arg(long)]
        cache_dir: Option<String>,

        /// Install from an already extracted source tree instead of fetching
        #[arg(long)]
        source: Option<String>,

        /// Skip the post-install smoke test
        #[arg(long)]
        no_test: bool,

        /// Install even if the recipe does not list this platform
        #[arg(long)]
        ignore_platform: bool,

        /// Smoke test timeout in seconds (overrides the recipe)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Fetch and verify a recipe's source archive
    Fetch {
        /// Path to the recipe file
        recipe: String,

        /// Source archive cache directory
        #[arg(long)]
        cache_dir: Option<String>,

        /// Also extract the archive into this directory
        #[arg(short, long)]
        dest: Option<String>,
    },

    /// Smoke test an installed tool
    Test {
        /// Path to the recipe file
        recipe: String,

        /// Directory the executable was installed into
        #[arg(short, long)]
        bin_dir: String,

        /// Timeout in seconds (overrides the recipe)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show recipe metadata
    Info {
        /// Path to the recipe file
        recipe: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from([
            "relocator",
            "install",
            "recipes/ubo.toml",
            "--root",
            "/opt/ubo",
            "--bin-dir",
            "/usr/local/bin",
            "--no-test",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Install {
                recipe,
                root,
                bin_dir,
                no_test,
                source,
                ..
            } => {
                assert_eq!(recipe, "recipes/ubo.toml");
                assert_eq!(root, "/opt/ubo");
                assert_eq!(bin_dir, "/usr/local/bin");
                assert!(no_test);
                assert!(source.is_none());
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn test_install_requires_root() {
        assert!(
            Cli::try_parse_from(["relocator", "install", "r.toml", "--bin-dir", "/b"]).is_err()
        );
    }
}
