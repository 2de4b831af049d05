// src/main.rs

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Install {
            recipe,
            root,
            bin_dir,
            cache_dir,
            source,
            no_test,
            ignore_platform,
            timeout,
        } => commands::cmd_install(
            &recipe,
            commands::InstallOptions {
                root: &root,
                bin_dir: &bin_dir,
                cache_dir: cache_dir.as_deref(),
                source: source.as_deref(),
                no_test,
                ignore_platform,
                timeout,
            },
        ),
        Commands::Fetch {
            recipe,
            cache_dir,
            dest,
        } => commands::cmd_fetch(&recipe, cache_dir.as_deref(), dest.as_deref()),
        Commands::Test {
            recipe,
            bin_dir,
            timeout,
        } => commands::cmd_test(&recipe, &bin_dir, timeout),
        Commands::Info { recipe } => commands::cmd_info(&recipe),
    }
}
