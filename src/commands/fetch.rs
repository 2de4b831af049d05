// src/commands/fetch.rs

//! Fetch command - download and verify a source archive

use super::{cache_dir, load_recipe};
use anyhow::{Context, Result};
use relocator::SourcePackage;
use relocator::source::extract_archive;
use std::path::Path;

/// Fetch a recipe's source into the cache, optionally extracting it
pub fn cmd_fetch(recipe_path: &str, cache: Option<&str>, dest: Option<&str>) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    let cache = cache_dir(cache)?;

    let source = SourcePackage::from_recipe(&recipe)?;
    let archive = source
        .fetch(&cache)
        .with_context(|| format!("Failed to fetch {}", source.url))?;

    println!("Fetched: {}", archive.display());
    println!("  {}", source.sha256.to_prefixed_string());

    if let Some(dest) = dest {
        let root = extract_archive(&archive, Path::new(dest))
            .with_context(|| format!("Failed to extract into {}", dest))?;
        println!("Extracted: {}", root.display());
    }

    Ok(())
}
