// src/commands/mod.rs
//! Command handlers for the relocator CLI

mod fetch;
mod info;
mod install;

pub use fetch::cmd_fetch;
pub use info::cmd_info;
pub use install::{InstallOptions, cmd_install};
pub use test::cmd_test;

use anyhow::{Context, Result};
use relocator::recipe::{parse_recipe_file, validate_recipe};
use relocator::Recipe;
use std::path::{Path, PathBuf};

/// Parse and validate a recipe, printing any warnings
pub(crate) fn load_recipe(recipe_path: &str) -> Result<Recipe> {
    let recipe_path = Path::new(recipe_path);
    let recipe = parse_recipe_file(recipe_path)
        .with_context(|| format!("Failed to parse recipe: {}", recipe_path.display()))?;

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    Ok(recipe)
}

/// Source cache directory: the flag if given, else the user cache dir
pub(crate) fn cache_dir(flag: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(PathBuf::from(dir));
    }
    dirs::cache_dir()
        .map(|dir| dir.join("relocator").join("sources"))
        .context("Could not determine a cache directory; pass --cache-dir")
}
