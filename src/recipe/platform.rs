// src/recipe/platform.rs

//! Host platform requirement checks

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;

/// Normalize an OS name so recipe spellings match `std::env::consts::OS`
fn normalize_os(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "darwin" | "macos" | "osx" => "macos".to_string(),
        other => other.to_string(),
    }
}

/// Check that `os` satisfies the recipe's platform list
pub fn check_platform_for(recipe: &Recipe, os: &str) -> Result<()> {
    if recipe.package.platforms.is_empty() {
        return Ok(());
    }

    let actual = normalize_os(os);
    if recipe
        .package
        .platforms
        .iter()
        .any(|p| normalize_os(p) == actual)
    {
        return Ok(());
    }

    Err(Error::UnsupportedPlatform {
        package: recipe.package.name.clone(),
        required: recipe.package.platforms.join(", "),
        actual,
    })
}

/// Check the recipe against the running host
pub fn check_platform(recipe: &Recipe) -> Result<()> {
    check_platform_for(recipe, std::env::consts::OS)
}
