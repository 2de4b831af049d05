// src/recipe/parser.rs

//! Recipe file parsing and validation

use crate::error::{Error, Result};
use crate::hash::Sha256Digest;
use crate::install::check_support_dirs;
use crate::recipe::format::Recipe;
use std::path::Path;

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::InvalidRecipe(format!("{}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidRecipe(format!("failed to read {}: {}", path.display(), e))
    })?;

    parse_recipe(&content)
}

/// Validate a recipe, returning non-fatal warnings
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if recipe.package.name.trim().is_empty() {
        return Err(Error::InvalidRecipe("package name cannot be empty".to_string()));
    }
    if recipe.package.version.trim().is_empty() {
        return Err(Error::InvalidRecipe("package version cannot be empty".to_string()));
    }

    if recipe.source.url.trim().is_empty() {
        return Err(Error::InvalidRecipe("source url cannot be empty".to_string()));
    }
    Sha256Digest::parse(recipe.source.sha256.trim())
        .map_err(|e| Error::InvalidRecipe(format!("source sha256: {}", e)))?;

    let executable = executable_name(recipe);
    if executable.is_empty() || executable.contains('/') || executable == "." || executable == ".."
    {
        return Err(Error::InvalidRecipe(format!(
            "executable must be a single file name, got '{}'",
            executable
        )));
    }

    check_support_dirs(&recipe.layout.lib, &recipe.layout.resources)?;

    if !is_shell_identifier(&recipe.patch.variable) {
        return Err(Error::InvalidRecipe(format!(
            "patch variable '{}' is not a valid shell identifier",
            recipe.patch.variable
        )));
    }

    if let Some(test) = &recipe.test {
        if test.expect.is_empty() {
            return Err(Error::InvalidRecipe("test.expect cannot be empty".to_string()));
        }
        if test.timeout_secs == 0 {
            return Err(Error::InvalidRecipe("test.timeout_secs must be positive".to_string()));
        }
    }

    if recipe.package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }
    if recipe.package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if recipe.package.homepage.is_none() {
        warnings.push("Missing package homepage".to_string());
    }
    if recipe.test.is_none() {
        warnings.push("No smoke test defined".to_string());
    }

    Ok(warnings)
}

/// Executable file name, falling back to the package name
pub fn executable_name(recipe: &Recipe) -> &str {
    recipe
        .layout
        .executable
        .as_deref()
        .unwrap_or(recipe.package.name.as_str())
}

fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
