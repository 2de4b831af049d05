// src/recipe/mod.rs

//! Install recipes
//!
//! Recipes are declarative TOML files: package metadata, a checksummed
//! source archive, the layout contract of the extracted tree, and the
//! smoke test. See `recipes/ubo.toml` for the shipped recipe.

pub mod format;
pub mod parser;
pub mod platform;

pub use format::{
    CaveatsSection, LayoutSection, PackageSection, PatchSection, Recipe, SourceSection,
    TestSection,
};
pub use parser::{executable_name, parse_recipe, parse_recipe_file, validate_recipe};
pub use platform::{check_platform, check_platform_for};
