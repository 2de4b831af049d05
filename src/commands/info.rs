// src/commands/info.rs

//! Info command - show recipe metadata

use super::load_recipe;
use anyhow::Result;
use relocator::recipe::executable_name;

/// Print what a recipe installs and where it comes from
pub fn cmd_info(recipe_path: &str) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    let package = &recipe.package;

    println!("{} {}", package.name, package.version);
    if let Some(description) = &package.description {
        println!("  {}", description);
    }
    if let Some(homepage) = &package.homepage {
        println!("Homepage:   {}", homepage);
    }
    if let Some(license) = &package.license {
        println!("License:    {}", license);
    }
    if !package.platforms.is_empty() {
        println!("Platforms:  {}", package.platforms.join(", "));
    }
    println!("Source:     {}", recipe.source_url());
    println!("SHA-256:    {}", recipe.source.sha256);
    println!("Executable: bin/{}", executable_name(&recipe));
    println!(
        "Support:    {}/, {}/",
        recipe.layout.lib, recipe.layout.resources
    );
    println!("Patches:    {}=", recipe.patch.variable);

    if let Some(test) = &recipe.test {
        println!(
            "Test:       {} {} (expects '{}')",
            executable_name(&recipe),
            test.args.join(" "),
            test.expect
        );
    }

    if let Some(caveats) = recipe.caveats_text() {
        println!();
        println!("Caveats:");
        print!("{}", caveats);
    }

    Ok(())
}
