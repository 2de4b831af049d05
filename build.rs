// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file
fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .required(true)
        .value_name("RECIPE")
        .help("Path to the recipe file")
}

/// Common argument: source cache directory
fn cache_dir_arg() -> Arg {
    Arg::new("cache_dir")
        .long("cache-dir")
        .value_name("DIR")
        .help("Source archive cache directory")
}

/// Common argument: smoke test timeout
fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .long("timeout")
        .value_name("SECS")
        .help("Smoke test timeout in seconds")
}

fn build_cli() -> Command {
    Command::new("relocator")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Relocator Contributors")
        .about("Relocatable installer for self-contained command-line tools")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("install")
                .about("Install a tool from a recipe")
                .arg(recipe_arg())
                .arg(
                    Arg::new("root")
                        .short('r')
                        .long("root")
                        .required(true)
                        .help("Installation root for lib/ and resources/"),
                )
                .arg(
                    Arg::new("bin_dir")
                        .short('b')
                        .long("bin-dir")
                        .required(true)
                        .help("Directory the executable is installed into"),
                )
                .arg(cache_dir_arg())
                .arg(
                    Arg::new("source")
                        .long("source")
                        .help("Install from an already extracted source tree"),
                )
                .arg(
                    Arg::new("no_test")
                        .long("no-test")
                        .action(ArgAction::SetTrue)
                        .help("Skip the post-install smoke test"),
                )
                .arg(
                    Arg::new("ignore_platform")
                        .long("ignore-platform")
                        .action(ArgAction::SetTrue)
                        .help("Install even if the recipe does not list this platform"),
                )
                .arg(timeout_arg()),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch and verify a recipe's source archive")
                .arg(recipe_arg())
                .arg(cache_dir_arg())
                .arg(
                    Arg::new("dest")
                        .short('d')
                        .long("dest")
                        .help("Also extract the archive into this directory"),
                ),
        )
        .subcommand(
            Command::new("test")
                .about("Smoke test an installed tool")
                .arg(recipe_arg())
                .arg(
                    Arg::new("bin_dir")
                        .short('b')
                        .long("bin-dir")
                        .required(true)
                        .help("Directory the executable was installed into"),
                )
                .arg(timeout_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Show recipe metadata")
                .arg(recipe_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = out_dir.join("relocator.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
