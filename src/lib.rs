// src/lib.rs

//! Relocator
//!
//! Installs self-contained command-line tools whose launcher locates its
//! support files through a `BASE_DIR=` assignment. The tool's `lib/` and
//! `resources/` go under an install root, the launcher goes into a bin
//! directory, and the assignment is rewritten to point at the root.
//!
//! # Architecture
//!
//! - Recipes: declarative TOML describing the package, source and layout
//! - Source: checksum-verified fetch with a digest-keyed cache
//! - Install: staged copy, single-line patch, atomic commit, smoke test
//!
//! ```no_run
//! use relocator::{Installer, SmokeTest};
//! use std::path::Path;
//!
//! let installed = Installer::new("ubo")
//!     .with_smoke_test(SmokeTest::new("ubo"))
//!     .install(
//!         Path::new("/tmp/ubo-0.1.0"),
//!         Path::new("/opt/ubo"),
//!         Path::new("/usr/local/bin"),
//!     )?;
//! println!("{}", installed.executable.display());
//! # Ok::<(), relocator::Error>(())
//! ```

mod error;
pub mod filesystem;
pub mod hash;
pub mod install;
pub mod recipe;
pub mod source;

pub use error::{Error, Result};
pub use hash::Sha256Digest;
pub use install::{
    ConfigPatch, InstallLayout, InstallReceipt, InstalledLayout, Installer, SmokeTest,
};
pub use recipe::Recipe;
pub use source::SourcePackage;
