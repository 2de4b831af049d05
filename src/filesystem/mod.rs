// src/filesystem/mod.rs

//! Filesystem helpers for staging and committing an install
//!
//! - [`copy`]: file and tree copies plus cross-device aware moves
//! - [`path`]: validation of paths read from source archives

pub mod copy;
pub mod path;

pub use copy::{copy_file, copy_tree, move_into_place};
pub use path::{archive_entry_path, check_link_target};
