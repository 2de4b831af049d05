// tests/install_integration.rs

//! End-to-end install tests against fixture source trees.
//!
//! Every test installs into a fresh temporary root so the host is never
//! touched. The fixture launcher sources `lib/common.sh` through
//! `BASE_DIR`, so a passing smoke test proves the patched path resolves.

mod common;

use common::{SourceTree, snapshot};
use relocator::install::{InstallLock, read_assignment};
use relocator::{Error, InstallReceipt, Installer, SmokeTest};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

fn ubo_installer() -> Installer {
    Installer::new("ubo")
        .with_caveats("To set up uBlock Origin in Chrome, run:\n  ubo install\n")
        .with_smoke_test(SmokeTest::new("ubo"))
}

#[test]
fn test_end_to_end_install() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("opt/ubo");
    let bin = temp.path().join("bin");

    let installed = ubo_installer()
        .install(source.path(), &root, &bin)
        .unwrap();

    assert_eq!(installed.executable, bin.join("ubo"));
    assert_eq!(installed.lib_dir, root.join("lib"));
    assert_eq!(installed.resources_dir, root.join("resources"));
    assert_eq!(
        fs::read_to_string(root.join("lib/a.txt")).unwrap(),
        "library data\n"
    );
    assert_eq!(
        fs::read_to_string(root.join("resources/b.txt")).unwrap(),
        "resource data\n"
    );
    assert!(root.join("resources/icons/app.icns").is_file());

    let mode = fs::metadata(&installed.executable).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    let output = installed.smoke_test_output.unwrap();
    assert!(output.contains("ubo 0.1.0"));
    assert!(installed.caveats.unwrap().contains("ubo install"));
}

#[test]
fn test_patched_line_points_at_root() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("tmp/x");
    let bin = temp.path().join("bin");

    Installer::new("ubo")
        .install(source.path(), &root, &bin)
        .unwrap();

    let value = read_assignment(&bin.join("ubo"), "BASE_DIR").unwrap();
    assert_eq!(value, Some(format!("\"{}\"", root.display())));

    // Every other line is untouched
    let installed = fs::read_to_string(bin.join("ubo")).unwrap();
    let original: Vec<_> = common::UBO_LAUNCHER.lines().collect();
    let patched: Vec<_> = installed.lines().collect();
    assert_eq!(original.len(), patched.len());
    for (before, after) in original.iter().zip(&patched) {
        if !before.starts_with("BASE_DIR=") {
            assert_eq!(before, after);
        }
    }
}

#[test]
fn test_installed_executable_resolves_root() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("opt/ubo");
    let bin = temp.path().join("bin");

    let installed = Installer::new("ubo")
        .with_smoke_test(SmokeTest::new(root.display().to_string()).with_args(["where"]))
        .install(source.path(), &root, &bin)
        .unwrap();

    assert_eq!(
        installed.smoke_test_output.unwrap().trim_end(),
        root.display().to_string()
    );
}

#[test]
fn test_reinstall_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");
    let installer = ubo_installer();

    installer.install(source.path(), &root, &bin).unwrap();
    let lib_first = snapshot(&root.join("lib"));
    let resources_first = snapshot(&root.join("resources"));
    let exe_first = fs::read(bin.join("ubo")).unwrap();

    installer.install(source.path(), &root, &bin).unwrap();

    assert_eq!(snapshot(&root.join("lib")), lib_first);
    assert_eq!(snapshot(&root.join("resources")), resources_first);
    assert_eq!(fs::read(bin.join("ubo")).unwrap(), exe_first);
}

#[test]
fn test_reinstall_drops_stale_files() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    Installer::new("ubo").install(source.path(), &root, &bin).unwrap();
    fs::write(root.join("lib/leftover.sh"), "stale").unwrap();

    Installer::new("ubo").install(source.path(), &root, &bin).unwrap();
    assert!(!root.join("lib/leftover.sh").exists());
}

#[test]
fn test_missing_lib_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path()).remove("lib");
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let err = ubo_installer()
        .install(source.path(), &root, &bin)
        .unwrap_err();

    match err {
        Error::MissingSourceEntry { entry, .. } => assert_eq!(entry, "lib"),
        other => panic!("expected MissingSourceEntry, got {other:?}"),
    }
    assert!(!root.exists());
    assert!(!bin.exists());
    assert!(!InstallLock::path_for(&root).exists());
}

#[test]
fn test_missing_executable_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path()).remove("bin/ubo");
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let err = ubo_installer()
        .install(source.path(), &root, &bin)
        .unwrap_err();

    assert!(matches!(err, Error::MissingSourceEntry { .. }));
    assert!(err.to_string().contains("bin/ubo"));
    assert!(!root.exists());
}

#[test]
fn test_zero_matches_leaves_no_executable() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path())
        .executable("ubo", "#!/bin/sh\nROOT=\"$(dirname \"$0\")\"\necho ubo\n");
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let err = ubo_installer()
        .install(source.path(), &root, &bin)
        .unwrap_err();

    assert!(matches!(err, Error::PatchTargetNotFound { .. }));
    assert!(!bin.join("ubo").exists());
    assert!(!root.join("lib").exists());
    assert_no_staging_left(temp.path());
}

#[test]
fn test_duplicate_matches_leave_no_executable() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path())
        .executable("ubo", "#!/bin/sh\nBASE_DIR=/a\nBASE_DIR=/b\necho ubo\n");
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let err = ubo_installer()
        .install(source.path(), &root, &bin)
        .unwrap_err();

    assert!(matches!(err, Error::PatchTargetAmbiguous { count: 2, .. }));
    assert!(!bin.join("ubo").exists());
    assert_no_staging_left(temp.path());
}

#[test]
fn test_failed_patch_keeps_previous_install() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let good = SourceTree::ubo(temp.path());
    Installer::new("ubo").install(good.path(), &root, &bin).unwrap();
    let before = fs::read(bin.join("ubo")).unwrap();

    let bad = SourceTree::ubo(&temp.path().join("bad")).executable("ubo", "#!/bin/sh\n");
    assert!(Installer::new("ubo").install(bad.path(), &root, &bin).is_err());

    assert_eq!(fs::read(bin.join("ubo")).unwrap(), before);
    assert!(root.join("lib/common.sh").is_file());
}

#[test]
fn test_smoke_test_failure_keeps_artifacts() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let err = Installer::new("ubo")
        .with_smoke_test(SmokeTest::new("not in output"))
        .install(source.path(), &root, &bin)
        .unwrap_err();

    assert!(matches!(err, Error::SmokeTestFailed { .. }));
    assert!(bin.join("ubo").is_file());
    assert!(root.join("lib/a.txt").is_file());
}

#[test]
fn test_install_writes_only_root_and_bin() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(&temp.path().join("upstream"));
    let prefix = temp.path().join("prefix");
    let root = prefix.join("ubo");
    let bin = prefix.join("bin");

    ubo_installer().install(source.path(), &root, &bin).unwrap();

    let mut entries: Vec<_> = fs::read_dir(&prefix)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["bin".to_string(), "ubo".to_string()]);
    assert!(InstallLock::path_for(&root).starts_with(&root));
}

#[test]
fn test_receipt_records_install() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    let installed = Installer::new("ubo")
        .with_package("ubo", "0.1.0")
        .install(source.path(), &root, &bin)
        .unwrap();

    assert_eq!(installed.receipt, root.join("INSTALL_RECEIPT.json"));
    let receipt = InstallReceipt::read(&root).unwrap().unwrap();
    assert_eq!(receipt.package, "ubo");
    assert_eq!(receipt.install_root, root);
    assert_eq!(receipt.executable, bin.join("ubo"));
}

#[test]
fn test_symlinks_in_lib_preserved() {
    let temp = TempDir::new().unwrap();
    let source = SourceTree::ubo(temp.path());
    std::os::unix::fs::symlink("common.sh", source.path().join("lib/current.sh")).unwrap();
    let root = temp.path().join("root");
    let bin = temp.path().join("bin");

    Installer::new("ubo").install(source.path(), &root, &bin).unwrap();

    let link = root.join("lib/current.sh");
    assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), Path::new("common.sh"));
}

fn assert_no_staging_left(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains("-staging-"))
        .collect();
    assert!(leftovers.is_empty(), "staging dirs left behind: {leftovers:?}");
}
