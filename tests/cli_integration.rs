//! CLI integration tests for isyntax-natives.
//!
//! These tests drive the binary against throwaway project directories. None
//! of them need network access or a C toolchain.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the isyntax-natives binary command, isolated from the user's config.
fn natives(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("isyntax-natives").unwrap();
    cmd.env("HOME", home)
        .env_remove("ISYNTAX_NATIVES_OFFLINE")
        .env_remove("CMAKE");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn touch(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// ============================================================================
// isyntax-natives platform
// ============================================================================

#[test]
fn test_platform_normalizes_override() {
    let tmp = temp_dir();

    natives(tmp.path())
        .args(["platform", "--platform", "darwin-arm64"])
        .assert()
        .success()
        .stdout("macos-aarch64\n");

    natives(tmp.path())
        .args(["--platform", "win32-x86_64", "platform"])
        .assert()
        .success()
        .stdout("windows-x86_64\n");
}

#[test]
fn test_platform_detects_host() {
    let tmp = temp_dir();

    natives(tmp.path())
        .arg("platform")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^(linux|macos|windows)-\w+\n$").unwrap());
}

#[test]
fn test_unknown_platform_rejected() {
    let tmp = temp_dir();

    natives(tmp.path())
        .args(["platform", "--platform", "solaris-sparc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// ============================================================================
// isyntax-natives fetch
// ============================================================================

#[test]
fn test_offline_fetch_without_sources_fails() {
    let tmp = temp_dir();

    natives(tmp.path())
        .args(["fetch", "--offline"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unable to fetch sources"))
        .stderr(predicate::str::contains("skipped in offline mode"));

    assert!(!tmp.path().join("third_party/libisyntax").exists());
}

#[test]
fn test_fetch_is_noop_when_sources_present() {
    let tmp = temp_dir();
    touch(
        &tmp.path().join("third_party/libisyntax/CMakeLists.txt"),
        "project(isyntax C)\n",
    );

    natives(tmp.path())
        .args(["fetch", "--offline"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Fresh"));
}

#[test]
fn test_fetch_from_local_mirror_reports_each_step_once() {
    let tmp = temp_dir();
    let mirror = tmp.path().join("mirror");
    touch(&mirror.join("CMakeLists.txt"), "project(isyntax C)\n");

    let repo = git2::Repository::init(&mirror).unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::now("Mirror", "mirror@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "Import", &tree, &[])
        .unwrap();

    touch(
        &tmp.path().join("natives.toml"),
        "[source]\ngit = \"mirror\"\n",
    );

    natives(tmp.path())
        .args(["fetch", "--offline"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Fetching"))
        .stderr(predicate::str::contains("Finished"))
        .stderr(predicate::str::contains("Cloning").not());

    assert!(tmp
        .path()
        .join("third_party/libisyntax/CMakeLists.txt")
        .is_file());
}

#[test]
fn test_fetch_refuses_occupied_target() {
    let tmp = temp_dir();
    touch(
        &tmp.path().join("third_party/libisyntax/libisyntax.so"),
        "prebuilt",
    );

    natives(tmp.path())
        .args(["fetch", "--offline"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not empty"));

    let kept = tmp.path().join("third_party/libisyntax/libisyntax.so");
    assert_eq!(fs::read_to_string(kept).unwrap(), "prebuilt");
}

// ============================================================================
// isyntax-natives build
// ============================================================================

#[test]
fn test_build_without_sources_fails() {
    let tmp = temp_dir();

    natives(tmp.path())
        .args(["build", "--platform", "linux-x86_64"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("native source tree missing"))
        .stderr(predicate::str::contains("isyntax-natives fetch"));
}

// ============================================================================
// isyntax-natives package / assemble
// ============================================================================

#[test]
fn test_package_stages_prebuilt_library_from_source_tree() {
    let tmp = temp_dir();
    touch(
        &tmp.path().join("third_party/libisyntax/out/libisyntax.so"),
        "prebuilt",
    );

    natives(tmp.path())
        .args(["package", "--platform", "linux-x86_64"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Staged"));

    let staged = tmp
        .path()
        .join("build/packaged-natives/natives/linux-x86_64/libisyntax.so");
    assert_eq!(fs::read_to_string(staged).unwrap(), "prebuilt");
}

#[test]
fn test_package_with_nothing_built_succeeds() {
    let tmp = temp_dir();

    natives(tmp.path())
        .args(["package", "--platform", "linux-x86_64"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("no isyntax library found"));
}

#[test]
fn test_assemble_uses_project_config() {
    let tmp = temp_dir();
    touch(
        &tmp.path().join("natives.toml"),
        "[package]\nname = \"isyntax-plugin\"\nversion = \"2.0.1\"\n",
    );
    touch(&tmp.path().join("build/libisyntax-build/libisyntax.so"), "elf");
    touch(
        &tmp.path().join("src/main/java/org/example/Loader.java"),
        "class Loader {}",
    );

    natives(tmp.path())
        .args(["--platform", "linux-x86_64", "package"])
        .arg("-C")
        .arg(tmp.path())
        .assert()
        .success();

    natives(tmp.path())
        .args(["--platform", "linux-x86_64", "assemble"])
        .arg("-C")
        .arg(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Packaged"));

    let dist = tmp.path().join("build/distributions");
    assert!(dist.join("isyntax-plugin-2.0.1.tar.gz").exists());
    assert!(dist.join("isyntax-plugin-2.0.1-sources.tar.gz").exists());

    let manifest = fs::read_to_string(dist.join("isyntax-plugin-2.0.1.json")).unwrap();
    assert!(manifest.contains("natives/linux-x86_64/libisyntax.so"));
}

#[test]
fn test_invalid_project_config_is_an_error() {
    let tmp = temp_dir();
    touch(&tmp.path().join("natives.toml"), "[build\njobs = ");

    natives(tmp.path())
        .arg("package")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("natives.toml"));
}

// ============================================================================
// isyntax-natives clean
// ============================================================================

#[test]
fn test_clean_keeps_sources_by_default() {
    let tmp = temp_dir();
    touch(&tmp.path().join("build/libisyntax-build/libisyntax.so"), "elf");
    touch(
        &tmp.path().join("third_party/libisyntax/CMakeLists.txt"),
        "project(x)",
    );

    natives(tmp.path())
        .arg("clean")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!tmp.path().join("build/libisyntax-build").exists());
    assert!(tmp.path().join("third_party/libisyntax").exists());

    natives(tmp.path())
        .args(["clean", "--all"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(!tmp.path().join("third_party/libisyntax").exists());
}

// ============================================================================
// isyntax-natives completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    natives(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("isyntax-natives"));
}

#[test]
fn test_help_lists_commands() {
    let tmp = temp_dir();

    natives(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("assemble"));
}
