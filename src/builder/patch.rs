//! Build descriptor patching.
//!
//! Upstream CMakeLists files sometimes hardcode flags that tune the binary
//! for the machine it was compiled on. Redistributed natives must run on any
//! CPU of the target architecture, so those flags are stripped before
//! configuring.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::util::fs::{read_to_string, write_string};

/// Result of [`strip_native_cpu_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// There was no descriptor to patch.
    Missing,
    /// The descriptor contained no host-specific flags.
    AlreadyClean,
    /// This many flags were removed.
    Patched(usize),
}

static NATIVE_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*-m(?:arch|tune|cpu)=native\b").unwrap());

/// Remove `-march=native`, `-mtune=native` and `-mcpu=native` from text.
///
/// Returns the new text and the number of flags removed.
pub fn strip_native_flags(text: &str) -> (String, usize) {
    let count = NATIVE_FLAG.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (NATIVE_FLAG.replace_all(text, "").into_owned(), count)
}

/// Strip host CPU flags from the descriptor at `path`, in place.
///
/// Safe to run repeatedly. A missing descriptor is not an error.
pub fn strip_native_cpu_flags(path: &Path) -> Result<PatchOutcome> {
    if !path.is_file() {
        tracing::debug!("No descriptor at {}, nothing to patch", path.display());
        return Ok(PatchOutcome::Missing);
    }

    let original = read_to_string(path)?;
    let (patched, removed) = strip_native_flags(&original);

    if removed == 0 {
        return Ok(PatchOutcome::AlreadyClean);
    }

    write_string(path, &patched)?;
    tracing::info!("Removed {} host CPU flag(s) from {}", removed, path.display());
    Ok(PatchOutcome::Patched(removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"cmake_minimum_required(VERSION 3.10)
project(isyntax C)
if (CMAKE_C_COMPILER_ID MATCHES "GNU|Clang")
    set(CMAKE_C_FLAGS "${CMAKE_C_FLAGS} -march=native -mtune=native -O2")
endif()
add_compile_options(-mcpu=native)
add_library(isyntax src/isyntax.c)
"#;

    #[test]
    fn test_strip_all_variants() {
        let (patched, removed) = strip_native_flags(DESCRIPTOR);
        assert_eq!(removed, 3);
        assert!(!patched.contains("=native"));
        assert!(patched.contains(r#"set(CMAKE_C_FLAGS "${CMAKE_C_FLAGS} -O2")"#));
        assert!(patched.contains("add_compile_options()"));
        assert!(patched.contains("add_library(isyntax src/isyntax.c)"));
    }

    #[test]
    fn test_leaves_other_flags_alone() {
        let text = "set(FLAGS \"-march=x86-64-v2 -mnative-ish -O3\")\n";
        let (patched, removed) = strip_native_flags(text);
        assert_eq!(removed, 0);
        assert_eq!(patched, text);
    }

    #[test]
    fn test_patch_file_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("CMakeLists.txt");
        fs::write(&path, DESCRIPTOR).unwrap();

        assert_eq!(strip_native_cpu_flags(&path).unwrap(), PatchOutcome::Patched(3));
        let once = fs::read_to_string(&path).unwrap();

        assert_eq!(strip_native_cpu_flags(&path).unwrap(), PatchOutcome::AlreadyClean);
        let twice = fs::read_to_string(&path).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_descriptor_is_noop() {
        let tmp = TempDir::new().unwrap();
        let outcome = strip_native_cpu_flags(&tmp.path().join("CMakeLists.txt")).unwrap();
        assert_eq!(outcome, PatchOutcome::Missing);
        assert!(!tmp.path().join("CMakeLists.txt").exists());
    }
}
