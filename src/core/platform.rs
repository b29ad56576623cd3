//! Host platform detection and classifier normalization.
//!
//! A [`Platform`] is computed once when the pipeline starts and passed to
//! every stage. Stages never consult `std::env::consts` themselves.

use std::fmt;

use anyhow::{bail, Result};

/// OS prefixes produced by other tooling, mapped to the canonical names
/// used under `natives/`.
const OS_ALIASES: &[(&str, &str)] = &[
    ("darwin", "macos"),
    ("osx", "macos"),
    ("win32", "windows"),
    ("win", "windows"),
];

/// Architecture suffixes, mapped the same way.
const ARCH_ALIASES: &[(&str, &str)] = &[
    ("amd64", "x86_64"),
    ("x64", "x86_64"),
    ("arm64", "aarch64"),
];

fn lookup<'a>(table: &[(&str, &'a str)], raw: &'a str) -> &'a str {
    table
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map_or(raw, |(_, canonical)| *canonical)
}

/// Map a raw `<os>-<arch>` identifier to its canonical classifier.
///
/// The OS prefix and the architecture suffix are normalized independently,
/// so `osx-arm64` becomes `macos-aarch64`. Parts with no alias are kept.
pub fn normalize_classifier(raw: &str) -> String {
    match raw.split_once('-') {
        Some((os, arch)) => format!(
            "{}-{}",
            lookup(OS_ALIASES, os),
            lookup(ARCH_ALIASES, arch)
        ),
        None => raw.to_string(),
    }
}

/// Operating system family, which decides patching, CMake flags and
/// library file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
}

impl OsFamily {
    /// Classify an OS name. Anything that is neither Windows nor macOS is
    /// treated as a Linux-like Unix.
    pub fn from_os_name(os: &str) -> Self {
        let os = os.to_ascii_lowercase();
        if os.contains("win") && !os.contains("darwin") {
            OsFamily::Windows
        } else if os.contains("mac") || os.contains("darwin") || os == "osx" {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
        }
    }

    /// Whether the build descriptor should be scrubbed of host CPU flags.
    pub fn is_unix(&self) -> bool {
        matches!(self, OsFamily::Linux | OsFamily::MacOs)
    }

    /// File names a shared library called `name` is produced under.
    ///
    /// Windows has two spellings: MSVC emits `name.dll`, MinGW `libname.dll`.
    pub fn shared_library_names(&self, name: &str) -> Vec<String> {
        match self {
            OsFamily::Linux => vec![format!("lib{}.so", name)],
            OsFamily::MacOs => vec![format!("lib{}.dylib", name)],
            OsFamily::Windows => vec![format!("{}.dll", name), format!("lib{}.dll", name)],
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
    Other(String),
}

impl Arch {
    pub fn from_raw(arch: &str) -> Self {
        let arch = arch.to_ascii_lowercase();
        if arch.contains("aarch64") || arch.contains("arm64") {
            Arch::Aarch64
        } else if arch == "x86_64" || arch == "amd64" || arch == "x64" || arch == "x86-64" {
            Arch::X86_64
        } else {
            Arch::Other(arch.replace('-', "_"))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Other(s) => s,
        }
    }

    /// Visual Studio generator platform passed to `cmake -A`.
    pub fn msvc_platform(&self) -> Option<&'static str> {
        match self {
            Arch::X86_64 => Some("x64"),
            Arch::Aarch64 => Some("ARM64"),
            Arch::Other(_) => None,
        }
    }

    /// Value for `CMAKE_OSX_ARCHITECTURES`.
    pub fn osx_architecture(&self) -> &str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "arm64",
            Arch::Other(s) => s,
        }
    }
}

/// The platform natives are built and staged for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Platform { os, arch }
    }

    /// Detect the platform of the running host.
    pub fn detect() -> Self {
        Platform {
            os: OsFamily::from_os_name(std::env::consts::OS),
            arch: Arch::from_raw(std::env::consts::ARCH),
        }
    }

    /// Parse a platform identifier such as `linux-x86_64` or `darwin-arm64`.
    pub fn parse(id: &str) -> Result<Self> {
        let canonical = normalize_classifier(id.trim());
        let Some((os, arch)) = canonical.split_once('-') else {
            bail!(
                "invalid platform identifier `{}`\n\
                 expected `<os>-<arch>`, e.g. `linux-x86_64` or `macos-aarch64`",
                id
            );
        };

        let os = match os {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            other => bail!(
                "unsupported operating system `{}` in platform `{}`\n\
                 supported: linux, macos, windows",
                other,
                id
            ),
        };

        if arch.is_empty() {
            bail!("missing architecture in platform `{}`", id);
        }

        Ok(Platform {
            os,
            arch: Arch::from_raw(arch),
        })
    }

    /// Canonical classifier naming the `natives/<classifier>/` directory.
    pub fn classifier(&self) -> String {
        normalize_classifier(&format!("{}-{}", self.os.as_str(), self.arch.as_str()))
    }

    /// Shared library file names to look for on this platform.
    pub fn shared_library_names(&self, name: &str) -> Vec<String> {
        self.os.shared_library_names(name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.classifier())
    }
}
