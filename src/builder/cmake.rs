//! CMake driver.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::core::platform::{OsFamily, Platform};
use crate::util::errors::ProvisionError;
use crate::util::process::{find_cmake, output_tail, ProcessBuilder};

/// Lines of build output kept in a failure report.
const ERROR_TAIL_LINES: usize = 40;

/// An external build system able to configure and build a source tree.
///
/// [`CMake`] is the production implementation; tests substitute a fake that
/// writes artifacts directly.
pub trait BuildSystem {
    /// Name used in status output.
    fn name(&self) -> &str;

    /// Generate the build tree for `source` in `build_dir`.
    fn configure(&self, source: &Path, build_dir: &Path, args: &[String]) -> Result<()>;

    /// Build the configured tree.
    fn build(&self, build_dir: &Path, args: &[String]) -> Result<()>;
}

/// The `cmake` executable.
pub struct CMake {
    program: PathBuf,
}

impl CMake {
    /// Locate CMake on this machine.
    pub fn locate() -> Result<Self> {
        match find_cmake() {
            Some(program) => {
                tracing::debug!("Using CMake at {}", program.display());
                Ok(CMake { program })
            }
            None => Err(ProvisionError::ToolNotFound {
                tool: "cmake".to_string(),
                hint: install_hint().to_string(),
            }
            .into()),
        }
    }

    /// Use a specific CMake binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        CMake {
            program: program.into(),
        }
    }

    fn run(&self, step: &str, cmd: ProcessBuilder) -> Result<()> {
        let output = cmd.exec()?;
        check_status(step, &output)
    }
}

impl BuildSystem for CMake {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&self, source: &Path, build_dir: &Path, args: &[String]) -> Result<()> {
        tracing::debug!("Configuring {}", source.display());

        let cmd = ProcessBuilder::new(&self.program)
            .arg("-S")
            .arg(source)
            .arg("-B")
            .arg(build_dir)
            .args(args);

        self.run("cmake configure", cmd)
    }

    fn build(&self, build_dir: &Path, args: &[String]) -> Result<()> {
        tracing::debug!("Building in {}", build_dir.display());

        let cmd = ProcessBuilder::new(&self.program)
            .arg("--build")
            .arg(build_dir)
            .args(args);

        self.run("cmake build", cmd)
    }
}

fn check_status(step: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    // Generators such as Make report compiler errors on stdout.
    let stream = if output.stderr.iter().all(u8::is_ascii_whitespace) {
        &output.stdout
    } else {
        &output.stderr
    };

    Err(ProvisionError::BuildFailed {
        step: step.to_string(),
        code: output.status.code(),
        stderr: output_tail(stream, ERROR_TAIL_LINES),
    }
    .into())
}

fn install_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "install it with `brew install cmake` or set the CMAKE environment variable"
    } else if cfg!(windows) {
        "install it from https://cmake.org/download/ or set the CMAKE environment variable"
    } else {
        "install it with your package manager or set the CMAKE environment variable"
    }
}

/// Configure-time definitions for a shared, release-mode build on `platform`.
///
/// `extra` is appended last so user arguments can override the defaults.
pub fn configure_args(platform: &Platform, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        "-DCMAKE_BUILD_TYPE=Release".to_string(),
        "-DBUILD_SHARED_LIBS=ON".to_string(),
        "-DBUILD_TESTING=OFF".to_string(),
        "-DBUILD_EXAMPLES=OFF".to_string(),
    ];

    match platform.os {
        OsFamily::MacOs => {
            args.push(format!(
                "-DCMAKE_OSX_ARCHITECTURES={}",
                platform.arch.osx_architecture()
            ));
        }
        OsFamily::Windows => {
            // `-A` is only understood by Visual Studio generators.
            let custom_generator = extra.iter().any(|a| a.starts_with("-G"));
            if let (Some(arch), false) = (platform.arch.msvc_platform(), custom_generator) {
                args.push("-A".to_string());
                args.push(arch.to_string());
            }
            args.push("-DCMAKE_MSVC_RUNTIME_LIBRARY=MultiThreaded".to_string());
        }
        OsFamily::Linux => {}
    }

    args.extend(extra.iter().cloned());
    args
}

/// Arguments following `cmake --build <dir>`.
pub fn build_args(target: &str, jobs: Option<usize>) -> Vec<String> {
    let mut args = vec![
        "--target".to_string(),
        target.to_string(),
        "--config".to_string(),
        "Release".to_string(),
        "--parallel".to_string(),
    ];
    if let Some(jobs) = jobs {
        args.push(jobs.to_string());
    }
    args
}
