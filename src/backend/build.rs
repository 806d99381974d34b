//! Build step - one `gprbuild` invocation for the whole testsuite
//!
//! A failed build aborts the run: there is no way to tell which testcase a
//! partial build failure belongs to, so it is never turned into per-test
//! failures.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{HarnessError, HarnessResult};

/// Default build tool program.
pub const DEFAULT_BUILD_TOOL: &str = "gprbuild";
/// Default build mode (`-XBUILD_MODE=debug`).
pub const DEFAULT_BUILD_MODE: &str = "debug";

/// A configured build of the generated project.
#[derive(Debug, Clone)]
pub struct Builder {
    program: String,
    build_mode: String,
    project_file: PathBuf,
}

impl Builder {
    pub fn new(program: impl Into<String>, build_mode: impl Into<String>, project_file: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            build_mode: build_mode.into(),
            project_file: project_file.as_ref().to_path_buf(),
        }
    }

    /// Arguments passed to the build tool: parallel (`-j0`), create missing
    /// object dirs (`-p`), quiet (`-q`), the build mode and the project file.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-j0".to_string(),
            "-p".to_string(),
            "-q".to_string(),
            format!("-XBUILD_MODE={}", self.build_mode),
            format!("-P{}", self.project_file.display()),
        ]
    }

    /// Run the build tool, inheriting stdio so compiler diagnostics reach the user.
    pub fn build(&self) -> HarnessResult<()> {
        let args = self.args();
        tracing::debug!("running {} {}", self.program, args.join(" "));

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|source| HarnessError::BuildSpawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(HarnessError::BuildFailed { status })
        }
    }
}
