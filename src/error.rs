//! Suite-aborting errors
//!
//! Everything in here stops the run before (or instead of) the per-test
//! report. Per-test problems are not errors: see `runner::executor::Failure`.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that abort the whole testsuite run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot locate the repository root (no tests/ directory found); pass --root or set GOLDTEST_ROOT")]
    RootNotFound,

    #[error("no library project (*.gpr) found in '{}'; pass --project", .0.display())]
    NoLibraryProject(PathBuf),

    #[error("several library projects found in '{}' ({}); pass --project", .dir.display(), .candidates.join(", "))]
    AmbiguousLibraryProject { dir: PathBuf, candidates: Vec<String> },

    #[error("duplicate testcase name '{name}': '{}' and '{}'", .first.display(), .second.display())]
    DuplicateTestcase { name: String, first: PathBuf, second: PathBuf },

    #[error("failed to run build tool '{program}': {source}")]
    BuildSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build failed ({status})")]
    BuildFailed { status: ExitStatus },
}

impl HarnessError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
