//! Filesystem layout of a testsuite
//!
//! ```text
//! <root>/
//!   <library>.gpr
//!   tests/                  test-source root (testcases live anywhere below)
//!     tmp/                  scratch root, owned by the harness
//!       tests.gpr           generated project file
//!       obj-<mode>/         objects and executables
//!       <testcase>/actual.out
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, HarnessResult};

/// Name of the test-source directory below the root.
pub const TESTS_DIR_NAME: &str = "tests";
/// Name of the scratch directory below the test-source root.
pub const SCRATCH_DIR_NAME: &str = "tmp";
/// File name of the generated project file inside the scratch root.
pub const DESCRIPTOR_FILE_NAME: &str = "tests.gpr";
/// File name of the captured output inside a testcase's scratch directory.
pub const ACTUAL_OUTPUT_FILE_NAME: &str = "actual.out";
/// Environment variable consulted when `--root` is not given.
pub const ROOT_ENV_VAR: &str = "GOLDTEST_ROOT";

/// Resolved locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    tests_dir: PathBuf,
    scratch_dir: PathBuf,
    library_project: PathBuf,
}

impl Layout {
    /// Build a layout below `root`. When `library_project` is `None` the
    /// single `*.gpr` file in `root` is used.
    pub fn new(root: impl AsRef<Path>, library_project: Option<&Path>) -> HarnessResult<Self> {
        let root = absolute(root.as_ref())?;
        let tests_dir = root.join(TESTS_DIR_NAME);
        let scratch_dir = tests_dir.join(SCRATCH_DIR_NAME);
        let library_project = match library_project {
            Some(path) => absolute(path)?,
            None => find_library_project(&root)?,
        };
        Ok(Self {
            root,
            tests_dir,
            scratch_dir,
            library_project,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn library_project(&self) -> &Path {
        &self.library_project
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.scratch_dir.join(DESCRIPTOR_FILE_NAME)
    }

    /// Object directory for a build mode, relative to the descriptor: `obj-<mode>`.
    pub fn object_dir_name(build_mode: &str) -> String {
        format!("obj-{}", build_mode)
    }

    pub fn object_dir(&self, build_mode: &str) -> PathBuf {
        self.scratch_dir.join(Self::object_dir_name(build_mode))
    }

    /// Path of the executable built for testcase `name`.
    pub fn executable(&self, build_mode: &str, name: &str) -> PathBuf {
        self.object_dir(build_mode)
            .join(format!("{}{}", name, env::consts::EXE_SUFFIX))
    }

    pub fn testcase_scratch_dir(&self, name: &str) -> PathBuf {
        self.scratch_dir.join(name)
    }

    pub fn actual_output(&self, name: &str) -> PathBuf {
        self.testcase_scratch_dir(name).join(ACTUAL_OUTPUT_FILE_NAME)
    }
}

/// Find the repository root when none was given explicitly.
///
/// Tries, in order: `GOLDTEST_ROOT`, the current directory, then the
/// directories above the running executable (covers `target/debug/goldtest`).
pub fn resolve_root(explicit: Option<&Path>) -> HarnessResult<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }

    if let Ok(root) = env::var(ROOT_ENV_VAR) {
        let root = PathBuf::from(root);
        if has_tests_dir(&root) {
            return Ok(root);
        }
        tracing::warn!("{} is set to '{}' but it has no tests/ directory", ROOT_ENV_VAR, root.display());
    }

    if let Ok(cwd) = env::current_dir() {
        if has_tests_dir(&cwd) {
            return Ok(cwd);
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        for dir in exe_path.ancestors().skip(1) {
            if has_tests_dir(dir) {
                return Ok(dir.to_path_buf());
            }
        }
    }

    Err(HarnessError::RootNotFound)
}

fn has_tests_dir(dir: &Path) -> bool {
    dir.join(TESTS_DIR_NAME).is_dir()
}

fn absolute(path: &Path) -> HarnessResult<PathBuf> {
    std::path::absolute(path).map_err(|e| HarnessError::io("cannot resolve", path, e))
}

/// Locate the single `*.gpr` file directly inside `root`.
fn find_library_project(root: &Path) -> HarnessResult<PathBuf> {
    let entries = fs::read_dir(root).map_err(|e| HarnessError::io("cannot read directory", root, e))?;

    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "gpr"))
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(HarnessError::NoLibraryProject(root.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        _ => Err(HarnessError::AmbiguousLibraryProject {
            dir: root.to_path_buf(),
            candidates: candidates
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("lib.gpr")).unwrap();

        let layout = Layout::new(dir.path(), None).unwrap();
        assert_eq!(layout.root(), dir.path());
        assert_eq!(layout.tests_dir(), dir.path().join("tests"));
        assert_eq!(layout.scratch_dir(), dir.path().join("tests").join("tmp"));
        assert_eq!(layout.library_project(), dir.path().join("lib.gpr"));
        assert_eq!(layout.descriptor_path(), dir.path().join("tests/tmp/tests.gpr"));
        assert_eq!(layout.actual_output("foo"), dir.path().join("tests/tmp/foo/actual.out"));
        assert_eq!(
            layout.executable("release", "foo"),
            dir.path()
                .join("tests/tmp/obj-release")
                .join(format!("foo{}", env::consts::EXE_SUFFIX))
        );
    }

    #[test]
    fn test_no_library_project() {
        let dir = tempdir().unwrap();
        let err = Layout::new(dir.path(), None).unwrap_err();
        assert!(matches!(err, HarnessError::NoLibraryProject(_)));
    }

    #[test]
    fn test_ambiguous_library_project() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.gpr")).unwrap();
        File::create(dir.path().join("b.gpr")).unwrap();

        match Layout::new(dir.path(), None).unwrap_err() {
            HarnessError::AmbiguousLibraryProject { candidates, .. } => {
                assert_eq!(candidates, vec!["a.gpr".to_string(), "b.gpr".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_explicit_library_project_skips_lookup() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.gpr")).unwrap();
        File::create(dir.path().join("b.gpr")).unwrap();

        let layout = Layout::new(dir.path(), Some(&dir.path().join("b.gpr"))).unwrap();
        assert_eq!(layout.library_project(), dir.path().join("b.gpr"));
    }

    #[test]
    fn test_resolve_root_explicit_wins() {
        let dir = tempdir().unwrap();
        let root = resolve_root(Some(dir.path())).unwrap();
        assert_eq!(root, dir.path());
    }
}
