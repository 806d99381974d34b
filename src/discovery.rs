//! Testcase discovery
//!
//! A testcase is any `*.adb` file below the test-source root, except for the
//! harness's own scratch tree. Results are sorted by full path so that builds
//! and reports are reproducible.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{HarnessError, HarnessResult};

/// Extension of testcase source files (Ada main subprograms).
pub const TESTCASE_EXTENSION: &str = "adb";
/// Extension of golden files, next to the testcase source.
pub const EXPECTED_OUTPUT_EXTENSION: &str = "out";

/// A single discovered testcase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCase {
    source_path: PathBuf,
    name: String,
}

impl TestCase {
    /// Create a testcase from its source file. Returns `None` for paths
    /// without a UTF-8 file stem.
    pub fn from_source(source_path: impl Into<PathBuf>) -> Option<Self> {
        let source_path = source_path.into();
        let name = source_path.file_stem()?.to_str()?.to_string();
        Some(Self { source_path, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Directory holding the source, which is also where the golden file lives.
    pub fn source_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Source file name, used as the build entry point (`foo.adb`).
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    /// `<source_dir>/<name>.out`
    pub fn expected_output_path(&self) -> PathBuf {
        self.source_dir()
            .join(format!("{}.{}", self.name, EXPECTED_OUTPUT_EXTENSION))
    }
}

/// Discover all testcases below `tests_dir`, skipping the `scratch_name` subtree.
///
/// The result is sorted by source path. Two testcases with the same name in
/// different directories would share a build entry point and a scratch
/// directory, so that is reported as `HarnessError::DuplicateTestcase`.
pub fn discover_testcases(tests_dir: &Path, scratch_name: &str) -> HarnessResult<Vec<TestCase>> {
    let mut sources = Vec::new();
    collect_sources(tests_dir, tests_dir, scratch_name, &mut sources)?;
    // Whole-path string order: `a.b/x.adb` sorts before `a/y.adb`
    sources.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

    let mut testcases: Vec<TestCase> = Vec::with_capacity(sources.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for path in sources {
        let Some(testcase) = TestCase::from_source(&path) else {
            tracing::warn!("skipping testcase with non UTF-8 name: {}", path.display());
            continue;
        };
        if let Some(first) = seen.get(testcase.name()) {
            return Err(HarnessError::DuplicateTestcase {
                name: testcase.name().to_string(),
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(testcase.name().to_string(), path);
        testcases.push(testcase);
    }

    tracing::debug!("discovered {} testcase(s) in {}", testcases.len(), tests_dir.display());
    Ok(testcases)
}

/// Whether `dir` is inside the scratch tree: its first component relative to
/// the test-source root is exactly `scratch_name`.
pub fn is_scratch_path(tests_dir: &Path, dir: &Path, scratch_name: &str) -> bool {
    dir.strip_prefix(tests_dir)
        .ok()
        .and_then(|rel| rel.components().next())
        .is_some_and(|first| matches!(first, Component::Normal(name) if name == scratch_name))
}

fn collect_sources(tests_dir: &Path, dir: &Path, scratch_name: &str, out: &mut Vec<PathBuf>) -> HarnessResult<()> {
    if is_scratch_path(tests_dir, dir, scratch_name) {
        return Ok(());
    }

    let entries = fs::read_dir(dir).map_err(|e| HarnessError::io("cannot read directory", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::io("cannot read directory", dir, e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| HarnessError::io("cannot stat", &path, e))?;

        if file_type.is_dir() {
            collect_sources(tests_dir, &path, scratch_name, out)?;
        } else if path.extension().is_some_and(|ext| ext == TESTCASE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}
