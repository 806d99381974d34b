//! Testcase execution
//!
//! Runs one compiled testcase with stdout and stderr captured into a single
//! scratch file, then compares the capture with the golden file.
//!
//! The `TestExecutor` trait is the seam between the orchestrator and process
//! execution; `ProcessExecutor` is the real implementation.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::command::{Wrapper, compose_argv, display_argv};
use super::diff::{OutputDiff, compare_outputs};
use crate::backend::project::create_dir;
use crate::discovery::TestCase;
use crate::layout::Layout;

/// How often a running testcase is polled when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Why a testcase failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// `<name>.out` does not exist; the executable was not run.
    MissingExpectedOutput { path: PathBuf },
    /// The executable could not be started or exited unsuccessfully.
    Process {
        detail: String,
        /// Captured output, when the caller asked for it
        output: Option<String>,
    },
    /// The executable ran longer than the configured limit and was killed.
    TimedOut { limit: Duration },
    /// The output differs from the golden file.
    OutputMismatch(OutputDiff),
    /// The scratch area or the golden file could not be accessed.
    Io { detail: String },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::MissingExpectedOutput { path } => {
                let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                write!(f, "{} is missing", file_name)
            }
            Failure::Process { detail, output } => {
                write!(f, "{}", detail)?;
                if let Some(output) = output {
                    write!(f, "\ncaptured output:")?;
                    for line in output.lines() {
                        write!(f, "\n  {}", line)?;
                    }
                }
                Ok(())
            }
            Failure::TimedOut { limit } => write!(f, "timed out after {}s", limit.as_secs_f64()),
            Failure::OutputMismatch(diff) => write!(f, "output mismatch:\n{}", diff),
            Failure::Io { detail } => write!(f, "{}", detail),
        }
    }
}

/// Outcome of one testcase.
pub type RunResult = Result<(), Failure>;

/// Options that apply to every testcase in a run.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub build_mode: String,
    pub wrappers: Vec<Wrapper>,
    pub timeout: Option<Duration>,
    pub show_output: bool,
}

/// Runs compiled testcases.
pub trait TestExecutor {
    fn execute(&self, testcase: &TestCase) -> RunResult;
}

/// Executes testcase binaries as child processes.
pub struct ProcessExecutor<'a> {
    layout: &'a Layout,
    options: ExecOptions,
}

impl<'a> ProcessExecutor<'a> {
    pub fn new(layout: &'a Layout, options: ExecOptions) -> Self {
        Self { layout, options }
    }

    /// Full argv for a testcase, wrappers included.
    pub fn argv(&self, testcase: &TestCase) -> Vec<OsString> {
        let executable = self.layout.executable(&self.options.build_mode, testcase.name());
        compose_argv(&executable, &[], &self.options.wrappers)
    }

    fn spawn(&self, argv: &[OsString], capture: &Path) -> Result<Child, Failure> {
        let (program, args) = argv.split_first().ok_or_else(|| Failure::Process {
            detail: "empty command line".to_string(),
            output: None,
        })?;

        let stdout = File::create(capture).map_err(|e| io_failure("cannot create", capture, e))?;
        let stderr = stdout
            .try_clone()
            .map_err(|e| io_failure("cannot duplicate handle for", capture, e))?;

        Command::new(program)
            .args(args)
            .current_dir(self.layout.tests_dir())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| Failure::Process {
                detail: format!("cannot run '{}': {}", display_argv(argv), e),
                output: None,
            })
    }

    /// Wait for the child, killing it once the timeout (if any) expires.
    fn wait(&self, child: &mut Child, argv: &[OsString]) -> Result<ExitStatus, Failure> {
        let wait_error = |e: std::io::Error| Failure::Process {
            detail: format!("cannot wait for '{}': {}", display_argv(argv), e),
            output: None,
        };

        let Some(limit) = self.options.timeout else {
            return child.wait().map_err(wait_error);
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait().map_err(wait_error)? {
                return Ok(status);
            }
            if start.elapsed() >= limit {
                tracing::warn!("killing '{}' after {:?}", display_argv(argv), limit);
                if let Err(e) = child.kill() {
                    tracing::warn!("failed to kill '{}': {}", display_argv(argv), e);
                }
                let _ = child.wait();
                return Err(Failure::TimedOut { limit });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl TestExecutor for ProcessExecutor<'_> {
    fn execute(&self, testcase: &TestCase) -> RunResult {
        let scratch = self.layout.testcase_scratch_dir(testcase.name());
        create_dir(&scratch).map_err(|e| Failure::Io { detail: e.to_string() })?;

        let expected_path = testcase.expected_output_path();
        if !expected_path.is_file() {
            return Err(Failure::MissingExpectedOutput { path: expected_path });
        }

        let capture = self.layout.actual_output(testcase.name());
        let argv = self.argv(testcase);
        tracing::debug!("running {}", display_argv(&argv));

        let mut child = self.spawn(&argv, &capture)?;
        let status = self.wait(&mut child, &argv)?;

        if !status.success() {
            let output = if self.options.show_output {
                Some(read_lossy(&capture)?)
            } else {
                None
            };
            return Err(Failure::Process {
                detail: format!("command '{}' failed: {}", display_argv(&argv), status),
                output,
            });
        }

        let expected = read_lossy(&expected_path)?;
        let actual = read_lossy(&capture)?;
        match compare_outputs(&expected, &actual) {
            None => Ok(()),
            Some(diff) => Err(Failure::OutputMismatch(diff)),
        }
    }
}

fn io_failure(action: &str, path: &Path, e: std::io::Error) -> Failure {
    Failure::Io {
        detail: format!("{} '{}': {}", action, path.display(), e),
    }
}

/// Read a file as text, replacing invalid UTF-8.
fn read_lossy(path: &Path) -> Result<String, Failure> {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|e| io_failure("cannot read", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_expected_output_message() {
        let failure = Failure::MissingExpectedOutput {
            path: PathBuf::from("/suite/tests/scalar.out"),
        };
        assert_eq!(failure.to_string(), "scalar.out is missing");
    }

    #[test]
    fn test_process_failure_with_output() {
        let failure = Failure::Process {
            detail: "command 'x' failed: exit status: 1".to_string(),
            output: Some("boom\nbang\n".to_string()),
        };
        assert_eq!(
            failure.to_string(),
            "command 'x' failed: exit status: 1\ncaptured output:\n  boom\n  bang"
        );
    }

    #[test]
    fn test_timeout_message() {
        let failure = Failure::TimedOut {
            limit: Duration::from_millis(1500),
        };
        assert_eq!(failure.to_string(), "timed out after 1.5s");
    }

    #[test]
    fn test_mismatch_message_starts_with_summary() {
        let diff = compare_outputs("a\n", "b\n").unwrap();
        let message = Failure::OutputMismatch(diff).to_string();
        assert!(message.starts_with("output mismatch:\n--- expected\n+++ actual\n"));
    }
}
