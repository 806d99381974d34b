//! CLI module for goldtest
//!
//! ```text
//! goldtest [--valgrind] [--build-mode MODE] [--root DIR] [--project FILE]
//!          [--gprbuild PROGRAM] [--launcher PROGRAM]... [--timeout SECONDS] [--show-output]
//!          [--format console|json] [--no-color] [--summary]
//! ```
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! `execute` returns `CliResult<ExitCode>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.
//!
//! Exit codes: 0 when the build succeeds and every testcase passes, 1 when a
//! testcase fails, 2 when the run aborts (configuration or build failure).

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::backend::build::{DEFAULT_BUILD_MODE, DEFAULT_BUILD_TOOL};
use crate::error::HarnessError;
use crate::layout::resolve_root;
use crate::runner::command::Wrapper;
use crate::runner::reporter::{ConsoleReporter, JsonReporter, TestReporter};
use crate::runner::{Harness, HarnessConfig};
use crate::version::GOLDTEST_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one testcase failed
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run was aborted before reporting (bad setup or build failure)
    pub const ABORTED: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        Self::new(format!("error: {}", err), ExitCode::ABORTED)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Result line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored `OK`/`FAIL` lines
    #[default]
    Console,
    /// One JSON object per testcase
    Json,
}

/// Build every testcase under tests/, run it and compare its output with the golden file
#[derive(Parser, Debug)]
#[command(name = "goldtest")]
#[command(version = GOLDTEST_VERSION)]
#[command(about = "Run the testsuite", long_about = None)]
pub struct Cli {
    /// Run testcases under Valgrind's memcheck
    #[arg(long)]
    pub valgrind: bool,

    /// Build mode for the library and the test programs
    #[arg(long = "build-mode", value_name = "MODE", default_value = DEFAULT_BUILD_MODE)]
    pub build_mode: String,

    /// Repository root (default: $GOLDTEST_ROOT, the current directory, or above the executable)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Library project file (default: the only *.gpr file in the root)
    #[arg(long, value_name = "FILE")]
    pub project: Option<PathBuf>,

    /// Build tool program
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_BUILD_TOOL)]
    pub gprbuild: String,

    /// Run every testcase under PROGRAM (repeatable; outermost first, valgrind innermost)
    #[arg(long, value_name = "PROGRAM")]
    pub launcher: Vec<String>,

    /// Kill a testcase after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Include captured output when a testcase exits unsuccessfully
    #[arg(long = "show-output")]
    pub show_output: bool,

    /// Result line format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Disable colors
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Print a pass/fail count after the results
    #[arg(long)]
    pub summary: bool,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got '{}'", s));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout '{}': {}", s, e))
}

impl Cli {
    /// Whether console output should be colored.
    pub fn use_color(&self) -> bool {
        !self.no_color && env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    }

    /// Build the harness configuration; resolves the repository root.
    pub fn config(&self) -> CliResult<HarnessConfig> {
        let root = resolve_root(self.root.as_deref())?;
        let mut config = HarnessConfig::new(root);
        config.library_project = self.project.clone();
        config.build_tool = self.gprbuild.clone();
        config.build_mode = self.build_mode.clone();
        config.valgrind = self.valgrind;
        config.launchers = self.launcher.iter().map(Wrapper::program).collect();
        config.timeout = self.timeout;
        config.show_output = self.show_output;
        Ok(config)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the testsuite and return the exit code.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.config()?;

    let mut reporter: Box<dyn TestReporter> = match cli.format {
        OutputFormat::Console => Box::new(ConsoleReporter::stdout(cli.use_color(), cli.summary)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let mut harness = Harness::new(config)?;
    tracing::debug!("root: {}", harness.layout().root().display());
    let report = harness.run(reporter.as_mut())?;

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Failures were already reported line by line
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["goldtest"]).unwrap();
        assert!(!cli.valgrind);
        assert_eq!(cli.build_mode, "debug");
        assert_eq!(cli.gprbuild, "gprbuild");
        assert_eq!(cli.format, OutputFormat::Console);
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_cli_parse_valgrind_and_build_mode() {
        let cli = Cli::try_parse_from(["goldtest", "--valgrind", "--build-mode", "prod"]).unwrap();
        assert!(cli.valgrind);
        assert_eq!(cli.build_mode, "prod");
    }

    #[test]
    fn test_cli_parse_timeout() {
        let cli = Cli::try_parse_from(["goldtest", "--timeout", "2.5"]).unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_millis(2500)));

        assert!(Cli::try_parse_from(["goldtest", "--timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["goldtest", "--timeout", "soon"]).is_err());
        assert!(Cli::try_parse_from(["goldtest", "--timeout", "1e30"]).is_err());
        assert!(Cli::try_parse_from(["goldtest", "--timeout", "inf"]).is_err());
    }

    #[test]
    fn test_cli_parse_json_format() {
        let cli = Cli::try_parse_from(["goldtest", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_config_from_explicit_root() {
        let cli = Cli::try_parse_from(["goldtest", "--root", "/suite", "--valgrind", "--show-output"]).unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.root, PathBuf::from("/suite"));
        assert!(config.valgrind);
        assert!(config.show_output);
        assert_eq!(config.build_mode, "debug");
    }

    #[test]
    fn test_launchers_precede_valgrind() {
        let cli = Cli::try_parse_from([
            "goldtest", "--root", "/suite", "--launcher", "env", "--launcher", "nice", "--valgrind",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(
            config.wrappers(),
            vec![Wrapper::program("env"), Wrapper::program("nice"), Wrapper::memcheck()]
        );
    }

    #[test]
    fn test_no_color_flag() {
        let cli = Cli::try_parse_from(["goldtest", "--no-color"]).unwrap();
        assert!(!cli.use_color());
    }

    #[test]
    fn test_harness_error_aborts() {
        let err: CliError = HarnessError::RootNotFound.into();
        assert_eq!(err.exit_code, ExitCode::ABORTED);
        assert!(err.message.starts_with("error: "));
    }
}
