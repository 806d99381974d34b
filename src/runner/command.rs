//! Command construction for testcase executables
//!
//! A testcase runs as `[wrapper...] <executable>`. Wrappers (such as the
//! memory checker) are prepended in order, so the policy of what to wrap with
//! stays out of the executor.

use std::ffi::OsString;
use std::path::Path;

/// A program prepended to another command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub program: String,
    pub args: Vec<String>,
}

impl Wrapper {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A wrapper without arguments.
    pub fn program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Valgrind's memcheck with full leak checking, reporting errors only.
    pub fn memcheck() -> Self {
        Self::new("valgrind", ["--leak-check=full", "-q"])
    }
}

/// Compose the final argv: each wrapper's program and args, then the base command.
pub fn compose_argv(executable: &Path, args: &[OsString], wrappers: &[Wrapper]) -> Vec<OsString> {
    let mut argv = Vec::new();
    for wrapper in wrappers {
        argv.push(OsString::from(&wrapper.program));
        argv.extend(wrapper.args.iter().map(OsString::from));
    }
    argv.push(executable.as_os_str().to_os_string());
    argv.extend(args.iter().cloned());
    argv
}

/// Render an argv for messages and logs.
pub fn display_argv(argv: &[OsString]) -> String {
    argv.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
