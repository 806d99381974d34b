#![forbid(unsafe_code)]
//! goldtest - golden-output testsuite runner
//!
//! Discovers `*.adb` testcases under `tests/`, generates a GPR project that
//! builds each of them as its own executable, builds it with `gprbuild`, runs
//! every executable (optionally under valgrind) and compares its output with
//! the `<name>.out` golden file next to the source.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod backend;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod layout;
pub mod runner;
pub mod version;

pub use backend::build::Builder;
pub use backend::project::{ProjectBuilder, ProjectDescriptor, ProjectGenerator};
pub use discovery::{TestCase, discover_testcases};
pub use error::{HarnessError, HarnessResult};
pub use layout::Layout;
pub use runner::{Harness, HarnessConfig, SuiteReport};
