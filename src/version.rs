//! goldtest version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time and is shared by the CLI
//! (`--version`) and the header of the generated project file.

/// The goldtest version string (for example, `0.1.0`).
pub const GOLDTEST_VERSION: &str = env!("CARGO_PKG_VERSION");
