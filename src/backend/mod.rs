//! goldtest backend
//!
//! Turns the discovered testcases into built executables:
//!
//! 1. `project.rs` - describe all testcases as one GPR project and write it to the scratch root
//! 2. `build.rs` - run `gprbuild` on it, once for the whole suite

pub mod build;
pub mod project;

pub use build::Builder;
pub use project::ProjectGenerator;
