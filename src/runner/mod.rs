//! Testsuite orchestration
//!
//! `Idle → Discovering → Building → Executing(0..n) → Done`
//!
//! Discovery, project generation and the build are fatal on error: they
//! return a `HarnessError` and no testcase is reported. Each `Executing(i)`
//! step is independent; a failing testcase is reported and the run goes on.
//!
//! ## Modules
//!
//! - `command` - argv composition (memory-checker wrapping)
//! - `executor` - running one testcase and classifying failures
//! - `diff` - golden-output normalization and unified diffs
//! - `reporter` - console and JSON result output

pub mod command;
pub mod diff;
pub mod executor;
pub mod reporter;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::build::{Builder, DEFAULT_BUILD_MODE, DEFAULT_BUILD_TOOL};
use crate::backend::project::ProjectGenerator;
use crate::discovery::{TestCase, discover_testcases};
use crate::error::HarnessResult;
use crate::layout::{Layout, SCRATCH_DIR_NAME};

use command::Wrapper;
use executor::{ExecOptions, ProcessExecutor, RunResult, TestExecutor};
use reporter::{RunSummary, TestReporter};

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Repository root; `<root>/tests` holds the testcases
    pub root: PathBuf,
    /// Library project; looked up in `root` when `None`
    pub library_project: Option<PathBuf>,
    /// Build tool program
    pub build_tool: String,
    /// Build mode, forwarded as `-XBUILD_MODE` and selecting `obj-<mode>`
    pub build_mode: String,
    /// Run testcases under valgrind's memcheck
    pub valgrind: bool,
    /// Extra programs to run testcases under, outermost first
    pub launchers: Vec<Wrapper>,
    /// Per-testcase time limit
    pub timeout: Option<Duration>,
    /// Include captured output in process-failure details
    pub show_output: bool,
}

impl HarnessConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            library_project: None,
            build_tool: DEFAULT_BUILD_TOOL.to_string(),
            build_mode: DEFAULT_BUILD_MODE.to_string(),
            valgrind: false,
            launchers: Vec::new(),
            timeout: None,
            show_output: false,
        }
    }

    /// Wrappers to prepend to each testcase command line.
    pub fn wrappers(&self) -> Vec<Wrapper> {
        let mut wrappers = self.launchers.clone();
        if self.valgrind {
            wrappers.push(Wrapper::memcheck());
        }
        wrappers
    }

    fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            build_mode: self.build_mode.clone(),
            wrappers: self.wrappers(),
            timeout: self.timeout,
            show_output: self.show_output,
        }
    }
}

/// Orchestrator state, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Discovering,
    Building,
    Executing(usize),
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Discovering => write!(f, "discovering"),
            Phase::Building => write!(f, "building"),
            Phase::Executing(i) => write!(f, "executing #{}", i),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Result of a completed (non-aborted) run.
#[derive(Debug)]
pub struct SuiteReport {
    pub results: Vec<(TestCase, RunResult)>,
    pub summary: RunSummary,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }
}

/// Runs a whole testsuite.
pub struct Harness {
    config: HarnessConfig,
    layout: Layout,
    phase: Phase,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        let layout = Layout::new(&config.root, config.library_project.as_deref())?;
        Ok(Self {
            config,
            layout,
            phase: Phase::Idle,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!("{} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Discover testcases in their deterministic run order.
    pub fn discover(&mut self) -> HarnessResult<Vec<TestCase>> {
        self.enter(Phase::Discovering);
        discover_testcases(self.layout.tests_dir(), SCRATCH_DIR_NAME)
    }

    /// Generate the project file and build every testcase.
    pub fn build(&mut self, testcases: &[TestCase]) -> HarnessResult<()> {
        self.enter(Phase::Building);
        let project_file = ProjectGenerator::new(&self.layout).generate(testcases)?;
        Builder::new(&self.config.build_tool, &self.config.build_mode, project_file).build()
    }

    /// Run every testcase with `executor`, reporting each result as it completes.
    pub fn execute(
        &mut self,
        testcases: Vec<TestCase>,
        executor: &dyn TestExecutor,
        reporter: &mut dyn TestReporter,
    ) -> SuiteReport {
        let mut summary = RunSummary::default();
        let mut results = Vec::with_capacity(testcases.len());

        for (i, testcase) in testcases.into_iter().enumerate() {
            self.enter(Phase::Executing(i));
            let result = executor.execute(&testcase);
            summary.record(&result);
            reporter.on_test_complete(&testcase, &result);
            results.push((testcase, result));
        }

        self.enter(Phase::Done);
        reporter.on_run_complete(&summary);
        SuiteReport { results, summary }
    }

    /// Discover, build, then run and report every testcase.
    ///
    /// Returns `Err` only for fatal errors, in which case nothing was reported.
    pub fn run(&mut self, reporter: &mut dyn TestReporter) -> HarnessResult<SuiteReport> {
        let result = self.run_phases(reporter);
        if result.is_err() {
            self.enter(Phase::Done);
        }
        result
    }

    fn run_phases(&mut self, reporter: &mut dyn TestReporter) -> HarnessResult<SuiteReport> {
        let testcases = self.discover()?;
        if testcases.is_empty() {
            tracing::warn!("no testcases found in {}", self.layout.tests_dir().display());
        }
        self.build(&testcases)?;

        let layout = self.layout.clone();
        let executor = ProcessExecutor::new(&layout, self.config.exec_options());
        Ok(self.execute(testcases, &executor, reporter))
    }
}
