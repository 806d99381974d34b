//! Result reporting
//!
//! ## TestReporter Trait
//!
//! The runner reports through a `TestReporter` so that output format is
//! separate from execution. `ConsoleReporter` prints the classic colored
//! `OK`/`FAIL` lines; `JsonReporter` prints one JSON object per line.

use std::io::Write;

use serde_json::json;

use super::diff::DiffLine;
use super::executor::{Failure, RunResult};
use crate::discovery::TestCase;

const RED: &str = "31";
const GREEN: &str = "32";
const CYAN: &str = "36";

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn record(&mut self, result: &RunResult) {
        match result {
            Ok(()) => self.passed += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Trait for reporting testcase results.
pub trait TestReporter {
    /// Called once per testcase, in run order.
    fn on_test_complete(&mut self, testcase: &TestCase, result: &RunResult);

    /// Called once after the last testcase. Not called if the build failed.
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

/// Short machine-readable status of a result.
pub fn status_name(result: &RunResult) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(Failure::MissingExpectedOutput { .. }) => "missing-expected-output",
        Err(Failure::Process { .. }) => "process-failure",
        Err(Failure::TimedOut { .. }) => "timed-out",
        Err(Failure::OutputMismatch(_)) => "output-mismatch",
        Err(Failure::Io { .. }) => "io-error",
    }
}

/// Line-per-testcase console output.
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    summary: bool,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(color: bool, summary: bool) -> Self {
        Self::new(std::io::stdout(), color, summary)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool, summary: bool) -> Self {
        Self { out, color, summary }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    /// Color of a diff line, chosen by its marker.
    fn diff_line(&self, line: &DiffLine) -> String {
        let code = match line.marker() {
            '-' => RED,
            '+' => CYAN,
            '@' => GREEN,
            _ => "0",
        };
        format!("  {}", self.paint(code, &line.text))
    }

    fn detail(&self, failure: &Failure) -> String {
        match failure {
            Failure::OutputMismatch(diff) => {
                let lines: Vec<String> = diff.lines().iter().map(|l| self.diff_line(l)).collect();
                format!("output mismatch:\n{}", lines.join("\n"))
            }
            other => other.to_string(),
        }
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_test_complete(&mut self, testcase: &TestCase, result: &RunResult) {
        let line = match result {
            Ok(()) => format!("{}   {}", self.paint(GREEN, "OK"), testcase.name()),
            Err(failure) => format!(
                "{} {}: {}",
                self.paint(RED, "FAIL"),
                testcase.name(),
                self.detail(failure)
            ),
        };
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::warn!("cannot write result line: {}", e);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if !self.summary {
            return;
        }
        let mut parts = vec![self.paint(GREEN, &format!("{} passed", summary.passed))];
        if summary.failed > 0 {
            parts.push(self.paint(RED, &format!("{} failed", summary.failed)));
        }
        if let Err(e) = writeln!(self.out, "\n{}", parts.join(", ")) {
            tracing::warn!("cannot write summary: {}", e);
        }
    }
}

/// JSON Lines output: one object per testcase, then a summary object.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        if let Err(e) = writeln!(self.out, "{}", value) {
            tracing::warn!("cannot write result line: {}", e);
        }
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_test_complete(&mut self, testcase: &TestCase, result: &RunResult) {
        let detail = match result {
            Ok(()) => serde_json::Value::Null,
            Err(failure) => json!(failure.to_string()),
        };
        self.emit(json!({
            "name": testcase.name(),
            "source": testcase.source_path().to_string_lossy(),
            "status": status_name(result),
            "detail": detail,
        }));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.emit(json!({
            "summary": {
                "total": summary.total(),
                "passed": summary.passed,
                "failed": summary.failed,
            }
        }));
    }
}
