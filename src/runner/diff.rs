//! Golden-output comparison
//!
//! Lines are compared after stripping trailing whitespace only; leading
//! whitespace and everything else is significant. Mismatches are reported as
//! a unified diff between the normalized `expected` and `actual` lines.

use std::fmt;

use similar::{ChangeTag, DiffOp, TextDiff};

/// Context lines around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// Split text into lines with trailing whitespace removed.
///
/// `\n`, `\r\n` and a lone `\r` all end a line; a final terminator does not
/// start an extra empty line.
pub fn normalize_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(end) => {
                lines.push(rest[..end].trim_end());
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest.trim_end());
                break;
            }
        }
    }
    lines
}

/// What a diff line is, judged by its leading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    /// `--- expected` / `+++ actual`
    FileHeader,
    /// `@@ -a,b +c,d @@`
    HunkHeader,
    /// `-line`
    Removed,
    /// `+line`
    Added,
    /// ` line`
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Full line including its marker
    pub text: String,
}

impl DiffLine {
    fn new(kind: DiffLineKind, text: String) -> Self {
        Self { kind, text }
    }

    /// Leading marker character (`-`, `+`, `@` or ` `).
    pub fn marker(&self) -> char {
        self.text.chars().next().unwrap_or(' ')
    }
}

/// A unified diff of expected vs. actual output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDiff {
    lines: Vec<DiffLine>,
}

impl OutputDiff {
    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    pub fn added(&self) -> usize {
        self.count(DiffLineKind::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(DiffLineKind::Removed)
    }

    fn count(&self, kind: DiffLineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

impl fmt::Display for OutputDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line.text)?;
        }
        Ok(())
    }
}

/// Compare expected and actual output. Returns `None` when they match.
pub fn compare_outputs(expected: &str, actual: &str) -> Option<OutputDiff> {
    let expected = normalize_lines(expected);
    let actual = normalize_lines(actual);
    if expected == actual {
        return None;
    }
    Some(unified_diff(&expected, &actual))
}

/// Unified diff between two line sequences, labelled `expected` and `actual`.
pub fn unified_diff(expected: &[&str], actual: &[&str]) -> OutputDiff {
    let diff = TextDiff::from_slices(expected, actual);
    let mut lines = vec![
        DiffLine::new(DiffLineKind::FileHeader, "--- expected".to_string()),
        DiffLine::new(DiffLineKind::FileHeader, "+++ actual".to_string()),
    ];

    for group in diff.grouped_ops(CONTEXT_LINES) {
        lines.push(DiffLine::new(DiffLineKind::HunkHeader, hunk_header(&group)));
        for op in &group {
            for change in diff.iter_changes(op) {
                let (kind, marker) = match change.tag() {
                    ChangeTag::Delete => (DiffLineKind::Removed, '-'),
                    ChangeTag::Insert => (DiffLineKind::Added, '+'),
                    ChangeTag::Equal => (DiffLineKind::Context, ' '),
                };
                lines.push(DiffLine::new(kind, format!("{}{}", marker, change.value())));
            }
        }
    }

    OutputDiff { lines }
}

fn hunk_header(group: &[DiffOp]) -> String {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return "@@ -0,0 +0,0 @@".to_string();
    };
    format!(
        "@@ -{} +{} @@",
        format_range(first.old_range().start, last.old_range().end),
        format_range(first.new_range().start, last.new_range().end)
    )
}

/// `start,len` with 1-based start; a single line omits the length and an
/// empty range points at the line before it.
fn format_range(start: usize, end: usize) -> String {
    let len = end - start;
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}
