//! Property-based tests for goldtest
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use std::collections::BTreeSet;
use std::path::PathBuf;

use goldtest::runner::diff::{compare_outputs, normalize_lines};
use goldtest::{ProjectBuilder, TestCase};
use proptest::prelude::*;

// =============================================================================
// Project Properties
// =============================================================================

/// Up to 12 testcases with distinct names spread over a few directories.
fn testcases() -> impl Strategy<Value = Vec<TestCase>> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,8}", 0usize..4, 0..12).prop_map(|by_name| {
        by_name
            .into_iter()
            .map(|(name, dir)| {
                let path = PathBuf::from(format!("/suite/tests/dir{}/{}.adb", dir, name));
                TestCase::from_source(path).unwrap()
            })
            .collect()
    })
}

proptest! {
    /// Property: every testcase directory is listed exactly once
    #[test]
    fn source_dirs_are_unique_and_complete(testcases in testcases()) {
        let mut builder = ProjectBuilder::new("/suite/lib.gpr");
        for testcase in &testcases {
            builder.testcase(testcase);
        }
        let descriptor = builder.build();

        let expected: BTreeSet<PathBuf> = testcases.iter().map(|t| t.source_dir().to_path_buf()).collect();
        let listed: BTreeSet<PathBuf> = descriptor.source_dirs.iter().cloned().collect();
        prop_assert_eq!(listed.len(), descriptor.source_dirs.len());
        prop_assert_eq!(listed, expected);
    }

    /// Property: one main per testcase, none dropped or duplicated
    #[test]
    fn mains_match_testcases(testcases in testcases()) {
        let mut builder = ProjectBuilder::new("/suite/lib.gpr");
        for testcase in &testcases {
            builder.testcase(testcase);
        }
        let descriptor = builder.build();

        let expected: Vec<String> = testcases.iter().map(TestCase::file_name).collect();
        prop_assert_eq!(descriptor.mains, expected);
    }

    /// Property: rendering is deterministic
    #[test]
    fn render_is_deterministic(testcases in testcases()) {
        let build = || {
            let mut builder = ProjectBuilder::new("/suite/lib.gpr");
            for testcase in &testcases {
                builder.testcase(testcase);
            }
            builder.build().render()
        };
        prop_assert_eq!(build(), build());
    }
}

// =============================================================================
// Diff Properties
// =============================================================================

proptest! {
    /// Property: trailing whitespace never causes a mismatch
    #[test]
    fn trailing_whitespace_is_ignored(
        lines in prop::collection::vec("[a-z][a-z ]{0,9}", 0..8),
        padding in prop::collection::vec("[ \t]{0,4}", 8),
    ) {
        let expected = lines.join("\n");
        let padded: Vec<String> = lines
            .iter()
            .zip(&padding)
            .map(|(line, pad)| format!("{}{}", line, pad))
            .collect();
        prop_assert_eq!(compare_outputs(&expected, &padded.join("\n")), None);
    }

    /// Property: a leading space on a non-blank line is always a mismatch
    #[test]
    fn leading_whitespace_is_significant(line in "[a-z]{1,10}") {
        let indented = format!(" {}", line);
        prop_assert!(compare_outputs(&line, &indented).is_some(), "leading space must mismatch");
    }

    /// Property: normalized lines never end in whitespace
    #[test]
    fn normalized_lines_have_no_trailing_whitespace(text in "[a-z \t\n]{0,40}") {
        for line in normalize_lines(&text) {
            prop_assert_eq!(line, line.trim_end());
        }
    }

    /// Property: a diff has one `+` line per appended line
    #[test]
    fn appended_lines_are_counted(
        base in prop::collection::vec("[a-z]{1,6}", 0..6),
        extra in prop::collection::vec("[a-z]{1,6}", 1..4),
    ) {
        let expected = base.join("\n");
        let actual: Vec<String> = base.iter().chain(&extra).cloned().collect();
        let diff = compare_outputs(&expected, &actual.join("\n")).unwrap();
        prop_assert_eq!(diff.added(), extra.len());
        prop_assert_eq!(diff.removed(), 0);
    }
}
