//! Pytest report parsing

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{CommandResult, UnitTestResult};

/// Pass/fail counts extracted from a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: u32,
    pub failed: u32,
}

/// Converts a test runner's textual report into pass/fail counts
pub trait TestReportParser: Send + Sync {
    fn parse_counts(&self, report: &str) -> TestCounts;

    /// Attach counts parsed from `result.stdout` to the result
    fn parse(&self, result: CommandResult) -> UnitTestResult {
        let counts = self.parse_counts(&result.stdout);
        UnitTestResult::from_command(result, counts.passed, counts.failed)
    }
}

static SUMMARY_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+) (passed|failed|errors?)\b").expect("summary count pattern is valid")
});

static VERBOSE_OUTCOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)::\S+\s+(PASSED|FAILED|ERROR)\b").expect("verbose outcome pattern is valid")
});

/// Parses pytest output.
///
/// Reads the `N passed, M failed, K errors` summary; errors count as failures.
/// Without a summary (e.g. a killed run) it counts verbose `PASSED` / `FAILED`
/// / `ERROR` lines instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct PytestReportParser;

impl TestReportParser for PytestReportParser {
    fn parse_counts(&self, report: &str) -> TestCounts {
        let summary = report
            .lines()
            .rev()
            .find(|line| SUMMARY_COUNT.is_match(line));

        if let Some(line) = summary {
            let mut counts = TestCounts::default();
            for captures in SUMMARY_COUNT.captures_iter(line) {
                let count: u32 = captures[1].parse().unwrap_or(0);
                match &captures[2] {
                    "passed" => counts.passed += count,
                    _ => counts.failed += count,
                }
            }
            return counts;
        }

        let mut counts = TestCounts::default();
        for captures in VERBOSE_OUTCOME.captures_iter(report) {
            match &captures[1] {
                "PASSED" => counts.passed += 1,
                _ => counts.failed += 1,
            }
        }
        counts
    }
}
