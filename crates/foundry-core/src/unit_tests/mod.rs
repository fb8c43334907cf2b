//! Unit test execution collaborators
//!
//! - [`TestReportParser`] turns a test runner's text report into counts
//! - [`LocalTestRunner`] runs a test file outside any sandbox
//! - [`synthesize`] builds the final [`UnitTestResult`] for a sandboxed run
//!
//! [`UnitTestResult`]: crate::types::UnitTestResult

mod local;
mod parser;
mod synthesize;

pub use local::{LocalTestRunner, PytestRunner};
pub use parser::{PytestReportParser, TestCounts, TestReportParser};
pub use synthesize::synthesize;
