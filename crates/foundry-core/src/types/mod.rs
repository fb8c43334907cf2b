//! Result value records produced by test execution

mod command_result;
mod unit_test_result;

pub use command_result::CommandResult;
pub use unit_test_result::UnitTestResult;
