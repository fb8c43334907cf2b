use super::parser::TestReportParser;
use crate::types::{CommandResult, UnitTestResult};

/// Build the final test result for a reconciled test phase.
///
/// With a return code the report is handed to `parser`; without one the
/// tests never ran and the result carries zero counts plus whatever
/// diagnostic text was captured. `command` replaces the (empty) command of
/// the reconciled phase.
pub fn synthesize(
    test: CommandResult,
    command: Vec<String>,
    parser: &dyn TestReportParser,
) -> UnitTestResult {
    if test.returncode.is_none() {
        return UnitTestResult::not_run(command, test.stdout, test.stderr);
    }

    let mut result = parser.parse(test);
    result.command = command;
    result
}
