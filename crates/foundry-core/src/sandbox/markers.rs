//! Marker protocol for the setup phase
//!
//! The sandbox entrypoint prints [`SETUP_START`] before provisioning and
//! `::setup:end:<code>::` after it. Everything after the end marker belongs to
//! the test runner.

use once_cell::sync::Lazy;
use regex::Regex;

pub const SETUP_START: &str = "::setup:start::";

pub static SETUP_END_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::setup:end:(\d+)::").expect("setup end pattern is valid"));

/// Exit status of the setup phase as recorded by the markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupCode {
    /// End marker found with this code
    Exited(i32),
    /// Start marker found but the end marker never appeared
    Incomplete,
}

impl SetupCode {
    /// Conventional integer form; `Incomplete` is -1
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Exited(code) => code,
            Self::Incomplete => -1,
        }
    }
}

/// One stream split into its test and setup regions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSplit {
    pub test: String,
    pub setup: String,
    pub setup_code: Option<SetupCode>,
}

/// Split a raw stream into test content, setup content and setup code.
///
/// Marker tokens never appear in either slice. Only boundary newlines are
/// trimmed; other whitespace is preserved.
pub fn split_stream(output: &str) -> StreamSplit {
    let Some(start_idx) = output.find(SETUP_START) else {
        return StreamSplit {
            test: trim_newlines(output).to_string(),
            setup: String::new(),
            setup_code: None,
        };
    };

    let after_start = &output[start_idx + SETUP_START.len()..];
    let end_marker = SETUP_END_PATTERN.captures(after_start).and_then(|captures| {
        let whole = captures.get(0)?;
        Some((whole.start(), whole.end(), captures.get(1)?.as_str()))
    });
    let Some((marker_start, marker_end, code)) = end_marker else {
        return StreamSplit {
            test: String::new(),
            setup: trim_newlines(after_start).to_string(),
            setup_code: Some(SetupCode::Incomplete),
        };
    };

    let setup_code = match code.parse::<i32>() {
        Ok(code) => SetupCode::Exited(code),
        Err(_) => {
            tracing::warn!(code, "Setup end marker code out of range");
            SetupCode::Incomplete
        }
    };

    StreamSplit {
        test: trim_newlines(&after_start[marker_end..]).to_string(),
        setup: trim_newlines(&after_start[..marker_start]).to_string(),
        setup_code: Some(setup_code),
    }
}

fn trim_newlines(text: &str) -> &str {
    text.trim_matches('\n')
}
