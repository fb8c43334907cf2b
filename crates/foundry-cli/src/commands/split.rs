//! `foundry split`: inspect how captured sandbox output is split

use anyhow::Context as _;
use foundry_core::sandbox::{SandboxResult, SetupCode, StreamSplit, reconcile, split_stream};
use serde_json::{Value, json};
use std::path::Path;

use crate::args::SplitArgs;

pub fn execute(args: SplitArgs) -> anyhow::Result<()> {
    let stdout = read(&args.stdout)?;
    let stderr = match &args.stderr {
        Some(path) => read(path)?,
        None => String::new(),
    };

    let output = match args.exit_code {
        Some(exit_code) => {
            let phases = reconcile(&SandboxResult::new(exit_code, stdout, stderr));
            json!({
                "setup": phases.setup,
                "test": phases.test,
            })
        }
        None => json!({
            "stdout": split_json(&split_stream(&stdout)),
            "stderr": split_json(&split_stream(&stderr)),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn split_json(split: &StreamSplit) -> Value {
    let setup_code = match split.setup_code {
        None => Value::Null,
        Some(SetupCode::Incomplete) => json!("incomplete"),
        Some(SetupCode::Exited(code)) => json!(code),
    };
    json!({
        "test": split.test,
        "setup": split.setup,
        "setup_code": setup_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_json_marks_incomplete_setup() {
        let value = split_json(&split_stream("::setup:start::\ninstalling"));
        assert_eq!(value["setup_code"], json!("incomplete"));
        assert_eq!(value["setup"], json!("installing"));
        assert_eq!(value["test"], json!(""));
    }

    #[test]
    fn test_split_json_without_markers() {
        let value = split_json(&split_stream("1 passed\n"));
        assert_eq!(value["setup_code"], Value::Null);
        assert_eq!(value["test"], json!("1 passed"));
    }
}
