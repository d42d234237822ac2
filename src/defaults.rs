// `gucdk defaults`: show the memory and timeout a runtime gets when the
// task configuration leaves them unset

use anyhow::{Context, Result};
use gucdk_core::defaults::{default_memory_size, DEFAULT_TIMEOUT};
use gucdk_core::Runtime;
use serde_json::{json, Value};

pub fn run(runtime: &str) -> Result<()> {
    let report = describe(runtime)?;
    let content =
        serde_json::to_string_pretty(&report).context("Failed to serialize runtime defaults")?;
    println!("{}", content);
    Ok(())
}

pub fn describe(runtime: &str) -> Result<Value> {
    let runtime: Runtime = runtime
        .parse()
        .with_context(|| format!("Cannot show defaults for '{}'", runtime))?;

    Ok(json!({
        "runtime": runtime.name(),
        "family": runtime.family(),
        "memory_size": default_memory_size(&runtime, None),
        "timeout_secs": DEFAULT_TIMEOUT.as_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_java() {
        let report = describe("java11").unwrap();
        assert_eq!(report["runtime"], "java11");
        assert_eq!(report["memory_size"], 1024);
        assert_eq!(report["timeout_secs"], 30);
    }

    #[test]
    fn test_describe_unknown() {
        let err = describe("cobol").unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown runtime"));
    }
}
