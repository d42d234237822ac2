// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Context, Result};
use gucdk_core::Runtime;
use tracing::warn;

/// Largest memory size a function can be given, in MB
const MAX_MEMORY_SIZE_MB: u32 = 10_240;

/// Longest timeout a function can be given, in seconds
const MAX_TIMEOUT_SECS: u64 = 900;

pub fn validate_config(config: &SynthConfig) -> Result<()> {
    validate_stack_config(&config.stack)?;
    validate_task_config(&config.task)?;
    Ok(())
}

fn validate_stack_config(config: &StackConfig) -> Result<()> {
    if config.stack.is_empty() {
        bail!("stack.stack is required");
    }

    if config.stage.is_empty() {
        bail!("stack.stage is required");
    }

    if config.without_tags {
        warn!("stack.without_tags is set; standard tags will not be applied");
    }

    Ok(())
}

fn validate_task_config(config: &TaskConfig) -> Result<()> {
    for (name, value) in [
        ("task.id", &config.id),
        ("task.app", &config.app),
        ("task.file_name", &config.file_name),
        ("task.handler", &config.handler),
        ("task.runtime", &config.runtime),
    ] {
        if value.is_empty() {
            bail!("{} is required", name);
        }
    }

    config
        .runtime
        .parse::<Runtime>()
        .context("Invalid task.runtime value")?;

    if let Some(memory_size) = config.memory_size {
        if memory_size == 0 {
            bail!("task.memory_size must be greater than 0");
        }
        if memory_size > MAX_MEMORY_SIZE_MB {
            warn!(
                memory_size,
                "task.memory_size exceeds {} MB; deployment will likely fail", MAX_MEMORY_SIZE_MB
            );
        }
    }

    if let Some(timeout_secs) = config.timeout_secs {
        if timeout_secs == 0 {
            bail!("task.timeout_secs must be greater than 0");
        }
        if timeout_secs > MAX_TIMEOUT_SECS {
            warn!(
                timeout_secs,
                "task.timeout_secs exceeds {} seconds; deployment will likely fail",
                MAX_TIMEOUT_SECS
            );
        }
    }

    for (index, rule) in config.rules.iter().enumerate() {
        rule.to_binding()
            .with_context(|| format!("Invalid task.rules[{}]", index))?;
    }

    config.monitoring.to_configuration()?;

    Ok(())
}
