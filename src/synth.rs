// `gucdk synth`: compose a scheduled task from configuration and render it
// as a JSON declaration

use anyhow::{Context, Result};
use dialoguer::Confirm;
use gucdk_config::SynthConfig;
use gucdk_core::{TaskComposer, TaskDeclaration};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::init::init_tracing;

#[derive(Debug, Clone, Default)]
pub struct SynthArgs {
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub force: bool,
    pub log_level: Option<String>,
}

pub fn run(args: SynthArgs) -> Result<()> {
    let config = load(&args)?;
    let declaration = declare(config)?;
    let content = render(&declaration)?;

    match &args.output {
        Some(path) => {
            if !write_output(path, &content, args.force)? {
                println!("Aborted.");
            }
        }
        None => println!("{}", content),
    }

    Ok(())
}

/// Resolve configuration, start logging from it, then validate
pub fn load(args: &SynthArgs) -> Result<SynthConfig> {
    let mut config = match &args.config {
        Some(path) => SynthConfig::resolve_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SynthConfig::resolve().context("Failed to load configuration")?,
    };

    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }
    // Validation warnings need a subscriber
    init_tracing(&config.log);
    config.validate()?;
    Ok(config)
}

/// Compose the declaration described by a validated configuration
pub fn declare(config: SynthConfig) -> Result<TaskDeclaration> {
    let input = config.into_task_input()?;
    let composer = TaskComposer::new().with_overrides(input.overrides);
    let declaration = composer
        .declare(&input.stack, &input.id, input.props)
        .with_context(|| format!("Failed to declare scheduled task '{}'", input.id))?;
    Ok(declaration)
}

pub fn render(declaration: &TaskDeclaration) -> Result<String> {
    serde_json::to_string_pretty(declaration).context("Failed to serialize declaration")
}

/// Write `content` to `path`. An existing file is only replaced with `force`
/// or after confirmation; returns false when the user declines.
pub fn write_output(path: &Path, content: &str, force: bool) -> Result<bool> {
    if path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            return Ok(false);
        }
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "Wrote declaration");
    Ok(true)
}
