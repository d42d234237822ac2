// Configuration source loading.
//
// Priority order:
// 1. Environment variables (GUCDK_* prefix, plus GU_CFN_STACK_NAME)
// 2. Config file path from GUCDK_CONFIG
// 3. Inline config content from GUCDK_CONFIG_CONTENT
// 4. Default config files (./gucdk.toml, ./.gucdk.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_FILES: [&str; 2] = ["./gucdk.toml", "./.gucdk.toml"];

/// Load configuration using native environment/file access.
pub fn load_config() -> Result<SynthConfig> {
    let config = resolve_config()?;
    config.validate()?;
    Ok(config)
}

/// Layer file and environment sources without validating the result.
pub fn resolve_config() -> Result<SynthConfig> {
    let mut config = SynthConfig::default();

    if let Some(file_config) = load_from_file()? {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

fn load_from_file() -> Result<Option<SynthConfig>> {
    if let Ok(path) = env::var("GUCDK_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("GUCDK_CONFIG_CONTENT") {
        let config: SynthConfig = toml::from_str(&content)
            .context("Failed to parse inline config from GUCDK_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<SynthConfig> {
    debug!(path = %path.display(), "Reading config file");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<SynthConfig> {
    let config = resolve_from_file_path(path)?;
    config.validate()?;
    Ok(config)
}

/// Read a specific file and apply environment overrides, without validating.
pub fn resolve_from_file_path(path: impl AsRef<Path>) -> Result<SynthConfig> {
    let file_config = read_config_file(path.as_ref())?;

    let mut config = SynthConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[stack]
stack = "media-service"
stage = "PROD"
cloudformation_stack_name = "media-service-PROD"

[task]
id = "nightly"
app = "reporter"
file_name = "reporter.jar"
handler = "com.example.Report::handle"
runtime = "java11"

[[task.rules]]
rate_minutes = 1440

[task.monitoring]
no_monitoring = true
"#
        )
        .unwrap();

        let config = load_from_file_path(file.path()).unwrap();
        assert_eq!(config.task.id, "nightly");
        assert_eq!(config.task.runtime, "java11");
        assert!(config.task.monitoring.no_monitoring);
    }

    #[test]
    fn test_resolve_skips_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stack]\nstack = \"media-service\"").unwrap();

        let config = resolve_from_file_path(file.path()).unwrap();
        assert_eq!(config.stack.stack, "media-service");
        assert!(config.validate().is_err());
        assert!(load_from_file_path(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_from_file_path("/nonexistent/gucdk.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stack").unwrap();
        let err = load_from_file_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
