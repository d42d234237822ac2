use super::{LogFormat, SynthConfig};
use anyhow::{anyhow, bail, Result};
use gucdk_core::identity::CFN_STACK_NAME_ENV;

pub const ENV_PREFIX: &str = "GUCDK_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the GUCDK_ prefix
    /// Used for deployment-pipeline variables (GU_CFN_STACK_NAME)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut SynthConfig, env: &E) -> Result<()> {
    // Identity
    if let Some(stack) = get_env_string(env, "STACK")? {
        config.stack.stack = stack;
    }
    if let Some(stage) = get_env_string(env, "STAGE")? {
        config.stack.stage = stage;
    }
    if let Some(app) = get_env_string(env, "APP")? {
        config.task.app = app;
    }
    if let Some(val) = get_env_bool(env, "WITHOUT_TAGS")? {
        config.stack.without_tags = val;
    }

    // The pipeline-provided stack name only fills a gap; it never replaces
    // an explicitly configured name
    if config.stack.cloudformation_stack_name.is_none() {
        if let Some(name) = get_raw_env_string(env, CFN_STACK_NAME_ENV)? {
            config.stack.cloudformation_stack_name = Some(name);
        }
    }

    // Task
    if let Some(runtime) = get_env_string(env, "RUNTIME")? {
        config.task.runtime = runtime;
    }
    if let Some(val) = get_env_u32(env, "MEMORY_SIZE")? {
        config.task.memory_size = Some(val);
    }
    if let Some(val) = get_env_u64(env, "TIMEOUT_SECS")? {
        config.task.timeout_secs = Some(val);
    }

    // Shared values
    if let Some(bucket) = get_env_string(env, "DIST_BUCKET_NAME")? {
        config.shared.dist_bucket_name = Some(bucket);
    }
    if let Some(arn) = get_env_string(env, "ALARM_TOPIC_ARN")? {
        config.shared.alarm_topic_arn = Some(arn);
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.log.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => bail!(
                "Failed to parse {}LOG_FORMAT (expected 'text' or 'json'): {}",
                ENV_PREFIX,
                other
            ),
        };
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key).filter(|val| !val.is_empty()))
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key).filter(|val| !val.is_empty()))
}

fn get_env_u32<E: EnvSource>(env: &E, key: &str) -> Result<Option<u32>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u32>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val.parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapEnv(HashMap<String, String>);

    impl MapEnv {
        fn with(mut self, key: &str, value: &str) -> Self {
            self.0.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_identity_overrides() {
        let env = MapEnv::default()
            .with("GUCDK_STACK", "media-service")
            .with("GUCDK_STAGE", "CODE")
            .with("GUCDK_APP", "image-resizer")
            .with("GUCDK_RUNTIME", "java11")
            .with("GUCDK_WITHOUT_TAGS", "true");

        let mut config = SynthConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.stack.stack, "media-service");
        assert_eq!(config.stack.stage, "CODE");
        assert_eq!(config.task.app, "image-resizer");
        assert_eq!(config.task.runtime, "java11");
        assert!(config.stack.without_tags);
    }

    #[test]
    fn test_cfn_stack_name_only_fills_gap() {
        let env = MapEnv::default().with("GU_CFN_STACK_NAME", "from-pipeline");

        let mut config = SynthConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(
            config.stack.cloudformation_stack_name.as_deref(),
            Some("from-pipeline")
        );

        let mut config = SynthConfig::default();
        config.stack.cloudformation_stack_name = Some("explicit".to_string());
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(
            config.stack.cloudformation_stack_name.as_deref(),
            Some("explicit")
        );
    }

    #[test]
    fn test_shared_and_log_overrides() {
        let env = MapEnv::default()
            .with("GUCDK_DIST_BUCKET_NAME", "dist-bucket")
            .with("GUCDK_ALARM_TOPIC_ARN", "arn:aws:sns:eu-west-1:000000000000:alarms")
            .with("GUCDK_LOG_LEVEL", "debug")
            .with("GUCDK_LOG_FORMAT", "JSON");

        let mut config = SynthConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.shared.dist_bucket_name.as_deref(), Some("dist-bucket"));
        assert!(config.shared.alarm_topic_arn.is_some());
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let env = MapEnv::default().with("GUCDK_MEMORY_SIZE", "lots");
        let mut config = SynthConfig::default();
        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("GUCDK_MEMORY_SIZE"));

        let env = MapEnv::default().with("GUCDK_WITHOUT_TAGS", "yes");
        assert!(apply_env_overrides(&mut SynthConfig::default(), &env).is_err());
    }

    #[test]
    fn test_unknown_log_format_is_rejected() {
        let env = MapEnv::default().with("GUCDK_LOG_FORMAT", "xml");
        let err = apply_env_overrides(&mut SynthConfig::default(), &env).unwrap_err();
        assert!(err.to_string().contains("GUCDK_LOG_FORMAT"));

        let env = MapEnv::default().with("GUCDK_LOG_FORMAT", "Text");
        let mut config = SynthConfig::default();
        config.log.format = LogFormat::Json;
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.log.format, LogFormat::Text);
    }
}
