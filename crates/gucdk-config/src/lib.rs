// gucdk-config - Synthesis configuration
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from GUCDK_CONFIG env var
// 3. Config file contents from GUCDK_CONFIG_CONTENT env var
// 4. Default config file locations (./gucdk.toml, ./.gucdk.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use gucdk_core::{
    AppIdentity, CronOptions, ErrorPercentageMonitoring, MonitoringConfiguration,
    PartialTaskConfig, Runtime, Schedule, ScheduleBinding, ScheduledTaskProps, SharedOverrides,
    Stack, StackProps,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main synthesis configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default)]
    pub stack: StackConfig,

    #[serde(default)]
    pub task: TaskConfig,

    #[serde(default)]
    pub shared: SharedConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Deployment target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudformation_stack_name: Option<String>,
    #[serde(default)]
    pub without_tags: bool,
}

/// Scheduled task description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub handler: String,
    #[serde(default)]
    pub runtime: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

impl TaskConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// One trigger. Exactly one of `schedule`, `rate_minutes` or `cron` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_minutes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<CronOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleConfig {
    pub fn to_binding(&self) -> Result<ScheduleBinding> {
        let schedule = match (&self.schedule, self.rate_minutes, &self.cron) {
            (Some(expression), None, None) => expression.parse::<Schedule>()?,
            (None, Some(minutes), None) => {
                Schedule::rate(Duration::from_secs(minutes.saturating_mul(60)))?
            }
            (None, None, Some(cron)) => Schedule::cron(cron.clone())?,
            _ => anyhow::bail!(
                "each task.rules entry needs exactly one of 'schedule', 'rate_minutes' or 'cron'"
            ),
        };

        Ok(ScheduleBinding {
            schedule,
            description: self.description.clone(),
        })
    }
}

/// Raw monitoring settings as written in a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringSettings {
    #[serde(default)]
    pub no_monitoring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerated_error_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_window_minutes: Option<u32>,
}

impl MonitoringSettings {
    pub fn to_configuration(&self) -> Result<MonitoringConfiguration> {
        if self.tolerated_error_percentage.is_none() && self.evaluation_window_minutes.is_some() {
            anyhow::bail!(
                "task.monitoring.evaluation_window_minutes requires tolerated_error_percentage"
            );
        }

        let error_percentage =
            self.tolerated_error_percentage
                .map(|tolerated_error_percentage| ErrorPercentageMonitoring {
                    tolerated_error_percentage,
                    evaluation_window_minutes: self.evaluation_window_minutes,
                });

        MonitoringConfiguration::from_parts(self.no_monitoring, error_percentage)
            .context("Invalid task.monitoring configuration")
    }
}

/// Pre-resolved shared values, replacing SSM parameter lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_topic_arn: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Core inputs built from a validated configuration
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub stack: Stack,
    pub id: String,
    pub props: ScheduledTaskProps,
    pub overrides: SharedOverrides,
}

impl SynthConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for CLI usage).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Layer all sources like [`SynthConfig::load`] but leave validation to
    /// the caller, e.g. once logging is set up from the resolved settings.
    pub fn resolve() -> Result<Self> {
        sources::resolve_config()
    }

    /// [`SynthConfig::load_from_path`] without the validation step.
    pub fn resolve_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::resolve_from_file_path(path)
    }

    /// Build a configuration from inline content plus overrides supplied by an
    /// `EnvSource`. Never touches the host environment or filesystem.
    pub fn load_with_env<E: EnvSource>(inline_config: Option<&str>, env: &E) -> Result<Self> {
        let mut config = SynthConfig::default();

        if let Some(inline) = inline_config {
            let file_config: SynthConfig =
                toml::from_str(inline).context("Failed to parse inline config content")?;
            config.merge(file_config);
        }

        config.apply_env_overrides_from(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: SynthConfig) {
        self.stack = other.stack;
        self.task = other.task;
        self.shared = other.shared;
        self.log = other.log;
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Convert into the core declaration inputs
    pub fn into_task_input(self) -> Result<TaskInput> {
        let stack = Stack::new(StackProps {
            stack: self.stack.stack,
            stage: self.stack.stage,
            cloudformation_stack_name: self.stack.cloudformation_stack_name,
            without_tags: self.stack.without_tags,
        })?;

        let runtime: Runtime = self
            .task
            .runtime
            .parse()
            .context("Invalid task.runtime value")?;

        let rules = self
            .task
            .rules
            .iter()
            .map(RuleConfig::to_binding)
            .collect::<Result<Vec<_>>>()?;
        let monitoring = self.task.monitoring.to_configuration()?;

        let mut config = PartialTaskConfig::new(
            runtime,
            self.task.handler.clone(),
            self.task.file_name.clone(),
        );
        config.function_name = self.task.function_name.clone();
        config.description = self.task.description.clone();
        config.memory_size = self.task.memory_size;
        config.timeout = self.task.timeout();
        config.environment = self.task.environment.clone();

        Ok(TaskInput {
            stack,
            id: self.task.id,
            props: ScheduledTaskProps {
                app: AppIdentity::new(self.task.app),
                config,
                rules,
                monitoring,
            },
            overrides: SharedOverrides {
                dist_bucket_name: self.shared.dist_bucket_name,
                alarm_topic_arn: self.shared.alarm_topic_arn,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[stack]
stack = "media-service"
stage = "PROD"

[task]
id = "image-resizer"
app = "image-resizer"
file_name = "lambda.zip"
handler = "index.handler"
runtime = "nodejs14.x"
timeout_secs = 120

[task.environment]
BUCKET = "images"

[[task.rules]]
schedule = "rate(5 minutes)"
description = "poll for new images"

[[task.rules]]
rate_minutes = 60

[[task.rules]]
cron = { minute = "0", hour = "3" }

[task.monitoring]
tolerated_error_percentage = 5.0
"#;

    #[test]
    fn test_parse_sample_config() {
        let config: SynthConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.stack.stack, "media-service");
        assert_eq!(config.task.rules.len(), 3);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_into_task_input() {
        let config: SynthConfig = toml::from_str(SAMPLE).unwrap();
        let input = config.into_task_input().unwrap();

        assert_eq!(input.stack.stack(), "media-service");
        assert_eq!(input.id, "image-resizer");
        assert_eq!(input.props.config.runtime, Runtime::NODEJS_14_X);
        assert_eq!(input.props.config.timeout, Some(Duration::from_secs(120)));

        let expressions: Vec<&str> = input
            .props
            .rules
            .iter()
            .map(|r| r.schedule.expression_string())
            .collect();
        assert_eq!(
            expressions,
            vec!["rate(5 minutes)", "rate(1 hour)", "cron(0 3 * * ? *)"]
        );
        assert!(input.props.monitoring.is_enabled());
    }

    #[test]
    fn test_rule_needs_exactly_one_form() {
        let rule = RuleConfig {
            schedule: Some("rate(1 minute)".to_string()),
            rate_minutes: Some(1),
            ..Default::default()
        };
        assert!(rule.to_binding().is_err());
        assert!(RuleConfig::default().to_binding().is_err());
    }

    #[test]
    fn test_monitoring_settings_conflict() {
        let settings = MonitoringSettings {
            no_monitoring: true,
            tolerated_error_percentage: Some(1.0),
            evaluation_window_minutes: None,
        };
        let err = settings.to_configuration().unwrap_err();
        assert!(format!("{:#}", err).contains("both disabled and error-percentage"));
    }

    #[test]
    fn test_window_without_percentage() {
        let settings = MonitoringSettings {
            no_monitoring: true,
            tolerated_error_percentage: None,
            evaluation_window_minutes: Some(5),
        };
        assert!(settings.to_configuration().is_err());
    }
}
