//! Scheduled task composition
//!
//! Combines a resolved identity, a defaulted task configuration, schedule
//! bindings and a monitoring choice into one [`TaskDeclaration`]. The
//! declaration is plain data; materialising it is left to the caller.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::alarm::{error_percentage_alarm, AlarmDeclaration};
use crate::defaults::{apply_defaults, PartialTaskConfig, ResolvedTaskConfig};
use crate::error::{DeclarationError, Result};
use crate::identity::{AppIdentity, ResolvedIdentity, Stack};
use crate::monitoring::MonitoringConfiguration;
use crate::schedule::ScheduleBinding;
use crate::shared::{
    alarm_topic_parameter, dist_bucket_parameter, ParameterDeclaration, ParameterValue,
    SharedValue, ALARM_TOPIC_ARN, DIST_BUCKET_NAME,
};

/// Where the function code is fetched from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeLocation {
    pub bucket: Value,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub id: String,
    #[serde(flatten)]
    pub config: ResolvedTaskConfig,
    pub code: CodeLocation,
}

/// A trigger rule invoking the task's function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDeclaration {
    pub id: String,
    pub schedule_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// An IAM statement added to the function's execution role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

impl PolicyStatement {
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Allow, actions, resources)
    }

    pub fn deny<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Deny, actions, resources)
    }

    fn new<A, R>(effect: Effect, actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

/// A queue or stream whose records invoke the task's function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    pub event_source_arn: String,
    pub batch_size: Option<u32>,
    pub enabled: bool,
}

impl EventSource {
    pub fn new(event_source_arn: impl Into<String>) -> Self {
        Self {
            event_source_arn: event_source_arn.into(),
            batch_size: None,
            enabled: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// An event source mapping bound to the task's function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSourceDeclaration {
    pub id: String,
    pub event_source_arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    pub enabled: bool,
    pub target: String,
}

/// Everything the framework needs to materialise a scheduled task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDeclaration {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudformation_stack_name: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub function: FunctionDeclaration,
    pub rules: Vec<RuleDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<AlarmDeclaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterDeclaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_statements: Vec<PolicyStatement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_sources: Vec<EventSourceDeclaration>,
}

impl TaskDeclaration {
    /// Artifact storage key of the function code
    pub fn artifact_key(&self) -> &str {
        &self.function.config.artifact_key
    }

    /// Append a trigger, named after its position among the task's rules
    pub fn add_schedule(&mut self, binding: &ScheduleBinding) -> &RuleDeclaration {
        let index = self.rules.len();
        let rule = rule_declaration(&self.id, &self.function.id, binding, index);
        self.rules.push(rule);
        &self.rules[index]
    }

    pub fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        self.policy_statements.push(statement);
    }

    /// Append an event source mapping, named after its position
    pub fn add_event_source(&mut self, source: EventSource) -> &EventSourceDeclaration {
        let index = self.event_sources.len();
        self.event_sources.push(EventSourceDeclaration {
            id: format!("{}-event-source-{}", self.id, index),
            event_source_arn: source.event_source_arn,
            batch_size: source.batch_size,
            enabled: source.enabled,
            target: self.function.id.clone(),
        });
        &self.event_sources[index]
    }
}

fn rule_declaration(
    task_id: &str,
    function_id: &str,
    binding: &ScheduleBinding,
    index: usize,
) -> RuleDeclaration {
    let expression = binding.schedule.expression_string();
    RuleDeclaration {
        id: format!("{}-{}-{}", task_id, expression, index),
        schedule_expression: expression.to_string(),
        description: binding.description.clone(),
        enabled: true,
        target: function_id.to_string(),
    }
}

/// Input for [`TaskComposer::declare`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTaskProps {
    pub app: AppIdentity,
    pub config: PartialTaskConfig,
    pub rules: Vec<ScheduleBinding>,
    pub monitoring: MonitoringConfiguration,
}

/// Pre-resolved shared values. When set, they replace the SSM parameter
/// lookups the first time the shared value is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedOverrides {
    pub dist_bucket_name: Option<String>,
    pub alarm_topic_arn: Option<String>,
}

/// Composes task declarations against a pair of shared values
#[derive(Debug)]
pub struct TaskComposer<'a> {
    dist_bucket: &'a SharedValue<ParameterValue>,
    alarm_topic: &'a SharedValue<ParameterValue>,
    overrides: SharedOverrides,
}

impl Default for TaskComposer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskComposer<'static> {
    /// Composer backed by the process-wide shared values
    pub fn new() -> Self {
        Self {
            dist_bucket: &DIST_BUCKET_NAME,
            alarm_topic: &ALARM_TOPIC_ARN,
            overrides: SharedOverrides::default(),
        }
    }
}

impl<'a> TaskComposer<'a> {
    pub fn with_shared_values(
        dist_bucket: &'a SharedValue<ParameterValue>,
        alarm_topic: &'a SharedValue<ParameterValue>,
    ) -> Self {
        Self {
            dist_bucket,
            alarm_topic,
            overrides: SharedOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: SharedOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    fn dist_bucket(&self, stack: &Stack) -> ParameterValue {
        self.dist_bucket.get(stack, |stack| {
            self.overrides
                .dist_bucket_name
                .clone()
                .map(ParameterValue::literal)
                .unwrap_or_else(|| dist_bucket_parameter(stack))
        })
    }

    fn alarm_topic(&self, stack: &Stack) -> ParameterValue {
        self.alarm_topic.get(stack, |stack| {
            self.overrides
                .alarm_topic_arn
                .clone()
                .map(ParameterValue::literal)
                .unwrap_or_else(|| alarm_topic_parameter(stack))
        })
    }

    /// Resolve identity, apply defaults and compose in one pass.
    ///
    /// # Errors
    ///
    /// Fails when the app or artifact file name is empty, or when the
    /// monitoring configuration is invalid.
    pub fn declare(
        &self,
        stack: &Stack,
        id: &str,
        props: ScheduledTaskProps,
    ) -> Result<TaskDeclaration> {
        if id.is_empty() {
            return Err(DeclarationError::missing_field("id"));
        }
        if props.app.app.is_empty() {
            return Err(DeclarationError::missing_field("app"));
        }
        if props.config.artifact.file_name.is_empty() {
            return Err(DeclarationError::missing_field("file_name"));
        }

        let identity = stack.resolve(&props.app);
        let resolved = apply_defaults(props.config, &identity);
        self.compose_scheduled_task(stack, &identity, id, resolved, &props.rules, &props.monitoring)
    }

    /// Compose an already-defaulted configuration into a declaration
    pub fn compose_scheduled_task(
        &self,
        stack: &Stack,
        identity: &ResolvedIdentity,
        id: &str,
        resolved: ResolvedTaskConfig,
        rules: &[ScheduleBinding],
        monitoring: &MonitoringConfiguration,
    ) -> Result<TaskDeclaration> {
        monitoring.validate()?;

        let mut parameters = Vec::new();
        let bucket = self.dist_bucket(stack);
        push_parameter(&mut parameters, &bucket);

        let function = FunctionDeclaration {
            id: id.to_string(),
            code: CodeLocation {
                bucket: bucket.template_value(),
                key: resolved.artifact_key.clone(),
            },
            config: resolved,
        };

        let alarm = match monitoring {
            MonitoringConfiguration::NoMonitoring => None,
            MonitoringConfiguration::ErrorPercentage(error_percentage) => {
                let topic = self.alarm_topic(stack);
                push_parameter(&mut parameters, &topic);
                let alarm = error_percentage_alarm(
                    id,
                    &function.id,
                    &identity.stage,
                    error_percentage,
                    &topic,
                );
                debug!(
                    task = id,
                    threshold = alarm.threshold,
                    "Declared error percentage alarm"
                );
                Some(alarm)
            }
        };

        let mut declaration = TaskDeclaration {
            id: id.to_string(),
            cloudformation_stack_name: stack.cloudformation_stack_name().map(str::to_string),
            tags: identity.tags.clone(),
            function,
            rules: Vec::with_capacity(rules.len()),
            alarm,
            parameters,
            policy_statements: Vec::new(),
            event_sources: Vec::new(),
        };
        for binding in rules {
            declaration.add_schedule(binding);
        }

        info!(
            task = id,
            artifact_key = declaration.artifact_key(),
            rules = declaration.rules.len(),
            monitored = declaration.alarm.is_some(),
            "Composed scheduled task"
        );
        Ok(declaration)
    }
}

fn push_parameter(parameters: &mut Vec<ParameterDeclaration>, value: &ParameterValue) {
    if let Some(declaration) = value.declaration() {
        if !parameters
            .iter()
            .any(|p| p.logical_id == declaration.logical_id)
        {
            parameters.push(declaration.clone());
        }
    }
}

/// Compose using the process-wide shared values
pub fn compose_scheduled_task(
    stack: &Stack,
    identity: &ResolvedIdentity,
    id: &str,
    resolved: ResolvedTaskConfig,
    rules: &[ScheduleBinding],
    monitoring: &MonitoringConfiguration,
) -> Result<TaskDeclaration> {
    TaskComposer::new().compose_scheduled_task(stack, identity, id, resolved, rules, monitoring)
}
