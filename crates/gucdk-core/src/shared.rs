//! Process-wide shared values
//!
//! Some values are shared by every stack in an account: the artifact
//! distribution bucket and the alarm notification topic. Each is declared
//! once as a [`SharedValue`]; the first lookup runs its resolver and every
//! later lookup in the process returns the stored value.

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::identity::Stack;

/// Template type of SSM-backed string parameters
pub const SSM_STRING_PARAMETER: &str = "AWS::SSM::Parameter::Value<String>";

/// Default SSM path of the artifact distribution bucket name
pub const DIST_BUCKET_SSM_PATH: &str = "/account/services/artifact.bucket";

/// Default SSM path of the alarm notification topic ARN
pub const ALARM_TOPIC_SSM_PATH: &str = "/account/services/alarm.topic.arn";

/// Distribution bucket name, shared across all stacks
pub static DIST_BUCKET_NAME: SharedValue<ParameterValue> = SharedValue::new("DistBucketName");

/// Alarm notification topic ARN, shared across all stacks
pub static ALARM_TOPIC_ARN: SharedValue<ParameterValue> = SharedValue::new("AlarmTopicArn");

/// A lazily-resolved value, resolved at most once per process
#[derive(Debug)]
pub struct SharedValue<T> {
    key: &'static str,
    cell: OnceCell<T>,
}

impl<T: Clone> SharedValue<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            cell: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the stored value, running `resolver` on first access.
    ///
    /// Concurrent first calls block until the single resolver run finishes.
    pub fn get<F>(&self, stack: &Stack, resolver: F) -> T
    where
        F: FnOnce(&Stack) -> T,
    {
        self.cell
            .get_or_init(|| {
                debug!(key = self.key, stack = stack.stack(), "Resolving shared value");
                resolver(stack)
            })
            .clone()
    }
}

/// A template parameter backed by SSM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDeclaration {
    pub logical_id: String,
    #[serde(rename = "type")]
    pub parameter_type: String,
    pub default: String,
    pub description: String,
}

/// A value either known at declaration time or looked up at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterValue {
    Literal { value: String },
    Parameter(ParameterDeclaration),
}

impl ParameterValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn ssm(
        logical_id: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::Parameter(ParameterDeclaration {
            logical_id: logical_id.into(),
            parameter_type: SSM_STRING_PARAMETER.to_string(),
            default: path.into(),
            description: description.into(),
        })
    }

    /// Value as written into a template: the literal, or a `Ref` to the parameter
    pub fn template_value(&self) -> Value {
        match self {
            Self::Literal { value } => json!(value),
            Self::Parameter(parameter) => json!({ "Ref": parameter.logical_id }),
        }
    }

    pub fn declaration(&self) -> Option<&ParameterDeclaration> {
        match self {
            Self::Literal { .. } => None,
            Self::Parameter(parameter) => Some(parameter),
        }
    }
}

/// Default resolver for [`DIST_BUCKET_NAME`]
pub fn dist_bucket_parameter(_stack: &Stack) -> ParameterValue {
    ParameterValue::ssm(
        DIST_BUCKET_NAME.key(),
        DIST_BUCKET_SSM_PATH,
        "SSM parameter containing the artifact distribution bucket name",
    )
}

/// Default resolver for [`ALARM_TOPIC_ARN`]
pub fn alarm_topic_parameter(_stack: &Stack) -> ParameterValue {
    ParameterValue::ssm(
        ALARM_TOPIC_ARN.key(),
        ALARM_TOPIC_SSM_PATH,
        "SSM parameter containing the alarm notification topic ARN",
    )
}
