//! Error-percentage alarm declarations
//!
//! The alarm watches `100 * Errors / Invocations` for a single function over
//! one evaluation period. Periods without invocations produce no data and are
//! treated as not breaching.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::monitoring::ErrorPercentageMonitoring;
use crate::shared::ParameterValue;

pub const FUNCTION_METRIC_NAMESPACE: &str = "AWS/Lambda";
pub const ERROR_PERCENTAGE_EXPRESSION: &str = "100*m1/m2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    Missing,
}

/// A single metric of a function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStat {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, Value>,
    pub statistic: String,
    pub period_secs: u32,
}

impl MetricStat {
    fn function_sum(metric_name: &str, function_id: &str, period_secs: u32) -> Self {
        Self {
            namespace: FUNCTION_METRIC_NAMESPACE.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: BTreeMap::from([(
                "FunctionName".to_string(),
                json!({ "Ref": function_id }),
            )]),
            statistic: "Sum".to_string(),
            period_secs,
        }
    }
}

/// Metric math over named metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MathExpression {
    pub expression: String,
    pub label: String,
    pub using_metrics: BTreeMap<String, MetricStat>,
    pub period_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmDeclaration {
    pub id: String,
    pub alarm_name: String,
    pub alarm_description: String,
    pub metric: MathExpression,
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    pub evaluation_periods: u32,
    pub treat_missing_data: TreatMissingData,
    pub alarm_actions: Vec<Value>,
}

/// Declare the error-percentage alarm of a task's function
pub fn error_percentage_alarm(
    task_id: &str,
    function_id: &str,
    stage: &str,
    monitoring: &ErrorPercentageMonitoring,
    alarm_topic: &ParameterValue,
) -> AlarmDeclaration {
    let period_secs = monitoring.evaluation_window_minutes().saturating_mul(60);
    let threshold = monitoring.tolerated_error_percentage;

    let metric = MathExpression {
        expression: ERROR_PERCENTAGE_EXPRESSION.to_string(),
        label: format!("Error % of {}", task_id),
        using_metrics: BTreeMap::from([
            (
                "m1".to_string(),
                MetricStat::function_sum("Errors", function_id, period_secs),
            ),
            (
                "m2".to_string(),
                MetricStat::function_sum("Invocations", function_id, period_secs),
            ),
        ]),
        period_secs,
    };

    AlarmDeclaration {
        id: format!("error-alarm-{}", task_id),
        alarm_name: format!("{}-{}-error-percentage", task_id, stage.to_uppercase()),
        alarm_description: format!(
            "{} exceeded {}% error rate over {} minute(s)",
            task_id,
            threshold,
            monitoring.evaluation_window_minutes()
        ),
        metric,
        comparison_operator: ComparisonOperator::GreaterThanThreshold,
        threshold,
        evaluation_periods: 1,
        treat_missing_data: TreatMissingData::NotBreaching,
        alarm_actions: vec![alarm_topic.template_value()],
    }
}
