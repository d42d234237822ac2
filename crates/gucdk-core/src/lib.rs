// gucdk-core - Organisation conventions for scheduled compute tasks
//
// Pure declaration logic: identity tagging, convention defaults and task
// composition. No I/O, no async; the resulting declarations are handed to an
// infrastructure framework for materialisation.

pub mod alarm;
pub mod defaults;
pub mod error;
pub mod identity;
pub mod monitoring;
pub mod runtime;
pub mod schedule;
pub mod shared;
pub mod task;

// Re-export commonly used types
pub use defaults::{apply_defaults, PartialTaskConfig, ResolvedTaskConfig};
pub use error::{DeclarationError, ErrorCode, Result};
pub use identity::{
    resolve_identity, AppIdentity, ArtifactReference, ResolvedIdentity, Stack, StackProps,
    StackStageIdentity,
};
pub use monitoring::{ErrorPercentageMonitoring, MonitoringConfiguration};
pub use runtime::{Runtime, RuntimeFamily};
pub use schedule::{CronOptions, Schedule, ScheduleBinding};
pub use shared::{ParameterValue, SharedValue, ALARM_TOPIC_ARN, DIST_BUCKET_NAME};
pub use task::{
    compose_scheduled_task, Effect, EventSource, EventSourceDeclaration, PolicyStatement,
    ScheduledTaskProps, SharedOverrides, TaskComposer, TaskDeclaration,
};
