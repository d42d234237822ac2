// Defaulting engine
//
// Fills the unset fields of a task configuration from convention:
// - memory size from the runtime family table (see runtime.rs)
// - timeout of 30 seconds
// - STACK/STAGE/APP environment entries, overridable by the caller
//
// Explicit values always win over defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::identity::{ArtifactReference, ResolvedIdentity};
use crate::runtime::Runtime;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Task configuration as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialTaskConfig {
    pub runtime: Runtime,
    pub handler: String,
    pub artifact: ArtifactReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl PartialTaskConfig {
    pub fn new(runtime: Runtime, handler: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            runtime,
            handler: handler.into(),
            artifact: ArtifactReference::new(file_name),
            function_name: None,
            description: None,
            memory_size: None,
            timeout: None,
            environment: BTreeMap::new(),
        }
    }
}

/// Fully-defaulted configuration handed to the framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTaskConfig {
    pub runtime: Runtime,
    pub handler: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub memory_size: u32,

    #[serde(rename = "timeout_secs", serialize_with = "serialize_secs")]
    pub timeout: Duration,

    pub environment: BTreeMap<String, String>,
    pub artifact_key: String,
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

/// Memory size for a runtime when none is given
pub fn default_memory_size(runtime: &Runtime, memory_size: Option<u32>) -> u32 {
    memory_size.unwrap_or_else(|| runtime.family().defaults().memory_size_mb)
}

/// Merge convention defaults into a partial task configuration
pub fn apply_defaults(partial: PartialTaskConfig, identity: &ResolvedIdentity) -> ResolvedTaskConfig {
    let memory_size = default_memory_size(&partial.runtime, partial.memory_size);
    let artifact_key = identity.artifact_key(&partial.artifact);

    // Caller entries are applied last so they win on conflict
    let mut environment = identity.default_environment();
    environment.extend(partial.environment);

    ResolvedTaskConfig {
        runtime: partial.runtime,
        handler: partial.handler,
        function_name: partial.function_name,
        description: partial.description,
        memory_size,
        timeout: partial.timeout.unwrap_or(DEFAULT_TIMEOUT),
        environment,
        artifact_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::resolve_identity;

    fn identity() -> ResolvedIdentity {
        resolve_identity("media-service", "PROD", "image-resizer")
    }

    #[test]
    fn test_memory_defaults_by_family() {
        for runtime in [
            Runtime::NODEJS_14_X,
            Runtime::PYTHON_3_9,
            Runtime::GO_1_X,
            Runtime::RUBY_2_7,
            Runtime::DOTNET_CORE_3_1,
            Runtime::PROVIDED_AL2,
        ] {
            let resolved = apply_defaults(PartialTaskConfig::new(runtime, "h", "f.zip"), &identity());
            assert_eq!(resolved.memory_size, 512, "{}", runtime);
        }

        for runtime in [Runtime::JAVA_8, Runtime::JAVA_8_CORRETTO, Runtime::JAVA_11] {
            let resolved = apply_defaults(PartialTaskConfig::new(runtime, "h", "f.jar"), &identity());
            assert_eq!(resolved.memory_size, 1024, "{}", runtime);
        }
    }

    #[test]
    fn test_explicit_memory_is_preserved() {
        for (runtime, memory) in [
            (Runtime::JAVA_11, 256),
            (Runtime::NODEJS_16_X, 2048),
            (Runtime::GO_1_X, 128),
        ] {
            let mut partial = PartialTaskConfig::new(runtime, "h", "f.zip");
            partial.memory_size = Some(memory);
            assert_eq!(apply_defaults(partial, &identity()).memory_size, memory);
        }
    }

    #[test]
    fn test_timeout_default_and_override() {
        let partial = PartialTaskConfig::new(Runtime::NODEJS_14_X, "h", "f.zip");
        assert_eq!(apply_defaults(partial.clone(), &identity()).timeout, Duration::from_secs(30));

        let mut partial = partial;
        partial.timeout = Some(Duration::from_secs(300));
        assert_eq!(apply_defaults(partial, &identity()).timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_environment_merge_caller_wins() {
        let mut partial = PartialTaskConfig::new(Runtime::NODEJS_14_X, "h", "f.zip");
        partial.environment.insert("STAGE".to_string(), "overridden".to_string());
        partial.environment.insert("FEATURE".to_string(), "on".to_string());

        let resolved = apply_defaults(partial, &identity());
        assert_eq!(resolved.environment.get("STAGE").unwrap(), "overridden");
        assert_eq!(resolved.environment.get("STACK").unwrap(), "media-service");
        assert_eq!(resolved.environment.get("APP").unwrap(), "image-resizer");
        assert_eq!(resolved.environment.get("FEATURE").unwrap(), "on");
        assert_eq!(resolved.environment.len(), 4);
    }

    #[test]
    fn test_pass_through_fields() {
        let mut partial = PartialTaskConfig::new(Runtime::NODEJS_14_X, "index.handler", "lambda.zip");
        partial.function_name = Some("image-resizer-PROD".to_string());
        partial.description = Some("Resizes images".to_string());

        let resolved = apply_defaults(partial, &identity());
        assert_eq!(resolved.handler, "index.handler");
        assert_eq!(resolved.function_name.as_deref(), Some("image-resizer-PROD"));
        assert_eq!(resolved.description.as_deref(), Some("Resizes images"));
        assert_eq!(resolved.artifact_key, "media-service/PROD/image-resizer/lambda.zip");
    }

    #[test]
    fn test_resolved_config_serializes_timeout_as_seconds() {
        let resolved = apply_defaults(
            PartialTaskConfig::new(Runtime::NODEJS_14_X, "h", "f.zip"),
            &identity(),
        );
        let value = serde_json::to_value(&resolved).unwrap();
        assert_eq!(value["timeout_secs"], 30);
        assert_eq!(value["runtime"], "nodejs14.x");
        assert!(value.get("function_name").is_none());
    }
}
