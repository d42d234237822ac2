//! Deployment identity: stack, stage and app.
//!
//! Every declaration is scoped to a (stack, stage, app) triple. The triple
//! renders into the standard resource tags and the artifact key prefix:
//!
//! ```rust
//! use gucdk_core::identity::{resolve_identity, ArtifactReference};
//!
//! let identity = resolve_identity("media-service", "PROD", "image-resizer");
//! assert_eq!(identity.artifact_key_prefix, "media-service/PROD/image-resizer");
//! assert_eq!(
//!     identity.artifact_key(&ArtifactReference::new("lambda.zip")),
//!     "media-service/PROD/image-resizer/lambda.zip"
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

use crate::error::{DeclarationError, Result};

/// Version written to the `gu:cdk:version` tag
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Repository written to the `gu:repo` tag
pub const REPOSITORY: &str = "guardian/cdk";

/// Environment variable consulted when no CloudFormation stack name is given
pub const CFN_STACK_NAME_ENV: &str = "GU_CFN_STACK_NAME";

pub const TAG_STACK: &str = "Stack";
pub const TAG_STAGE: &str = "Stage";
pub const TAG_APP: &str = "App";
pub const TAG_VERSION: &str = "gu:cdk:version";
pub const TAG_REPO: &str = "gu:repo";

/// Identity of a deployment target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackStageIdentity {
    pub stack: String,
    pub stage: String,
}

/// Name of the deployable application within a stack/stage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppIdentity {
    pub app: String,
}

impl AppIdentity {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }
}

/// Logical name of the packaged artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactReference {
    pub file_name: String,
}

impl ArtifactReference {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// Output of the identity resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    pub stack: String,
    pub stage: String,
    pub app: String,
    pub tags: BTreeMap<String, String>,
    pub artifact_key_prefix: String,
}

impl ResolvedIdentity {
    /// Storage key of an artifact: `<stack>/<stage>/<app>/<fileName>`
    pub fn artifact_key(&self, artifact: &ArtifactReference) -> String {
        format!("{}/{}", self.artifact_key_prefix, artifact.file_name)
    }

    /// `STACK`, `STAGE` and `APP` entries every function receives
    pub fn default_environment(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("STACK".to_string(), self.stack.clone()),
            ("STAGE".to_string(), self.stage.clone()),
            ("APP".to_string(), self.app.clone()),
        ])
    }
}

/// Resolve tags and the artifact key prefix for a (stack, stage, app) triple
///
/// Inputs are not validated; use [`Stack::new`] for checked construction.
pub fn resolve_identity(stack: &str, stage: &str, app: &str) -> ResolvedIdentity {
    build_identity(stack, stage, app, true)
}

fn build_identity(stack: &str, stage: &str, app: &str, with_tags: bool) -> ResolvedIdentity {
    let tags = if with_tags {
        let mut tags = standard_tags(stack, stage);
        tags.insert(TAG_APP.to_string(), app.to_string());
        tags
    } else {
        BTreeMap::new()
    };

    ResolvedIdentity {
        stack: stack.to_string(),
        stage: stage.to_string(),
        app: app.to_string(),
        tags,
        artifact_key_prefix: [stack, stage, app].join("/"),
    }
}

fn standard_tags(stack: &str, stage: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (TAG_VERSION.to_string(), LIBRARY_VERSION.to_string()),
        (TAG_REPO.to_string(), REPOSITORY.to_string()),
        (TAG_STACK.to_string(), stack.to_string()),
        (TAG_STAGE.to_string(), stage.to_uppercase()),
    ])
}

/// Properties for [`Stack::new`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackProps {
    pub stack: String,
    pub stage: String,

    /// CloudFormation stack name; falls back to `GU_CFN_STACK_NAME`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudformation_stack_name: Option<String>,

    /// Disable all standard tags. Only meant for initial migrations.
    #[serde(default)]
    pub without_tags: bool,
}

/// A deployment target carrying the organisation's stack conventions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    identity: StackStageIdentity,
    cloudformation_stack_name: Option<String>,
    without_tags: bool,
}

impl Stack {
    /// Create a stack, rejecting empty stack or stage names.
    ///
    /// # Errors
    ///
    /// Returns [`DeclarationError::MissingField`] when `stack` or `stage` is empty.
    pub fn new(props: StackProps) -> Result<Self> {
        if props.stack.is_empty() {
            return Err(DeclarationError::missing_field("stack"));
        }
        if props.stage.is_empty() {
            return Err(DeclarationError::missing_field("stage"));
        }

        let cloudformation_stack_name = props
            .cloudformation_stack_name
            .or_else(|| env::var(CFN_STACK_NAME_ENV).ok())
            .filter(|name| !name.is_empty());

        Ok(Self {
            identity: StackStageIdentity {
                stack: props.stack,
                stage: props.stage,
            },
            cloudformation_stack_name,
            without_tags: props.without_tags,
        })
    }

    pub fn identity(&self) -> &StackStageIdentity {
        &self.identity
    }

    pub fn stack(&self) -> &str {
        &self.identity.stack
    }

    /// Stage as given at construction
    pub fn stage(&self) -> &str {
        &self.identity.stage
    }

    /// Stage in its canonical (upper case) form, as used in tags
    pub fn canonical_stage(&self) -> String {
        self.identity.stage.to_uppercase()
    }

    pub fn cloudformation_stack_name(&self) -> Option<&str> {
        self.cloudformation_stack_name.as_deref()
    }

    pub fn tagging_enabled(&self) -> bool {
        !self.without_tags
    }

    /// Stack-level tags, applied to every resource in the stack
    pub fn tags(&self) -> BTreeMap<String, String> {
        if self.without_tags {
            BTreeMap::new()
        } else {
            standard_tags(self.stack(), self.stage())
        }
    }

    /// Resolve the identity of an app deployed into this stack
    pub fn resolve(&self, app: &AppIdentity) -> ResolvedIdentity {
        build_identity(self.stack(), self.stage(), &app.app, !self.without_tags)
    }
}
