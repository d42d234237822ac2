// Function runtimes and their families
//
// Each runtime belongs to a family. Families carry the defaults used when a
// task leaves memory size unset:
// - Java: 1024 MB (JVM start-up and heap)
// - everything else: 512 MB

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::DeclarationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFamily {
    NodeJs,
    Java,
    Python,
    DotNetCore,
    Go,
    Ruby,
    Other,
}

impl RuntimeFamily {
    /// Get family-specific defaults
    pub fn defaults(&self) -> FamilyDefaults {
        match self {
            RuntimeFamily::Java => FamilyDefaults {
                memory_size_mb: 1024,
            },
            RuntimeFamily::NodeJs
            | RuntimeFamily::Python
            | RuntimeFamily::DotNetCore
            | RuntimeFamily::Go
            | RuntimeFamily::Ruby
            | RuntimeFamily::Other => FamilyDefaults {
                memory_size_mb: 512,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyDefaults {
    pub memory_size_mb: u32,
}

/// A named function runtime, e.g. `nodejs14.x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Runtime {
    name: &'static str,
    family: RuntimeFamily,
}

impl Runtime {
    pub const NODEJS_12_X: Runtime = Runtime::new("nodejs12.x", RuntimeFamily::NodeJs);
    pub const NODEJS_14_X: Runtime = Runtime::new("nodejs14.x", RuntimeFamily::NodeJs);
    pub const NODEJS_16_X: Runtime = Runtime::new("nodejs16.x", RuntimeFamily::NodeJs);
    pub const JAVA_8: Runtime = Runtime::new("java8", RuntimeFamily::Java);
    pub const JAVA_8_CORRETTO: Runtime = Runtime::new("java8.al2", RuntimeFamily::Java);
    pub const JAVA_11: Runtime = Runtime::new("java11", RuntimeFamily::Java);
    pub const PYTHON_3_8: Runtime = Runtime::new("python3.8", RuntimeFamily::Python);
    pub const PYTHON_3_9: Runtime = Runtime::new("python3.9", RuntimeFamily::Python);
    pub const DOTNET_CORE_3_1: Runtime = Runtime::new("dotnetcore3.1", RuntimeFamily::DotNetCore);
    pub const GO_1_X: Runtime = Runtime::new("go1.x", RuntimeFamily::Go);
    pub const RUBY_2_7: Runtime = Runtime::new("ruby2.7", RuntimeFamily::Ruby);
    pub const PROVIDED_AL2: Runtime = Runtime::new("provided.al2", RuntimeFamily::Other);

    const ALL: [Runtime; 12] = [
        Runtime::NODEJS_12_X,
        Runtime::NODEJS_14_X,
        Runtime::NODEJS_16_X,
        Runtime::JAVA_8,
        Runtime::JAVA_8_CORRETTO,
        Runtime::JAVA_11,
        Runtime::PYTHON_3_8,
        Runtime::PYTHON_3_9,
        Runtime::DOTNET_CORE_3_1,
        Runtime::GO_1_X,
        Runtime::RUBY_2_7,
        Runtime::PROVIDED_AL2,
    ];

    pub const fn new(name: &'static str, family: RuntimeFamily) -> Self {
        Self { name, family }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn family(&self) -> RuntimeFamily {
        self.family
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl FromStr for Runtime {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let alias = match wanted.as_str() {
            "go1" | "go" => "go1.x",
            "node14" => "nodejs14.x",
            "node16" => "nodejs16.x",
            other => other,
        };

        Runtime::ALL
            .iter()
            .find(|runtime| runtime.name == alias)
            .copied()
            .ok_or_else(|| DeclarationError::unknown_runtime(s))
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
