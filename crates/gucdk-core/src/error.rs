//! Error types for declaration construction

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Required identity field missing or empty
    E001MissingField,
    /// E002: Monitoring configuration invalid or ambiguous
    E002InvalidMonitoring,
    /// E003: Schedule expression could not be built
    E003InvalidSchedule,
    /// E004: Runtime name not recognised
    E004UnknownRuntime,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001MissingField => "E001",
            Self::E002InvalidMonitoring => "E002",
            Self::E003InvalidSchedule => "E003",
            Self::E004UnknownRuntime => "E004",
        }
    }
}

/// Errors raised while building declarations
///
/// Every variant is a caller-contract violation detected synchronously at
/// construction time. Nothing here is retryable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeclarationError {
    /// A required identity field was empty
    #[error("[{code}] Invalid configuration: '{field}' must not be empty")]
    MissingField {
        code: &'static str,
        field: &'static str,
    },

    /// Both monitoring variants were requested at once
    #[error("[{code}] Invalid configuration: monitoring cannot be both disabled and error-percentage based")]
    ConflictingMonitoring { code: &'static str },

    /// Error-percentage monitoring with out-of-range values
    #[error("[{code}] Invalid monitoring configuration: {message}")]
    InvalidMonitoring { code: &'static str, message: String },

    /// Schedule could not be expressed as a rate or cron rule
    #[error("[{code}] Invalid schedule '{expression}': {reason}")]
    InvalidSchedule {
        code: &'static str,
        expression: String,
        reason: String,
    },

    /// Runtime name not in the known runtime table
    #[error("[{code}] Unknown runtime '{name}'")]
    UnknownRuntime { code: &'static str, name: String },
}

impl DeclarationError {
    /// Create a missing field error with error code
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField {
            code: ErrorCode::E001MissingField.as_str(),
            field,
        }
    }

    /// Create a conflicting monitoring error with error code
    pub fn conflicting_monitoring() -> Self {
        Self::ConflictingMonitoring {
            code: ErrorCode::E002InvalidMonitoring.as_str(),
        }
    }

    /// Create an invalid monitoring error with error code
    pub fn invalid_monitoring(message: impl Into<String>) -> Self {
        Self::InvalidMonitoring {
            code: ErrorCode::E002InvalidMonitoring.as_str(),
            message: message.into(),
        }
    }

    /// Create an invalid schedule error with error code
    pub fn invalid_schedule(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            code: ErrorCode::E003InvalidSchedule.as_str(),
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown runtime error with error code
    pub fn unknown_runtime(name: impl Into<String>) -> Self {
        Self::UnknownRuntime {
            code: ErrorCode::E004UnknownRuntime.as_str(),
            name: name.into(),
        }
    }

    /// Error code of this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { code, .. }
            | Self::ConflictingMonitoring { code }
            | Self::InvalidMonitoring { code, .. }
            | Self::InvalidSchedule { code, .. }
            | Self::UnknownRuntime { code, .. } => code,
        }
    }
}

/// Result type alias for DeclarationError
pub type Result<T> = std::result::Result<T, DeclarationError>;
