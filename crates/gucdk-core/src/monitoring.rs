// Monitoring configuration for tasks
//
// A task either opts out of monitoring explicitly or tolerates a percentage
// of failed invocations. There is no implicit default: one of the two must be
// chosen, and choosing both is a configuration error.

use serde::{Deserialize, Serialize};

use crate::error::{DeclarationError, Result};

pub const DEFAULT_EVALUATION_WINDOW_MINUTES: u32 = 1;

/// CloudWatch evaluates alarms over at most one day
pub const MAX_EVALUATION_WINDOW_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MonitoringConfiguration {
    NoMonitoring,
    ErrorPercentage(ErrorPercentageMonitoring),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPercentageMonitoring {
    pub tolerated_error_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_window_minutes: Option<u32>,
}

impl ErrorPercentageMonitoring {
    pub fn new(tolerated_error_percentage: f64) -> Self {
        Self {
            tolerated_error_percentage,
            evaluation_window_minutes: None,
        }
    }

    pub fn evaluation_window_minutes(&self) -> u32 {
        self.evaluation_window_minutes
            .unwrap_or(DEFAULT_EVALUATION_WINDOW_MINUTES)
    }
}

impl MonitoringConfiguration {
    pub fn error_percentage(tolerated_error_percentage: f64) -> Self {
        Self::ErrorPercentage(ErrorPercentageMonitoring::new(tolerated_error_percentage))
    }

    /// Build from the two mutually exclusive settings a caller may supply.
    ///
    /// # Errors
    ///
    /// Fails when both or neither are set, or when the thresholds are out of range.
    pub fn from_parts(
        no_monitoring: bool,
        error_percentage: Option<ErrorPercentageMonitoring>,
    ) -> Result<Self> {
        let config = match (no_monitoring, error_percentage) {
            (true, Some(_)) => return Err(DeclarationError::conflicting_monitoring()),
            (true, None) => Self::NoMonitoring,
            (false, Some(monitoring)) => Self::ErrorPercentage(monitoring),
            (false, None) => {
                return Err(DeclarationError::invalid_monitoring(
                    "either no_monitoring or tolerated_error_percentage must be set",
                ))
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let Self::ErrorPercentage(monitoring) = self else {
            return Ok(());
        };

        let percentage = monitoring.tolerated_error_percentage;
        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(DeclarationError::invalid_monitoring(format!(
                "tolerated_error_percentage must be between 0 and 100, got {}",
                percentage
            )));
        }
        match monitoring.evaluation_window_minutes {
            Some(0) => {
                return Err(DeclarationError::invalid_monitoring(
                    "evaluation_window_minutes must be greater than 0",
                ))
            }
            Some(minutes) if minutes > MAX_EVALUATION_WINDOW_MINUTES => {
                return Err(DeclarationError::invalid_monitoring(format!(
                    "evaluation_window_minutes must be at most {}, got {}",
                    MAX_EVALUATION_WINDOW_MINUTES, minutes
                )))
            }
            _ => {}
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::ErrorPercentage(_))
    }
}
