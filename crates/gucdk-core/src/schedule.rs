//! Schedule expressions for task triggers
//!
//! Supports the two EventBridge forms:
//! - `rate(<value> <unit>)` with minute, hour or day units
//! - `cron(<minute> <hour> <day> <month> <weekDay> <year>)`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DeclarationError, Result};

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// A cron or rate expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schedule {
    expression: String,
}

/// Fields of a cron schedule. Unset fields default to `*`, with the usual
/// `?` handling for day and week day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl Schedule {
    /// Run at a fixed rate. The duration must be a non-zero whole number of
    /// minutes and is rendered in the largest unit that divides it exactly.
    pub fn rate(duration: Duration) -> Result<Self> {
        let rendered = format!("{:?}", duration);
        if duration.is_zero() {
            return Err(DeclarationError::invalid_schedule(
                rendered,
                "rate cannot be zero",
            ));
        }
        if duration.subsec_nanos() != 0 || duration.as_secs() % 60 != 0 {
            return Err(DeclarationError::invalid_schedule(
                rendered,
                "rate must be a whole number of minutes",
            ));
        }

        let minutes = duration.as_secs() / 60;
        let (value, unit) = if minutes % MINUTES_PER_DAY == 0 {
            (minutes / MINUTES_PER_DAY, "day")
        } else if minutes % MINUTES_PER_HOUR == 0 {
            (minutes / MINUTES_PER_HOUR, "hour")
        } else {
            (minutes, "minute")
        };

        let plural = if value == 1 { "" } else { "s" };
        Ok(Self {
            expression: format!("rate({} {}{})", value, unit, plural),
        })
    }

    /// Run on a cron schedule.
    pub fn cron(options: CronOptions) -> Result<Self> {
        if options.day.is_some() && options.week_day.is_some() {
            return Err(DeclarationError::invalid_schedule(
                format!("{:?}", options),
                "cannot supply both 'day' and 'week_day', use at most one",
            ));
        }

        let star = || "*".to_string();
        let minute = options.minute.unwrap_or_else(star);
        let hour = options.hour.unwrap_or_else(star);
        let month = options.month.unwrap_or_else(star);
        let year = options.year.unwrap_or_else(star);
        let day = options.day.unwrap_or_else(|| {
            if options.week_day.is_some() {
                "?".to_string()
            } else {
                star()
            }
        });
        let week_day = options.week_day.unwrap_or_else(|| "?".to_string());

        Ok(Self {
            expression: format!(
                "cron({} {} {} {} {} {})",
                minute, hour, day, month, week_day, year
            ),
        })
    }

    /// Use a raw expression verbatim, without validation
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    pub fn expression_string(&self) -> &str {
        &self.expression
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl FromStr for Schedule {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(body) = s.strip_prefix("rate(").and_then(|b| b.strip_suffix(')')) {
            validate_rate_body(s, body)?;
        } else if let Some(body) = s.strip_prefix("cron(").and_then(|b| b.strip_suffix(')')) {
            validate_cron_body(s, body)?;
        } else {
            return Err(DeclarationError::invalid_schedule(
                s,
                "expected 'rate(...)' or 'cron(...)'",
            ));
        }
        Ok(Self::expression(s))
    }
}

fn validate_rate_body(expression: &str, body: &str) -> Result<()> {
    let mut parts = body.split_whitespace();
    let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DeclarationError::invalid_schedule(
            expression,
            "rate must be '<value> <unit>'",
        ));
    };

    let value: u64 = value.parse().map_err(|_| {
        DeclarationError::invalid_schedule(expression, "rate value must be a positive integer")
    })?;
    if value == 0 {
        return Err(DeclarationError::invalid_schedule(
            expression,
            "rate cannot be zero",
        ));
    }

    let singular = matches!(unit, "minute" | "hour" | "day");
    let plural = matches!(unit, "minutes" | "hours" | "days");
    if !singular && !plural {
        return Err(DeclarationError::invalid_schedule(
            expression,
            "rate unit must be minute(s), hour(s) or day(s)",
        ));
    }
    if singular != (value == 1) {
        return Err(DeclarationError::invalid_schedule(
            expression,
            "use a singular unit for a value of 1 and a plural unit otherwise",
        ));
    }
    Ok(())
}

fn validate_cron_body(expression: &str, body: &str) -> Result<()> {
    let fields: Vec<&str> = body.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(DeclarationError::invalid_schedule(
            expression,
            "cron must have 6 fields: minute hour day month weekDay year",
        ));
    }
    if fields[2] != "?" && fields[4] != "?" {
        return Err(DeclarationError::invalid_schedule(
            expression,
            "one of day or weekDay must be '?'",
        ));
    }
    Ok(())
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.expression)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let expression = String::deserialize(deserializer)?;
        expression.parse().map_err(serde::de::Error::custom)
    }
}

/// One trigger rule for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBinding {
    pub schedule: Schedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScheduleBinding {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn test_rate_units() {
        assert_eq!(Schedule::rate(minutes(1)).unwrap().expression_string(), "rate(1 minute)");
        assert_eq!(Schedule::rate(minutes(5)).unwrap().expression_string(), "rate(5 minutes)");
        assert_eq!(Schedule::rate(minutes(60)).unwrap().expression_string(), "rate(1 hour)");
        assert_eq!(Schedule::rate(minutes(90)).unwrap().expression_string(), "rate(90 minutes)");
        assert_eq!(Schedule::rate(minutes(180)).unwrap().expression_string(), "rate(3 hours)");
        assert_eq!(Schedule::rate(minutes(1440)).unwrap().expression_string(), "rate(1 day)");
        assert_eq!(Schedule::rate(minutes(2880)).unwrap().expression_string(), "rate(2 days)");
    }

    #[test]
    fn test_rate_rejects_invalid_durations() {
        assert!(Schedule::rate(Duration::ZERO).is_err());
        assert!(Schedule::rate(Duration::from_secs(90)).is_err());
        assert!(Schedule::rate(Duration::from_millis(60_500)).is_err());
    }

    #[test]
    fn test_cron_defaults() {
        let every_minute = Schedule::cron(CronOptions::default()).unwrap();
        assert_eq!(every_minute.expression_string(), "cron(* * * * ? *)");

        let nightly = Schedule::cron(CronOptions {
            minute: Some("0".to_string()),
            hour: Some("3".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(nightly.expression_string(), "cron(0 3 * * ? *)");

        let mondays = Schedule::cron(CronOptions {
            minute: Some("0".to_string()),
            hour: Some("9".to_string()),
            week_day: Some("MON".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(mondays.expression_string(), "cron(0 9 ? * MON *)");
    }

    #[test]
    fn test_cron_rejects_day_and_week_day() {
        let err = Schedule::cron(CronOptions {
            day: Some("1".to_string()),
            week_day: Some("MON".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "E003");
    }

    #[test]
    fn test_parse_expressions() {
        assert!("rate(1 minute)".parse::<Schedule>().is_ok());
        assert!("rate(10 minutes)".parse::<Schedule>().is_ok());
        assert!("cron(0 12 * * ? *)".parse::<Schedule>().is_ok());

        assert!("rate(1 minutes)".parse::<Schedule>().is_err());
        assert!("rate(2 hour)".parse::<Schedule>().is_err());
        assert!("rate(0 minutes)".parse::<Schedule>().is_err());
        assert!("rate(5 weeks)".parse::<Schedule>().is_err());
        assert!("cron(0 12 * * *)".parse::<Schedule>().is_err());
        assert!("cron(0 12 1 * MON *)".parse::<Schedule>().is_err());
        assert!("every day".parse::<Schedule>().is_err());
    }

    #[test]
    fn test_binding_deserializes_from_string() {
        let binding: ScheduleBinding =
            serde_json::from_str(r#"{"schedule":"rate(5 minutes)","description":"poll"}"#).unwrap();
        assert_eq!(binding.schedule.expression_string(), "rate(5 minutes)");
        assert_eq!(binding.description.as_deref(), Some("poll"));

        let bad = serde_json::from_str::<ScheduleBinding>(r#"{"schedule":"rate(5)"}"#);
        assert!(bad.is_err());
    }
}
