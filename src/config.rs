//! Task configuration, read once when a task starts.

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_TRIALS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("trial count must be positive")]
    NonPositiveTrials,
    #[error("trial count is not a positive integer: {0:?}")]
    InvalidTrials(String),
}

/// Settings supplied by the hosting page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskConfig {
    /// Number of trials before `advance_trial` stops moving on.
    pub trials: u32,
    /// Whether the player may end the search before the time limit.
    pub allow_early_exit: bool,
    /// Whether the results screen shows the search score.
    pub show_results: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            allow_early_exit: true,
            show_results: true,
        }
    }
}

/// A flag is off only when spelled `false` or `0`.
fn parse_flag(value: &str) -> bool {
    !matches!(value, "false" | "0")
}

impl TaskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::NonPositiveTrials);
        }
        Ok(())
    }

    /// Parse URL search parameters (`?trials=10&allowEarlyExit=0`).
    ///
    /// Keys and values are percent-decoded. Unknown keys are ignored. A
    /// leading `?` is allowed.
    pub fn from_query(query: &str) -> Result<Self, ConfigError> {
        let mut config = TaskConfig::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.as_ref();
            match key.as_ref() {
                "trials" => {
                    let trials: i64 = value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidTrials(value.to_string()))?;
                    if trials <= 0 {
                        return Err(ConfigError::NonPositiveTrials);
                    }
                    config.trials = u32::try_from(trials)
                        .map_err(|_| ConfigError::InvalidTrials(value.to_string()))?;
                }
                "allowEarlyExit" => config.allow_early_exit = parse_flag(value),
                "showResults" => config.show_results = parse_flag(value),
                other => log::debug!("ignoring query parameter {other}"),
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = TaskConfig::default();
        assert_eq!(c.trials, 30);
        assert!(c.allow_early_exit);
        assert!(c.show_results);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_query() {
        let c = TaskConfig::from_query("?trials=12&allowEarlyExit=false&showResults=0&expId=x")
            .unwrap();
        assert_eq!(c.trials, 12);
        assert!(!c.allow_early_exit);
        assert!(!c.show_results);
    }

    #[test]
    fn test_query_values_are_percent_decoded() {
        let c = TaskConfig::from_query("?trials=%31%30&showResults=%66alse").unwrap();
        assert_eq!(c.trials, 10);
        assert!(!c.show_results);
        assert_eq!(
            TaskConfig::from_query("trials=%2D1"),
            Err(ConfigError::NonPositiveTrials)
        );
    }

    #[test]
    fn test_flags_default_true() {
        let c = TaskConfig::from_query("allowEarlyExit=no&showResults").unwrap();
        assert!(c.allow_early_exit);
        assert!(c.show_results);
        assert_eq!(TaskConfig::from_query("").unwrap(), TaskConfig::default());
    }

    #[test]
    fn test_bad_trials_fail_fast() {
        assert_eq!(
            TaskConfig::from_query("trials=0"),
            Err(ConfigError::NonPositiveTrials)
        );
        assert_eq!(
            TaskConfig::from_query("trials=-4"),
            Err(ConfigError::NonPositiveTrials)
        );
        assert_eq!(
            TaskConfig::from_query("trials=abc"),
            Err(ConfigError::InvalidTrials("abc".to_string()))
        );
        let zero = TaskConfig { trials: 0, ..TaskConfig::default() };
        assert_eq!(zero.validate(), Err(ConfigError::NonPositiveTrials));
    }

    #[test]
    fn test_deserialize_partial_object() {
        let c: TaskConfig = serde_json::from_str(r#"{"trials":5,"showResults":false}"#).unwrap();
        assert_eq!(c.trials, 5);
        assert!(c.allow_early_exit);
        assert!(!c.show_results);
    }
}
