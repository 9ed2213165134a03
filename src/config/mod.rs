pub mod cli;

use crate::utils::error::{CollectorError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const API_URL_VAR: &str = "MTDDATA_API_URL";
pub const API_KEY_VAR: &str = "MTDDATA_API_KEY";
pub const OUTPUT_PATH_VAR: &str = "MTDDATA_OUTPUT_PATH";
pub const STOP_IDS_VAR: &str = "MTDDATA_STOP_IDS";
pub const UPDATE_INTERVAL_VAR: &str = "MTDDATA_UPDATE_INTERVAL_SECONDS";
pub const WEATHER_OUTPUT_PATH_VAR: &str = "MTDDATA_WEATHER_OUTPUT_PATH";

/// Largest accepted interval: `i64::MAX` nanoseconds, about 292 years.
pub const MAX_INTERVAL_SECONDS: u64 = 9_223_372_036;

/// Settings read once at startup. Nothing re-reads the environment after this is built.
#[derive(Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub api_url: String,
    pub api_key: String,
    pub output_path: PathBuf,
    pub stop_ids: Vec<String>,
    pub update_interval: Duration,
    pub weather_output_path: Option<PathBuf>,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| CollectorError::MissingConfig {
                    field: name.to_string(),
                })
        };

        // 依照固定順序檢查，回報第一個缺少的變數
        let api_url = required(API_URL_VAR)?;
        let api_key = required(API_KEY_VAR)?;
        let output_path = required(OUTPUT_PATH_VAR)?;
        let stop_ids = required(STOP_IDS_VAR)?;
        let update_interval = required(UPDATE_INTERVAL_VAR)?;

        let weather_output_path = lookup(WEATHER_OUTPUT_PATH_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_url,
            api_key,
            output_path: PathBuf::from(output_path),
            stop_ids: parse_stop_ids(&stop_ids)?,
            update_interval: parse_interval(&update_interval)?,
            weather_output_path,
        })
    }

    pub fn weather_enabled(&self) -> bool {
        self.weather_output_path.is_some()
    }
}

/// Splits a comma-separated stop list, trimming entries and dropping blanks.
pub fn parse_stop_ids(raw: &str) -> Result<Vec<String>> {
    let stop_ids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if stop_ids.is_empty() {
        return Err(CollectorError::InvalidConfigValue {
            field: STOP_IDS_VAR.to_string(),
            value: raw.to_string(),
            reason: "No stop IDs given".to_string(),
        });
    }

    Ok(stop_ids)
}

/// Parses a whole number of seconds. Zero and values above `MAX_INTERVAL_SECONDS` are rejected.
pub fn parse_interval(raw: &str) -> Result<Duration> {
    let seconds: u64 = raw
        .trim()
        .parse()
        .map_err(|e| CollectorError::InvalidConfigValue {
            field: UPDATE_INTERVAL_VAR.to_string(),
            value: raw.to_string(),
            reason: format!("Failed to parse as a whole number of seconds: {}", e),
        })?;

    validate_positive_number(UPDATE_INTERVAL_VAR, seconds)?;
    validate_range(UPDATE_INTERVAL_VAR, seconds, 1, MAX_INTERVAL_SECONDS)?;

    let interval = Duration::from_secs(seconds);
    if Instant::now().checked_add(interval).is_none() {
        return Err(CollectorError::InvalidConfigValue {
            field: UPDATE_INTERVAL_VAR.to_string(),
            value: raw.to_string(),
            reason: "Interval is too long for this platform's clock".to_string(),
        });
    }

    Ok(interval)
}

impl Validate for CollectorConfig {
    fn validate(&self) -> Result<()> {
        validate_url(API_URL_VAR, &self.api_url)?;
        validate_non_empty_string(API_KEY_VAR, &self.api_key)?;
        validate_path(OUTPUT_PATH_VAR, &self.output_path)?;

        if let Some(weather_path) = &self.weather_output_path {
            validate_path(WEATHER_OUTPUT_PATH_VAR, weather_path)?;
        }

        for stop_id in &self.stop_ids {
            validate_non_empty_string(STOP_IDS_VAR, stop_id)?;
        }

        validate_positive_number(UPDATE_INTERVAL_VAR, self.update_interval.as_secs())?;

        tracing::debug!("✅ Collector configuration validation passed");
        Ok(())
    }
}

impl fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("output_path", &self.output_path)
            .field("stop_ids", &self.stop_ids)
            .field("update_interval", &self.update_interval)
            .field("weather_output_path", &self.weather_output_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (API_URL_VAR, "https://developer.cumtd.com/api/v2.2".to_string()),
            (API_KEY_VAR, "secret-key".to_string()),
            (OUTPUT_PATH_VAR, "departures.jsonl".to_string()),
            (STOP_IDS_VAR, "IU,PAR:2".to_string()),
            (UPDATE_INTERVAL_VAR, "60".to_string()),
            (WEATHER_OUTPUT_PATH_VAR, "weather.jsonl".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<CollectorConfig> {
        CollectorConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_loads_complete_environment() {
        let config = load(&full_env()).unwrap();

        assert_eq!(config.api_url, "https://developer.cumtd.com/api/v2.2");
        assert_eq!(config.stop_ids, vec!["IU", "PAR:2"]);
        assert_eq!(config.update_interval, Duration::from_secs(60));
        assert_eq!(
            config.weather_output_path,
            Some(PathBuf::from("weather.jsonl"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_each_missing_required_variable_is_reported() {
        for name in [
            API_URL_VAR,
            API_KEY_VAR,
            OUTPUT_PATH_VAR,
            STOP_IDS_VAR,
            UPDATE_INTERVAL_VAR,
        ] {
            let mut vars = full_env();
            vars.remove(name);
            match load(&vars) {
                Err(CollectorError::MissingConfig { field }) => assert_eq!(field, name),
                other => panic!("expected MissingConfig for {}, got {:?}", name, other),
            }

            // 空字串視同未設定
            let mut vars = full_env();
            vars.insert(name, String::new());
            assert!(matches!(
                load(&vars),
                Err(CollectorError::MissingConfig { .. })
            ));
        }
    }

    #[test]
    fn test_weather_is_optional() {
        let mut vars = full_env();
        vars.remove(WEATHER_OUTPUT_PATH_VAR);
        let config = load(&vars).unwrap();
        assert!(!config.weather_enabled());

        vars.insert(WEATHER_OUTPUT_PATH_VAR, String::new());
        let config = load(&vars).unwrap();
        assert!(!config.weather_enabled());
    }

    #[test]
    fn test_parse_stop_ids() {
        assert_eq!(parse_stop_ids("5,6").unwrap(), vec!["5", "6"]);
        assert_eq!(parse_stop_ids(" 5 , ,6,").unwrap(), vec!["5", "6"]);
        assert!(parse_stop_ids(" , ").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_bad_values() {
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("-5").is_err());
        assert!(parse_interval("1.5").is_err());
        assert!(parse_interval("60s").is_err());
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn test_parse_interval_upper_bound() {
        assert_eq!(
            parse_interval(&MAX_INTERVAL_SECONDS.to_string()).unwrap(),
            Duration::from_secs(MAX_INTERVAL_SECONDS)
        );
        assert!(parse_interval(&(MAX_INTERVAL_SECONDS + 1).to_string()).is_err());
        assert!(matches!(
            parse_interval("18446744073709551615"),
            Err(CollectorError::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_invalid_url_fails_validation() {
        let mut vars = full_env();
        vars.insert(API_URL_VAR, "not a url".to_string());
        let config = load(&vars).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = load(&full_env()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    proptest! {
        #[test]
        fn prop_positive_interval_is_that_many_seconds(seconds in 1u64..=MAX_INTERVAL_SECONDS) {
            prop_assert_eq!(
                parse_interval(&seconds.to_string()).unwrap(),
                Duration::from_secs(seconds)
            );
        }

        #[test]
        fn prop_interval_above_maximum_fails(seconds in (MAX_INTERVAL_SECONDS + 1)..=u64::MAX) {
            prop_assert!(parse_interval(&seconds.to_string()).is_err());
        }

        #[test]
        fn prop_non_numeric_interval_fails(raw in "[a-zA-Z ._-]{1,12}") {
            prop_assert!(parse_interval(&raw).is_err());
        }
    }
}
