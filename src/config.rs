use std::time::Duration;

use thiserror::Error;

use crate::data::filter::DEFAULT_RESULT_LIMIT;
use crate::data::loader::{DatasetFormat, DatasetSource};

// ---------------------------------------------------------------------------
// Environment-driven settings
// ---------------------------------------------------------------------------

pub const ENV_DATASET_URI: &str = "APARTMENTS_DATASET_URI";
pub const ENV_DATASET_FORMAT: &str = "APARTMENTS_DATASET_FORMAT";
pub const ENV_MAX_ENTRIES: &str = "APARTMENTS_MAX_ENTRIES";
pub const ENV_WEB_HOSTNAME: &str = "APARTMENTS_WEB_HOSTNAME";
pub const ENV_OFFICE_NAME: &str = "APARTMENTS_MAP_OFFICE_NAME";
pub const ENV_CACHE_TTL_SECS: &str = "APARTMENTS_CACHE_TTL_SECS";

const DEFAULT_HOSTNAME: &str = "localhost:8501";
const DEFAULT_OFFICE_NAME: &str = "the Office";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("The path to the apartments dataset is not set. Please set the 'APARTMENTS_DATASET_URI' environment variable.")]
    MissingDatasetUri,
    #[error("Invalid apartments data format '{0}'. Valid are 'parquet' or 'csv'.")]
    UnsupportedFormat(String),
    #[error("The environment variable '{var}' should be a number, but is '{value}'.")]
    NotANumber { var: &'static str, value: String },
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub dataset: DatasetSource,
    /// Cap on the number of listings shown at once.
    pub max_entries: usize,
    /// Host used when building shareable filter links.
    pub web_hostname: String,
    /// Label for the office marker and travel-time captions.
    pub office_name: String,
    /// `None` keeps the loaded dataset until restart or manual reload.
    pub cache_ttl: Option<Duration>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup(ENV_DATASET_URI)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingDatasetUri)?;

        let format = parse_format(
            &lookup(ENV_DATASET_FORMAT).unwrap_or_else(|| "parquet".to_string()),
        )?;

        let max_entries = match lookup(ENV_MAX_ENTRIES) {
            Some(raw) => parse_digits(ENV_MAX_ENTRIES, &raw)? as usize,
            None => DEFAULT_RESULT_LIMIT,
        };

        let cache_ttl = lookup(ENV_CACHE_TTL_SECS)
            .map(|raw| parse_digits(ENV_CACHE_TTL_SECS, &raw).map(Duration::from_secs))
            .transpose()?;

        Ok(Settings {
            dataset: DatasetSource { uri, format },
            max_entries,
            web_hostname: lookup(ENV_WEB_HOSTNAME).unwrap_or_else(|| DEFAULT_HOSTNAME.to_string()),
            office_name: lookup(ENV_OFFICE_NAME).unwrap_or_else(|| DEFAULT_OFFICE_NAME.to_string()),
            cache_ttl,
        })
    }
}

fn parse_format(raw: &str) -> Result<DatasetFormat, ConfigError> {
    match raw {
        "parquet" => Ok(DatasetFormat::Parquet),
        "csv" => Ok(DatasetFormat::Csv),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Only plain ASCII digits are accepted (no sign, no whitespace).
fn parse_digits(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let not_a_number = || ConfigError::NotANumber {
        var,
        value: raw.to_string(),
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_a_number());
    }
    raw.parse::<u64>().map_err(|_| not_a_number())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_uri_is_set() {
        let s = settings(&[(ENV_DATASET_URI, "data/apartments.parquet")]).unwrap();
        assert_eq!(s.dataset.uri, "data/apartments.parquet");
        assert_eq!(s.dataset.format, DatasetFormat::Parquet);
        assert_eq!(s.max_entries, 500);
        assert_eq!(s.web_hostname, "localhost:8501");
        assert_eq!(s.office_name, "the Office");
        assert_eq!(s.cache_ttl, None);
    }

    #[test]
    fn missing_uri_is_fatal() {
        assert_eq!(settings(&[]).unwrap_err(), ConfigError::MissingDatasetUri);
        assert_eq!(
            settings(&[(ENV_DATASET_URI, "  ")]).unwrap_err(),
            ConfigError::MissingDatasetUri
        );
    }

    #[test]
    fn unsupported_format_is_fatal() {
        let err = settings(&[(ENV_DATASET_URI, "x"), (ENV_DATASET_FORMAT, "xlsx")]).unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedFormat("xlsx".into()));
        assert!(err.to_string().contains("'parquet' or 'csv'"));
    }

    #[test]
    fn non_numeric_cap_is_fatal() {
        for bad in ["abc", "-5", "1.5", " 10", ""] {
            let err = settings(&[(ENV_DATASET_URI, "x"), (ENV_MAX_ENTRIES, bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::NotANumber { var: ENV_MAX_ENTRIES, .. }), "{bad}");
        }
    }

    #[test]
    fn reads_all_overrides() {
        let s = settings(&[
            (ENV_DATASET_URI, "s3://bucket/apartments.csv"),
            (ENV_DATASET_FORMAT, "csv"),
            (ENV_MAX_ENTRIES, "120"),
            (ENV_WEB_HOSTNAME, "https://apartments.example"),
            (ENV_OFFICE_NAME, "HQ"),
            (ENV_CACHE_TTL_SECS, "3600"),
        ])
        .unwrap();
        assert_eq!(s.dataset.format, DatasetFormat::Csv);
        assert_eq!(s.max_entries, 120);
        assert_eq!(s.web_hostname, "https://apartments.example");
        assert_eq!(s.office_name, "HQ");
        assert_eq!(s.cache_ttl, Some(Duration::from_secs(3600)));
    }
}
