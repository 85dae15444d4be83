use thiserror::Error;

pub const TABLE_NAME_ENV: &str = "DYNAMODB_TABLE";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("DYNAMODB_TABLE must be configured")]
    MissingTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdersConfig {
    pub table_name: String,
    pub log_level: String,
}

impl OrdersConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. The table name is
    /// required; the log level falls back to `info`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let table_name = lookup(TABLE_NAME_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingTable)?;

        let log_level = lookup(LOG_LEVEL_ENV)
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            table_name,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn table_name_is_required() {
        let error = OrdersConfig::from_lookup(lookup(&[])).expect_err("missing table");
        assert_eq!(error, ConfigError::MissingTable);
        assert_eq!(error.to_string(), "DYNAMODB_TABLE must be configured");

        let blank = OrdersConfig::from_lookup(lookup(&[(TABLE_NAME_ENV, "  ")]));
        assert_eq!(blank, Err(ConfigError::MissingTable));
    }

    #[test]
    fn log_level_defaults_to_info() {
        let config =
            OrdersConfig::from_lookup(lookup(&[(TABLE_NAME_ENV, "orders")])).expect("config");
        assert_eq!(
            config,
            OrdersConfig {
                table_name: "orders".to_string(),
                log_level: "info".to_string(),
            }
        );
    }

    #[test]
    fn log_level_is_normalized() {
        let config = OrdersConfig::from_lookup(lookup(&[
            (TABLE_NAME_ENV, "orders"),
            (LOG_LEVEL_ENV, "DEBUG"),
        ]))
        .expect("config");
        assert_eq!(config.log_level, "debug");
    }
}
