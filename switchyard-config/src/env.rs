// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::env;

pub const DEFAULT_PREFIX: &str = "SWITCHYARD";

/// Reads environment variables, optionally restricted to `PREFIX_*`.
///
/// Keys are returned lowercased with the prefix and separator removed, so
/// `SWITCHYARD_LOG_LEVEL` becomes `log_level`.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables
    pub fn load(&self) -> HashMap<String, String> {
        env::vars()
            .filter_map(|(key, value)| match &self.prefix {
                Some(prefix) => key
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix('_'))
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_lowercase(), value)),
                None => Some((key.to_lowercase(), value)),
            })
            .collect()
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}

/// Interpret a raw environment string: booleans and integers become typed
/// JSON values, everything else stays a string.
pub fn coerce_value(raw: &str) -> Value {
    match raw.trim() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        trimmed => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::new(Some("SWITCHYARD_TEST".to_string()));
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("true"), Value::Bool(true));
        assert_eq!(coerce_value("false"), Value::Bool(false));
        assert_eq!(coerce_value("8080"), Value::from(8080));
        assert_eq!(coerce_value("/static/"), Value::String("/static/".into()));
        assert_eq!(coerce_value("True"), Value::String("True".into()));
    }
}
