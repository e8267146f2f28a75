//! Configuration management for Switchyard applications
//!
//! Values are collected into a [`ConfigManager`] from TOML/JSON/.env files
//! and `SWITCHYARD_*` environment variables, later sources overriding
//! earlier ones. [`AppConfig`] is the typed view the application builder
//! understands.

pub mod app_config;
pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use app_config::AppConfig;
pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Main configuration manager
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: Some(prefix.into()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Value>>> {
        self.config.read().map_err(|_| ConfigError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Value>>> {
        self.config.write().map_err(|_| ConfigError::Poisoned)
    }

    /// Load configuration from environment variables.
    ///
    /// `true`/`false` and integers are stored typed so they deserialize into
    /// `bool` and numeric fields.
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let env_vars = loader.load();
        debug!(count = env_vars.len(), prefix = ?self.env_prefix, "Loaded environment configuration");

        let mut config = self.write()?;
        for (key, value) in env_vars {
            config.insert(key, env::coerce_value(&value));
        }

        Ok(())
    }

    /// Load a .env file into the process environment, then read it back
    /// through [`load_env`](Self::load_env). A missing default `.env` is ignored.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        self.load_env()
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::new(format).load_file(path)?;
        self.merge_value(data)?;
        debug!(path = %path.display(), ?format, "Loaded configuration file");
        Ok(())
    }

    /// Load a file, choosing the format from its name
    pub fn load_file_auto(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ConfigLoader::auto(path)?.format();
        self.load_file(path, format)
    }

    fn merge_value(&self, data: Value) -> Result<()> {
        let mut config = self.write()?;
        if let Value::Object(map) = data {
            config.extend(map);
        }
        Ok(())
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.write()?.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .read()?
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.read().map(|config| config.contains_key(key)).unwrap_or(false)
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .read()
            .map(|config| config.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Deserialize everything collected so far into `T` and validate it
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let json_value = Value::Object(
            self.read()?
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let validated: T = serde_json::from_value(json_value)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        validated.validate()?;

        Ok(validated)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
