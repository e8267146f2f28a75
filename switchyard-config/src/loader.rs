// Configuration file loaders

use crate::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Detect from a path. `.env` (no stem) counts as the env format.
    pub fn detect(path: &Path) -> Option<Self> {
        if path.file_name().and_then(|name| name.to_str()) == Some(".env") {
            return Some(FileFormat::Env);
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Parses one configuration file into a JSON object.
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Pick the format from the file name
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        FileFormat::detect(path).map(Self::new).ok_or_else(|| {
            ConfigError::LoadError(format!("Unsupported config file: {}", path.display()))
        })
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.parse(&content)
    }

    /// Parse configuration from string. The top level must be a table/object.
    pub fn parse(&self, content: &str) -> Result<Value> {
        let value = match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?,
            FileFormat::Toml => parse_toml(content)?,
            FileFormat::Env => parse_env(content),
        };

        if !value.is_object() {
            return Err(ConfigError::ParseError(
                "top level of a config file must be a table".to_string(),
            ));
        }
        Ok(value)
    }
}

fn parse_toml(content: &str) -> Result<Value> {
    let toml_value: toml::Value = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    serde_json::to_value(toml_value)
        .map_err(|e| ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e)))
}

// KEY=value lines; keys are lowercased to match environment loading.
fn parse_env(content: &str) -> Value {
    let map = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_lowercase(), crate::env::coerce_value(value))
        })
        .collect();

    Value::Object(map)
}
