// Typed application settings

use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigManager, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use switchyard_core::logging::{LogConfig, LogFormat, LogLevel};
use switchyard_core::static_assets::{DEFAULT_STATIC_PREFIX, StaticDir};
use switchyard_core::AppBuilder;
use tracing::info;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];
const LOG_FORMATS: &[&str] = &["json", "plain", "text", "pretty", "compact"];

/// Settings an [`AppBuilder`] understands.
///
/// ```toml
/// force_trailing_slashes = true
/// static_dir = "public"
/// static_prefix = "/static/"
/// log_level = "info"
/// log_format = "json"
/// ```
///
/// Every field has a default, so an empty source yields a usable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub force_trailing_slashes: bool,
    /// Directory served under `static_prefix`. Disabled when unset.
    pub static_dir: Option<PathBuf>,
    pub static_prefix: String,
    pub log_level: String,
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            force_trailing_slashes: true,
            static_dir: None,
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.static_prefix, "static_prefix")?;
        ConfigValidator::url_path(&self.static_prefix, "static_prefix")?;
        ConfigValidator::one_of(&self.log_level, LOG_LEVELS, "log_level")?;
        ConfigValidator::one_of(&self.log_format, LOG_FORMATS, "log_format")?;
        Ok(())
    }
}

impl AppConfig {
    /// Deserialize and validate whatever the manager has collected
    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        manager.load_validated()
    }

    /// Logging setup matching `log_level` and `log_format`
    pub fn log_config(&self) -> Result<LogConfig> {
        let level: LogLevel = self.log_level.parse()?;
        let format: LogFormat = self.log_format.parse()?;
        Ok(LogConfig::new().level(level).format(format))
    }

    /// Apply the settings to an application builder.
    ///
    /// Routes the builder already holds follow the configured trailing-slash
    /// policy. Fails when `static_dir` is set but is not a directory.
    pub fn apply(&self, builder: AppBuilder) -> Result<AppBuilder> {
        let mut builder = builder.force_trailing_slashes(self.force_trailing_slashes);

        if let Some(dir) = &self.static_dir {
            let files = StaticDir::new(dir)?.with_prefix(&self.static_prefix);
            info!(root = %dir.display(), prefix = %files.prefix(), "Serving static files");
            builder = builder.static_files(files);
        }

        Ok(builder)
    }
}
