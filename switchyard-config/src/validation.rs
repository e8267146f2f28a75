// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable field checks
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    pub fn one_of(value: &str, allowed: &[&str], field: &str) -> Result<()> {
        if !allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value)) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be one of {}, got {:?}",
                field,
                allowed.join(", "),
                value
            )));
        }
        Ok(())
    }

    /// URL paths handed to the router must be absolute.
    pub fn url_path(value: &str, field: &str) -> Result<()> {
        if !value.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "{} must start with '/', got {:?}",
                field, value
            )));
        }
        Ok(())
    }
}
