//! Errors raised while loading or rendering templates

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandlebarsError>;

#[derive(Error, Debug)]
pub enum HandlebarsError {
    #[error("Template directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// The template source did not compile. `name` is the registry name.
    #[error("Failed to parse template {name}: {reason}")]
    Parse { name: String, reason: String },

    /// Rendering failed, e.g. a missing variable in strict mode.
    #[error("Failed to render template {name}: {reason}")]
    Render { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template registry is unavailable: a writer panicked")]
    Poisoned,
}

impl HandlebarsError {
    pub(crate) fn parse(name: &str, err: handlebars::TemplateError) -> Self {
        HandlebarsError::Parse {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn render(name: &str, err: handlebars::RenderError) -> Self {
        HandlebarsError::Render {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}
