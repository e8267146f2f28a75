// Template rendering seam

use crate::BoxError;
use serde_json::Value;

/// A template renderer the application can delegate to.
pub trait TemplateEngine: Send + Sync {
    /// Render template `name` with `context` into response-ready bytes.
    fn render(&self, name: &str, context: &Value) -> Result<Vec<u8>, BoxError>;

    fn has_template(&self, name: &str) -> bool;
}
