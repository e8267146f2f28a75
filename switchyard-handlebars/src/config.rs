//! Where templates are loaded from and how they compile

use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "hbs";

/// Settings for [`HandlebarsEngine`](crate::HandlebarsEngine).
///
/// A file `pages/about.hbs` under `template_dir` is registered as
/// `pages/about`. Files in `partials_dir` are named the same way and become
/// partials.
#[derive(Debug, Clone)]
pub struct HandlebarsConfig {
    pub template_dir: PathBuf,
    pub partials_dir: Option<PathBuf>,
    /// File extension, stored without the leading dot
    pub extension: String,
    /// Re-read the directory before every render
    pub dev_mode: bool,
    /// Missing variables fail the render instead of rendering empty
    pub strict_mode: bool,
    pub escape_html: bool,
}

impl HandlebarsConfig {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            partials_dir: None,
            extension: DEFAULT_EXTENSION.to_string(),
            dev_mode: false,
            strict_mode: false,
            escape_html: true,
        }
    }

    /// `"html"` and `".html"` are equivalent.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn with_partials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.partials_dir = Some(dir.into());
        self
    }

    pub fn with_dev_mode(mut self, enable: bool) -> Self {
        self.dev_mode = enable;
        self
    }

    pub fn with_strict_mode(mut self, enable: bool) -> Self {
        self.strict_mode = enable;
        self
    }

    pub fn with_escape_html(mut self, enable: bool) -> Self {
        self.escape_html = enable;
        self
    }

    /// True for files the engine loads.
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Registry name of `path`: relative to `root`, extension dropped,
    /// `/`-separated on every platform.
    pub fn template_name(&self, root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
        relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HandlebarsConfig::new("views");
        assert_eq!(config.template_dir, PathBuf::from("views"));
        assert_eq!(config.extension, "hbs");
        assert!(config.escape_html);
        assert!(!config.dev_mode);
        assert!(config.partials_dir.is_none());
    }

    #[test]
    fn test_extension_accepts_leading_dot() {
        let config = HandlebarsConfig::new("views").with_extension(".html");
        assert_eq!(config.extension, "html");
        assert!(config.is_template(Path::new("views/index.html")));
        assert!(config.is_template(Path::new("views/INDEX.HTML")));
        assert!(!config.is_template(Path::new("views/index.hbs")));
        assert!(!config.is_template(Path::new("views/README")));
    }

    #[test]
    fn test_template_names() {
        let config = HandlebarsConfig::new("views");
        let root = Path::new("views");
        assert_eq!(config.template_name(root, Path::new("views/home.hbs")), "home");
        assert_eq!(
            config.template_name(root, &root.join("pages").join("about.hbs")),
            "pages/about"
        );
    }
}
