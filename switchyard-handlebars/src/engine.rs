//! Handlebars template engine wrapper

use crate::{Result, config::HandlebarsConfig, error::HandlebarsError, helpers};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use switchyard_core::{BoxError, TemplateEngine};
use tracing::debug;

/// Templates loaded from a directory tree.
///
/// A file `pages/about.hbs` under the template directory is registered as
/// `pages/about`. Clones share the same registry.
#[derive(Clone)]
pub struct HandlebarsEngine {
    handlebars: Arc<RwLock<Handlebars<'static>>>,
    config: HandlebarsConfig,
}

impl HandlebarsEngine {
    /// Fails when the template directory is missing or a template does not parse.
    pub fn new(config: HandlebarsConfig) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(config.strict_mode);
        if !config.escape_html {
            handlebars.register_escape_fn(handlebars::no_escape);
        }
        helpers::register_builtin_helpers(&mut handlebars);

        let engine = Self {
            handlebars: Arc::new(RwLock::new(handlebars)),
            config,
        };
        engine.load_templates()?;
        Ok(engine)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Handlebars<'static>>> {
        self.handlebars.read().map_err(|_| HandlebarsError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Handlebars<'static>>> {
        self.handlebars.write().map_err(|_| HandlebarsError::Poisoned)
    }

    fn load_templates(&self) -> Result<()> {
        let root = &self.config.template_dir;
        if !root.is_dir() {
            return Err(HandlebarsError::MissingDirectory(root.clone()));
        }

        let mut handlebars = self.write()?;
        let count = self.load_dir(&mut handlebars, root, root, false)?;

        if let Some(partials_dir) = &self.config.partials_dir {
            if partials_dir.is_dir() {
                self.load_dir(&mut handlebars, partials_dir, partials_dir, true)?;
            }
        }

        debug!(dir = %root.display(), count, "Loaded templates");
        Ok(())
    }

    fn load_dir(
        &self,
        handlebars: &mut Handlebars<'static>,
        root: &Path,
        dir: &Path,
        partials: bool,
    ) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                count += self.load_dir(handlebars, root, &path, partials)?;
                continue;
            }
            if !self.config.is_template(&path) {
                continue;
            }

            let name = self.config.template_name(root, &path);
            let content = fs::read_to_string(&path)?;
            let registered = if partials {
                handlebars.register_partial(&name, content)
            } else {
                handlebars.register_template_string(&name, content)
            };
            registered.map_err(|err| HandlebarsError::parse(&name, err))?;
            count += 1;
        }
        Ok(count)
    }

    /// Render a registered template. In dev mode templates are re-read first.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        if self.config.dev_mode {
            self.reload_templates()?;
        }

        let handlebars = self.read()?;
        if !handlebars.has_template(template) {
            return Err(HandlebarsError::TemplateNotFound(template.to_string()));
        }
        handlebars
            .render(template, data)
            .map_err(|err| HandlebarsError::render(template, err))
    }

    /// Render a template string (not from file)
    pub fn render_template<T: Serialize>(&self, template_str: &str, data: &T) -> Result<String> {
        self.read()?
            .render_template(template_str, data)
            .map_err(|err| HandlebarsError::render("<inline>", err))
    }

    pub fn register_template(&self, name: &str, template: &str) -> Result<()> {
        self.write()?
            .register_template_string(name, template)
            .map_err(|err| HandlebarsError::parse(name, err))
    }

    pub fn register_partial(&self, name: &str, template: &str) -> Result<()> {
        self.write()?
            .register_partial(name, template)
            .map_err(|err| HandlebarsError::parse(name, err))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.read()
            .map(|handlebars| handlebars.has_template(name))
            .unwrap_or(false)
    }

    /// Registered template names, sorted
    pub fn get_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .map(|handlebars| handlebars.get_templates().keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Drop every template and load the directory again. Templates
    /// registered from strings are lost.
    pub fn reload_templates(&self) -> Result<()> {
        self.write()?.clear_templates();
        self.load_templates()
    }

    pub fn config(&self) -> &HandlebarsConfig {
        &self.config
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(&self, name: &str, context: &Value) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(HandlebarsEngine::render(self, name, context)?.into_bytes())
    }

    fn has_template(&self, name: &str) -> bool {
        HandlebarsEngine::has_template(self, name)
    }
}
