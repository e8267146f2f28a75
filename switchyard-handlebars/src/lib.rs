//! Handlebars templates for Switchyard applications
//!
//! [`HandlebarsEngine`] loads every `*.hbs` file under a directory and
//! implements [`switchyard_core::TemplateEngine`], so it can be handed to
//! `AppBuilder::template_engine`.
//!
//! ```no_run
//! use switchyard_core::App;
//! use switchyard_handlebars::{HandlebarsConfig, HandlebarsEngine};
//!
//! let engine = HandlebarsEngine::new(HandlebarsConfig::new("templates").with_dev_mode(true))?;
//! let app = App::builder()
//!     .template_engine(engine)
//!     .build()?;
//!
//! let html = app.template("index", &serde_json::json!({"name": "World"}))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Built-in helpers: `eq`, `ne`, `upper`, `lower`, `len`, `json`.

pub mod config;
pub mod engine;
pub mod error;
pub mod helpers;

pub use config::HandlebarsConfig;
pub use engine::HandlebarsEngine;
pub use error::{HandlebarsError, Result};
