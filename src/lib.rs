// Switchyard - a small synchronous HTTP routing and dispatch layer
//
// Typed path patterns, per-method handlers, middleware and JSON error pages.
// The transport is left to the host: hand `App::handle_request` a request,
// get a response back.

// Re-export core functionality
pub use switchyard_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use switchyard_config;

#[cfg(feature = "testing")]
pub use switchyard_testing;

#[cfg(feature = "handlebars")]
pub use switchyard_handlebars;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        App, AppBuilder, Error, Handler, HandlerResult, HttpMethod, HttpRequest, HttpResponse,
        HttpStatus, LoggingMiddleware, MethodTable, Middleware, PathParams, RequestIdMiddleware,
        SecurityHeadersMiddleware, StaticDir, TemplateEngine, error_page, register_route,
    };
}
