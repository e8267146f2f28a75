// Core library for the Switchyard routing layer
// Path patterns, routes, the router, middleware and the dispatcher

pub mod application;
pub mod dispatcher;
pub mod error;
pub mod error_handler;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod route;
pub mod route_registry;
pub mod router;
pub mod static_assets;
pub mod status;
pub mod templates;

// Re-export commonly used types
pub use application::*;
pub use dispatcher::*;
pub use error::*;
pub use error_handler::*;
pub use http::*;
pub use middleware::*;
pub use pattern::*;
pub use route::*;
pub use router::{ResolvedRoute, Router, RouterBuilder, normalize};
pub use static_assets::*;
pub use status::*;
pub use templates::*;

// Used by `register_route!`
pub use inventory;
