// Application: static files, middleware and dispatch behind one entry point

use crate::logging::{debug, info};
use crate::{
    Dispatcher, Error, ErrorHandlers, Handler, HandlerResult, HttpMethod,
    HttpRequest, HttpResponse, MethodTable, Middleware, MiddlewareChain, PathParams, Router,
    RouterBuilder, StaticFiles, TemplateEngine,
};
use serde_json::Value;
use std::sync::Arc;

/// A built application. Immutable and shareable across threads.
///
/// ```
/// use switchyard_core::{App, HttpRequest};
///
/// let app = App::builder()
///     .route("/hello/{name}/", |_req, resp, params| {
///         resp.set_text(format!("Hello {}!", params.str("name").unwrap_or_default()));
///         Ok(())
///     })
///     .build()
///     .unwrap();
///
/// let resp = app.handle_request(HttpRequest::new("GET", "/hello/sample-name/")).unwrap();
/// assert_eq!(resp.text(), "Hello sample-name!");
/// ```
pub struct App {
    dispatcher: Dispatcher,
    middleware: MiddlewareChain,
    templates: Option<Arc<dyn TemplateEngine>>,
    static_files: Option<Arc<dyn StaticFiles>>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Entry point for the host request loop.
    ///
    /// Static files are tried first and bypass middleware. Everything else
    /// goes through the middleware chain into the dispatcher. Errors with no
    /// configured handler are returned.
    pub fn handle_request(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        if let Some(response) = self
            .static_files
            .as_ref()
            .and_then(|files| files.serve(&request))
        {
            return Ok(response);
        }

        let dispatch = |req: &HttpRequest| self.dispatcher.handle(req);
        self.middleware.apply(request, &dispatch)
    }

    /// True if some route matches `path`.
    pub fn has_route(&self, path: &str) -> bool {
        self.dispatcher.router().has_route(path)
    }

    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    /// Render a template through the configured engine.
    pub fn template(&self, name: &str, context: &Value) -> Result<Vec<u8>, Error> {
        let engine = self
            .templates
            .as_ref()
            .ok_or_else(|| Error::Template("no template engine configured".to_string()))?;
        engine
            .render(name, context)
            .map_err(|err| Error::Template(format!("{name}: {err}")))
    }

    /// Render a template straight into `response` as HTML.
    pub fn render_into(
        &self,
        response: &mut HttpResponse,
        name: &str,
        context: &Value,
    ) -> Result<(), Error> {
        response.body = self.template(name, context)?;
        response.set_content_type(crate::http::DEFAULT_CONTENT_TYPE);
        Ok(())
    }
}

/// Collects routes, middleware and collaborators, then builds an [`App`].
///
/// Registration methods chain. The first registration error is kept and
/// returned from [`AppBuilder::build`].
pub struct AppBuilder {
    router: RouterBuilder,
    middleware: MiddlewareChain,
    error_handlers: ErrorHandlers,
    templates: Option<Arc<dyn TemplateEngine>>,
    static_files: Option<Arc<dyn StaticFiles>>,
    setup_error: Option<Error>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            router: RouterBuilder::new(),
            middleware: MiddlewareChain::new(),
            error_handlers: ErrorHandlers::default(),
            templates: None,
            static_files: None,
            setup_error: None,
        }
    }

    fn record(mut self, result: Result<(), Error>) -> Self {
        if let Err(err) = result {
            if self.setup_error.is_none() {
                self.setup_error = Some(err);
            }
        }
        self
    }

    /// Enabled by default. Routes added earlier are normalized again, and a
    /// resulting clash is reported by [`AppBuilder::build`].
    pub fn force_trailing_slashes(mut self, enabled: bool) -> Self {
        let result = self.router.set_force_trailing_slashes(enabled);
        self.record(result)
    }

    pub fn add_route(mut self, pattern: &str, handler: impl Into<Handler>) -> Self {
        let result = self.router.add_route(pattern, handler);
        self.record(result)
    }

    /// Function handler answering GET, HEAD and OPTIONS.
    pub fn route<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(pattern, Handler::function(handler))
    }

    pub fn route_with_methods<F, I>(self, pattern: &str, methods: I, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
        I: IntoIterator<Item = HttpMethod>,
    {
        self.add_route(pattern, Handler::with_methods(handler, methods))
    }

    pub fn view(self, pattern: &str, table: MethodTable) -> Self {
        self.add_route(pattern, table)
    }

    /// Add every route registered for group `G` with `register_route!`.
    pub fn mount<G: 'static>(mut self) -> Self {
        let result = self.router.mount::<G>().map(|_| ());
        self.record(result)
    }

    /// True if `path` matches a route added so far.
    pub fn has_route(&self, path: &str) -> bool {
        self.router.has_route(path)
    }

    /// Wrap dispatch in `middleware`. The first one added is the outermost.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.use_middleware(middleware);
        self
    }

    pub fn not_found_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &Error) + Send + Sync + 'static,
    {
        self.error_handlers.not_found = Some(Arc::new(handler));
        self
    }

    pub fn method_not_allowed_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &Error) + Send + Sync + 'static,
    {
        self.error_handlers.method_not_allowed = Some(Arc::new(handler));
        self
    }

    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &Error) + Send + Sync + 'static,
    {
        self.error_handlers.handler_error = Some(Arc::new(handler));
        self
    }

    /// Let `RouteNotFound` reach the caller.
    pub fn without_not_found_handler(mut self) -> Self {
        self.error_handlers.not_found = None;
        self
    }

    /// Let `MethodNotAllowed` reach the caller.
    pub fn without_method_not_allowed_handler(mut self) -> Self {
        self.error_handlers.method_not_allowed = None;
        self
    }

    /// Let `HandlerError` reach the caller.
    pub fn without_error_handler(mut self) -> Self {
        self.error_handlers.handler_error = None;
        self
    }

    pub fn error_handlers(mut self, handlers: ErrorHandlers) -> Self {
        self.error_handlers = handlers;
        self
    }

    pub fn template_engine<T: TemplateEngine + 'static>(mut self, engine: T) -> Self {
        self.templates = Some(Arc::new(engine));
        self
    }

    pub fn static_files<S: StaticFiles + 'static>(mut self, files: S) -> Self {
        self.static_files = Some(Arc::new(files));
        self
    }

    /// Freeze the routes. Fails with the first registration error.
    pub fn build(self) -> Result<App, Error> {
        if let Some(err) = self.setup_error {
            return Err(err);
        }

        let router = self.router.build();
        info!(
            routes = router.len(),
            middleware = self.middleware.len(),
            templates = self.templates.is_some(),
            static_files = self.static_files.is_some(),
            "Application built"
        );
        debug!(error_handlers = ?self.error_handlers, "Error handler configuration");

        Ok(App {
            dispatcher: Dispatcher::new(Arc::new(router), self.error_handlers),
            middleware: self.middleware,
            templates: self.templates,
            static_files: self.static_files,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxError;

    struct Upper;

    impl TemplateEngine for Upper {
        fn render(&self, name: &str, context: &Value) -> Result<Vec<u8>, BoxError> {
            match name {
                "greet" => Ok(format!("HELLO {}", context["name"].as_str().unwrap_or("?")).into_bytes()),
                _ => Err(format!("template {name} not found").into()),
            }
        }

        fn has_template(&self, name: &str) -> bool {
            name == "greet"
        }
    }

    struct Fixed;

    impl StaticFiles for Fixed {
        fn serve(&self, request: &HttpRequest) -> Option<HttpResponse> {
            (request.path == "/static/app.css").then(|| {
                let mut resp = HttpResponse::new();
                resp.set_text("css");
                resp
            })
        }
    }

    #[test]
    fn test_build_reports_first_setup_error() {
        let result = App::builder()
            .route("/a/", |_, _, _| Ok(()))
            .route("/a", |_, _, _| Ok(()))
            .route("/{x}/{x}/", |_, _, _| Ok(()))
            .build();
        assert!(matches!(result, Err(Error::DuplicateRoute(_))));
    }

    #[test]
    fn test_trailing_slash_policy_applies_to_earlier_routes() {
        let app = App::builder()
            .force_trailing_slashes(false)
            .route("/y", |_, resp, _| {
                resp.set_text("y");
                Ok(())
            })
            .force_trailing_slashes(true)
            .build()
            .unwrap();

        assert!(app.has_route("/y"));
        assert_eq!(app.handle_request(HttpRequest::new("GET", "/y")).unwrap().text(), "y");
        assert_eq!(app.handle_request(HttpRequest::new("GET", "/y/")).unwrap().text(), "y");

        let app = App::builder()
            .route("/x", |_, _, _| Ok(()))
            .force_trailing_slashes(false)
            .build()
            .unwrap();
        assert_eq!(app.handle_request(HttpRequest::new("GET", "/x")).unwrap().status, 200);
        assert_eq!(app.handle_request(HttpRequest::new("GET", "/x/")).unwrap().status, 404);
    }

    #[test]
    fn test_trailing_slash_clash_surfaces_from_build() {
        let result = App::builder()
            .force_trailing_slashes(false)
            .route("/a", |_, _, _| Ok(()))
            .route("/a/", |_, _, _| Ok(()))
            .force_trailing_slashes(true)
            .build();
        assert!(matches!(result, Err(Error::DuplicateRoute(_))));
    }

    #[test]
    fn test_has_route() {
        let builder = App::builder().route("/text/", |_, _, _| Ok(()));
        assert!(builder.has_route("/text"));
        let app = builder.build().unwrap();
        assert!(app.has_route("/text/"));
        assert!(!app.has_route("/other/"));
    }

    #[test]
    fn test_static_files_served_before_routes() {
        let app = App::builder()
            .route("/static/{file}/", |_, resp, _| {
                resp.set_text("routed");
                Ok(())
            })
            .static_files(Fixed)
            .build()
            .unwrap();

        let resp = app.handle_request(HttpRequest::new("GET", "/static/app.css")).unwrap();
        assert_eq!(resp.text(), "css");
        let resp = app.handle_request(HttpRequest::new("GET", "/static/other.css")).unwrap();
        assert_eq!(resp.text(), "routed");
    }

    #[test]
    fn test_templates() {
        let app = App::builder().template_engine(Upper).build().unwrap();
        let html = app
            .template("greet", &serde_json::json!({"name": "ada"}))
            .unwrap();
        assert_eq!(html, b"HELLO ada");
        assert!(matches!(
            app.template("missing", &Value::Null),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_template_without_engine() {
        let app = App::builder().build().unwrap();
        assert!(matches!(
            app.template("greet", &Value::Null),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_disabled_handler_propagates() {
        let app = App::builder()
            .without_not_found_handler()
            .build()
            .unwrap();
        assert!(matches!(
            app.handle_request(HttpRequest::new("GET", "/x/")),
            Err(Error::RouteNotFound(_))
        ));
    }
}
