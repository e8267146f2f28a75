// Middleware system for request/response processing

use crate::error::HandlerPanic;
use crate::logging::{error, info, trace, warn};
use crate::{Error, HttpRequest, HttpResponse};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Innermost call a chain wraps (normally the dispatcher).
pub type Next<'a> = &'a dyn Fn(&HttpRequest) -> Result<HttpResponse, Error>;

/// An interceptor around dispatch.
///
/// `process_request` runs on the way in, outer layers first.
/// `process_response` runs on the way out, inner layers first, exactly once
/// per request and whether the inner call succeeded, failed or panicked.
/// A panic below a layer reaches its `process_response` as
/// [`Error::HandlerError`] carrying a [`HandlerPanic`].
pub trait Middleware: Send + Sync {
    fn process_request(&self, _request: &mut HttpRequest) {}

    fn process_response(&self, _request: &HttpRequest, _result: &mut Result<HttpResponse, Error>) {}

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Middleware chain executor
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add a middleware to the chain. The first one added is the outermost.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.use_shared(Arc::new(middleware));
    }

    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware>) {
        let mut mws = (*self.middlewares).clone();
        mws.push(middleware);
        self.middlewares = Arc::new(mws);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run `request` through every layer with `handler` at the center.
    pub fn apply(&self, mut request: HttpRequest, handler: Next<'_>) -> Result<HttpResponse, Error> {
        trace!(
            middleware_count = self.middlewares.len(),
            path = %request.path,
            method = %request.method,
            "Executing middleware chain"
        );
        self.guarded(0, &mut request, handler)
    }

    // Runs the layers from `index` inward, turning a panic into an error so
    // the layers outside still see a result.
    fn guarded(
        &self,
        index: usize,
        request: &mut HttpRequest,
        handler: Next<'_>,
    ) -> Result<HttpResponse, Error> {
        panic::catch_unwind(AssertUnwindSafe(|| self.execute_from(index, request, handler)))
            .unwrap_or_else(|payload| {
                let cause = HandlerPanic::from_payload(payload.as_ref());
                error!(middleware_index = index, panic = %cause, "Panic inside middleware chain");
                Err(cause.into_error())
            })
    }

    fn execute_from(
        &self,
        index: usize,
        request: &mut HttpRequest,
        handler: Next<'_>,
    ) -> Result<HttpResponse, Error> {
        let Some(middleware) = self.middlewares.get(index) else {
            trace!("Middleware chain complete, calling handler");
            return handler(&*request);
        };

        trace!(middleware_index = index, middleware = middleware.name(), "Pre-processing");
        middleware.process_request(request);
        let mut result = self.guarded(index + 1, request, handler);
        trace!(middleware_index = index, middleware = middleware.name(), "Post-processing");
        middleware.process_response(&*request, &mut result);
        result
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Built-in Middleware ==========

/// Logs every request and its outcome through `tracing`.
///
/// ```
/// use switchyard_core::{MiddlewareChain, LoggingMiddleware};
///
/// let mut chain = MiddlewareChain::new();
/// chain.use_middleware(LoggingMiddleware::new());
/// ```
pub struct LoggingMiddleware {
    /// Log the request body size on the way in
    pub log_body_size: bool,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self {
            log_body_size: false,
        }
    }

    pub fn with_body_size(mut self) -> Self {
        self.log_body_size = true;
        self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LoggingMiddleware {
    fn process_request(&self, request: &mut HttpRequest) {
        if self.log_body_size {
            info!(
                method = %request.method,
                path = %request.path,
                body_bytes = request.body.len(),
                "Request received"
            );
        } else {
            info!(method = %request.method, path = %request.path, "Request received");
        }
    }

    fn process_response(&self, request: &HttpRequest, result: &mut Result<HttpResponse, Error>) {
        let duration_ms = request.received_at.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok(response) => info!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                duration_ms,
                "Response sent"
            ),
            Err(err) if err.is_server_error() => error!(
                method = %request.method,
                path = %request.path,
                error = %err,
                duration_ms,
                "Request failed"
            ),
            Err(err) => warn!(
                method = %request.method,
                path = %request.path,
                error = %err,
                duration_ms,
                "Request failed"
            ),
        }
    }
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Ensures every request carries an `x-request-id` and echoes it on the
/// response. Incoming ids are kept, missing ones become a UUID v4.
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn process_request(&self, request: &mut HttpRequest) {
        if request.header(REQUEST_ID_HEADER).is_none() {
            request.set_header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());
        }
    }

    fn process_response(&self, request: &HttpRequest, result: &mut Result<HttpResponse, Error>) {
        if let (Ok(response), Some(id)) = (result, request.header(REQUEST_ID_HEADER)) {
            response.set_header(REQUEST_ID_HEADER, id);
        }
    }
}

/// Security headers middleware
pub struct SecurityHeadersMiddleware {
    hsts_enabled: bool,
    nosniff_enabled: bool,
    frame_options: Option<String>,
}

impl SecurityHeadersMiddleware {
    pub fn new() -> Self {
        Self {
            hsts_enabled: false,
            nosniff_enabled: true,
            frame_options: Some("DENY".to_string()),
        }
    }

    pub fn with_hsts(mut self, enabled: bool) -> Self {
        self.hsts_enabled = enabled;
        self
    }

    pub fn with_frame_options(mut self, value: Option<&str>) -> Self {
        self.frame_options = value.map(str::to_string);
        self
    }
}

impl Default for SecurityHeadersMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for SecurityHeadersMiddleware {
    fn process_response(&self, _request: &HttpRequest, result: &mut Result<HttpResponse, Error>) {
        let Ok(response) = result else {
            return;
        };

        if self.hsts_enabled {
            response.set_header(
                "Strict-Transport-Security",
                "max-age=31536000; includeSubDomains",
            );
        }
        if self.nosniff_enabled {
            response.set_header("X-Content-Type-Options", "nosniff");
        }
        if let Some(frame_opts) = &self.frame_options {
            response.set_header("X-Frame-Options", frame_opts.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn process_request(&self, _request: &mut HttpRequest) {
            self.log.lock().unwrap().push(format!("{}:pre", self.label));
        }

        fn process_response(&self, _request: &HttpRequest, result: &mut Result<HttpResponse, Error>) {
            let outcome = if result.is_ok() { "ok" } else { "err" };
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:post:{}", self.label, outcome));
        }
    }

    fn chain_with(labels: &[&'static str], log: &Arc<Mutex<Vec<String>>>) -> MiddlewareChain {
        let mut chain = MiddlewareChain::new();
        for label in labels {
            chain.use_middleware(Recorder {
                label: *label,
                log: log.clone(),
            });
        }
        chain
    }

    #[test]
    fn test_nesting_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = chain_with(&["A", "B"], &log);
        let inner_log = log.clone();
        let handler = move |_: &HttpRequest| -> Result<HttpResponse, Error> {
            inner_log.lock().unwrap().push("handler".to_string());
            Ok(HttpResponse::new())
        };

        chain.apply(HttpRequest::new("GET", "/"), &handler).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["A:pre", "B:pre", "handler", "B:post:ok", "A:post:ok"]
        );
    }

    #[test]
    fn test_post_hooks_run_on_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = chain_with(&["A", "B"], &log);
        let handler =
            |req: &HttpRequest| -> Result<HttpResponse, Error> { Err(Error::RouteNotFound(req.path.clone())) };

        let result = chain.apply(HttpRequest::new("GET", "/missing/"), &handler);

        assert!(matches!(result, Err(Error::RouteNotFound(_))));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["A:pre", "B:pre", "B:post:err", "A:post:err"]
        );
    }

    struct PanicsOnRequest;

    impl Middleware for PanicsOnRequest {
        fn process_request(&self, _request: &mut HttpRequest) {
            panic!("pre-hook exploded");
        }

        fn process_response(&self, _request: &HttpRequest, _result: &mut Result<HttpResponse, Error>) {
            unreachable!("post hook of a layer whose pre hook panicked");
        }
    }

    #[test]
    fn test_post_hooks_run_when_inner_pre_hook_panics() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = chain_with(&["A"], &log);
        chain.use_middleware(PanicsOnRequest);
        let handler = |_: &HttpRequest| -> Result<HttpResponse, Error> { Ok(HttpResponse::new()) };

        let result = chain.apply(HttpRequest::new("GET", "/"), &handler);

        match result {
            Err(Error::HandlerError(cause)) => assert_eq!(cause.to_string(), "pre-hook exploded"),
            other => panic!("expected HandlerError, got {:?}", other.map(|r| r.status)),
        }
        assert_eq!(*log.lock().unwrap(), vec!["A:pre", "A:post:err"]);
    }

    #[test]
    fn test_post_hooks_run_when_center_panics() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = chain_with(&["A", "B"], &log);
        let handler = |_: &HttpRequest| -> Result<HttpResponse, Error> { panic!("center exploded") };

        let result = chain.apply(HttpRequest::new("GET", "/"), &handler);

        assert!(matches!(result, Err(Error::HandlerError(_))));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["A:pre", "B:pre", "B:post:err", "A:post:err"]
        );
    }

    #[test]
    fn test_empty_chain_calls_handler() {
        let chain = MiddlewareChain::new();
        let handler = |_: &HttpRequest| -> Result<HttpResponse, Error> {
            let mut resp = HttpResponse::new();
            resp.set_text("direct");
            Ok(resp)
        };
        let resp = chain.apply(HttpRequest::new("GET", "/"), &handler).unwrap();
        assert_eq!(resp.text(), "direct");
    }

    #[test]
    fn test_request_id_generated_and_echoed() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(RequestIdMiddleware);
        let handler = |req: &HttpRequest| -> Result<HttpResponse, Error> {
            assert!(req.header(REQUEST_ID_HEADER).is_some());
            Ok(HttpResponse::new())
        };

        let resp = chain.apply(HttpRequest::new("GET", "/"), &handler).unwrap();
        let id = resp.header(REQUEST_ID_HEADER).unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_request_id_preserved() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(RequestIdMiddleware);
        let handler = |_: &HttpRequest| -> Result<HttpResponse, Error> { Ok(HttpResponse::new()) };
        let req = HttpRequest::new("GET", "/").with_header("X-Request-Id", "abc-123");

        let resp = chain.apply(req, &handler).unwrap();
        assert_eq!(resp.header(REQUEST_ID_HEADER), Some("abc-123"));
    }

    #[test]
    fn test_security_headers() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(SecurityHeadersMiddleware::new().with_hsts(true));
        let handler = |_: &HttpRequest| -> Result<HttpResponse, Error> { Ok(HttpResponse::new()) };

        let resp = chain.apply(HttpRequest::new("GET", "/"), &handler).unwrap();
        assert_eq!(resp.header("X-Content-Type-Options"), Some("nosniff"));
        assert_eq!(resp.header("X-Frame-Options"), Some("DENY"));
        assert!(resp.header("Strict-Transport-Security").is_some());
    }
}
