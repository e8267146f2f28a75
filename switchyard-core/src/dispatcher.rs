// Resolution, method selection, invocation and error conversion

use crate::error::HandlerPanic;
use crate::logging::{debug, error, warn};
use crate::{Error, ErrorHandlers, HttpRequest, HttpResponse, Router};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Runs exactly one handler per request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    error_handlers: ErrorHandlers,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, error_handlers: ErrorHandlers) -> Self {
        Self {
            router,
            error_handlers,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Resolve, select the handler for the request method and invoke it.
    ///
    /// Returns [`Error::RouteNotFound`], [`Error::MethodNotAllowed`] or
    /// [`Error::HandlerError`] without converting them to responses.
    pub fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let resolved = self
            .router
            .resolve(&request.path)
            .ok_or_else(|| Error::RouteNotFound(request.path.clone()))?;
        let handler = resolved.route.get_handler(&request.method)?;

        debug!(
            method = %request.method,
            path = %request.path,
            pattern = %resolved.route.pattern,
            "Invoking handler"
        );

        let mut response = HttpResponse::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler(request, &mut response, &resolved.params)
        }));

        match outcome {
            Ok(Ok(())) => Ok(response),
            Ok(Err(cause)) => {
                warn!(path = %request.path, error = %cause, "Handler returned an error");
                Err(Error::HandlerError(cause))
            }
            Err(payload) => {
                let cause = HandlerPanic::from_payload(payload.as_ref());
                error!(path = %request.path, panic = %cause, "Handler panicked");
                Err(cause.into_error())
            }
        }
    }

    /// Like [`Dispatcher::dispatch`], but converts errors through the
    /// configured error handlers. Errors without a handler are returned.
    pub fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.dispatch(request).or_else(|err| self.convert(request, err))
    }

    fn convert(&self, request: &HttpRequest, err: Error) -> Result<HttpResponse, Error> {
        let Some(handler) = self.error_handlers.for_error(&err) else {
            debug!(error = %err, "No error handler configured, propagating");
            return Err(err);
        };
        let mut response = HttpResponse::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler(request, &mut response, &err)
        }));

        match outcome {
            Ok(()) => Ok(response),
            Err(payload) => {
                let cause = HandlerPanic::from_payload(payload.as_ref());
                error!(
                    path = %request.path,
                    error = %err,
                    panic = %cause,
                    "Error handler panicked"
                );
                Err(cause.into_error())
            }
        }
    }
}
