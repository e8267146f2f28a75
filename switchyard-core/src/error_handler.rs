// Error-to-response conversion

use crate::{Error, HttpRequest, HttpResponse, HttpStatus};
use std::fmt;
use std::sync::Arc;

/// Turns a per-request error into a response. Receives a fresh response.
pub type ErrorHandlerFn = Arc<dyn Fn(&HttpRequest, &mut HttpResponse, &Error) + Send + Sync>;

/// Write a JSON error page: `{"error": "<message>"}`.
pub fn error_page(response: &mut HttpResponse, status: HttpStatus, message: &str) {
    response.set_status(status.code());
    response.set_content_type("application/json");
    response.set_body(serde_json::json!({ "error": message }).to_string());
}

pub fn http_404_not_found(_request: &HttpRequest, response: &mut HttpResponse, _error: &Error) {
    error_page(response, HttpStatus::NotFound, "Not found.");
}

pub fn http_405_method_not_allowed(
    _request: &HttpRequest,
    response: &mut HttpResponse,
    _error: &Error,
) {
    error_page(response, HttpStatus::MethodNotAllowed, "Method not allowed.");
}

/// 500 page carrying the handler's own error message.
pub fn default_error_handler(_request: &HttpRequest, response: &mut HttpResponse, error: &Error) {
    error_page(
        response,
        HttpStatus::InternalServerError,
        &error.cause_message(),
    );
}

/// Which error kinds are converted to responses, and how. A `None` slot
/// lets that error reach the caller.
#[derive(Clone)]
pub struct ErrorHandlers {
    pub not_found: Option<ErrorHandlerFn>,
    pub method_not_allowed: Option<ErrorHandlerFn>,
    pub handler_error: Option<ErrorHandlerFn>,
}

impl ErrorHandlers {
    /// No conversion at all. Every error propagates.
    pub fn none() -> Self {
        Self {
            not_found: None,
            method_not_allowed: None,
            handler_error: None,
        }
    }

    pub(crate) fn for_error(&self, error: &Error) -> Option<&ErrorHandlerFn> {
        match error {
            Error::RouteNotFound(_) => self.not_found.as_ref(),
            Error::MethodNotAllowed { .. } => self.method_not_allowed.as_ref(),
            Error::HandlerError(_) => self.handler_error.as_ref(),
            _ => None,
        }
    }
}

impl Default for ErrorHandlers {
    fn default() -> Self {
        Self {
            not_found: Some(Arc::new(http_404_not_found)),
            method_not_allowed: Some(Arc::new(http_405_method_not_allowed)),
            handler_error: Some(Arc::new(default_error_handler)),
        }
    }
}

impl fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlers")
            .field("not_found", &self.not_found.is_some())
            .field("method_not_allowed", &self.method_not_allowed.is_some())
            .field("handler_error", &self.handler_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(resp: &HttpResponse) -> serde_json::Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn test_not_found_page() {
        let mut resp = HttpResponse::new();
        let req = HttpRequest::new("GET", "/nope/");
        http_404_not_found(&req, &mut resp, &Error::RouteNotFound("/nope/".into()));
        assert_eq!(resp.status, 404);
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(body(&resp), serde_json::json!({"error": "Not found."}));
    }

    #[test]
    fn test_method_not_allowed_page() {
        let mut resp = HttpResponse::new();
        let req = HttpRequest::new("GET", "/x/");
        let err = Error::MethodNotAllowed {
            method: "GET".into(),
            route: "/x/".into(),
        };
        http_405_method_not_allowed(&req, &mut resp, &err);
        assert_eq!(resp.status, 405);
        assert_eq!(resp.text(), r#"{"error":"Method not allowed."}"#);
    }

    #[test]
    fn test_handler_error_page_surfaces_cause() {
        let mut resp = HttpResponse::new();
        let req = HttpRequest::new("GET", "/x/");
        default_error_handler(&req, &mut resp, &Error::HandlerError("disk on fire".into()));
        assert_eq!(resp.status, 500);
        assert_eq!(body(&resp), serde_json::json!({"error": "disk on fire"}));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let mut resp = HttpResponse::new();
        error_page(&mut resp, HttpStatus::BadRequest, "quote \" here");
        assert_eq!(body(&resp)["error"], "quote \" here");
    }

    #[test]
    fn test_selection() {
        let handlers = ErrorHandlers::default();
        assert!(handlers.for_error(&Error::RouteNotFound("/".into())).is_some());
        assert!(handlers.for_error(&Error::DuplicateRoute("/".into())).is_none());
        let none = ErrorHandlers::none();
        assert!(none.for_error(&Error::RouteNotFound("/".into())).is_none());
    }
}
