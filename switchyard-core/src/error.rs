// Error types for Switchyard

use crate::HttpStatus;
use thiserror::Error;

/// Boxed cause carried out of a handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler returns. Errors become [`Error::HandlerError`] at dispatch.
pub type HandlerResult = Result<(), BoxError>;

#[derive(Error, Debug)]
pub enum Error {
    /// The pattern string could not be compiled (setup time).
    #[error("Invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route with the same normalized pattern is already registered (setup time).
    #[error("Route already registered: {0}")]
    DuplicateRoute(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {method} for {route}")]
    MethodNotAllowed { method: String, route: String },

    /// A handler returned an error or panicked. The original cause is kept.
    #[error("Handler error: {0}")]
    HandlerError(#[source] BoxError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) => HttpStatus::NotFound.code(),
            Error::MethodNotAllowed { .. } => HttpStatus::MethodNotAllowed.code(),
            _ => HttpStatus::InternalServerError.code(),
        }
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus::from_code(self.status_code()).unwrap_or(HttpStatus::InternalServerError)
    }

    /// Errors that can only happen while routes are being registered.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidPattern { .. } | Error::DuplicateRoute(_)
        )
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }

    /// Message of the underlying cause for handler failures, otherwise the
    /// error's own message.
    pub fn cause_message(&self) -> String {
        match self {
            Error::HandlerError(cause) => cause.to_string(),
            other => other.to_string(),
        }
    }
}

/// Cause recorded when a handler, middleware hook or error handler panics
/// instead of returning.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct HandlerPanic(pub String);

impl HandlerPanic {
    /// Recover the panic message from a `catch_unwind` payload.
    pub fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            message.to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "handler panicked".to_string()
        };
        HandlerPanic(message)
    }

    pub fn into_error(self) -> Error {
        Error::HandlerError(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::RouteNotFound("/x/".into()).status_code(), 404);
        assert_eq!(
            Error::MethodNotAllowed {
                method: "GET".into(),
                route: "/x/".into()
            }
            .status_code(),
            405
        );
        assert_eq!(Error::HandlerError("boom".into()).status_code(), 500);
        assert_eq!(Error::DuplicateRoute("/x/".into()).status_code(), 500);
    }

    #[test]
    fn test_handler_error_keeps_cause() {
        let err = Error::HandlerError("division by zero".into());
        assert_eq!(err.cause_message(), "division by zero");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("division by zero"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_panic_payloads() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(format!("index {}", 3));
        assert_eq!(HandlerPanic::from_payload(owned.as_ref()).0, "index 3");

        let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
        let err = HandlerPanic::from_payload(other.as_ref()).into_error();
        assert_eq!(err.cause_message(), "handler panicked");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_setup_errors() {
        assert!(Error::invalid_pattern("/{a}/{a}/", "duplicate capture").is_setup_error());
        assert!(Error::DuplicateRoute("/".into()).is_setup_error());
        assert!(!Error::RouteNotFound("/".into()).is_setup_error());
    }
}
