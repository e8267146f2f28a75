// Assertions over TestClient responses
//
// Every assertion first requires a rendered page. An error that no error
// handler converted fails the assertion with that error instead.

use crate::TestResponse;
use serde_json::Value;
use switchyard_core::{HttpResponse, HttpStatus};

const NOT_FOUND_MESSAGE: &str = "Not found.";
const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed.";

fn page(response: &TestResponse) -> &HttpResponse {
    match response {
        TestResponse::Success(page) => page,
        TestResponse::Error(err) => panic!("Expected a response, got unhandled error: {err}"),
    }
}

pub fn assert_status(response: &TestResponse, expected: u16) {
    let actual = page(response).status;
    assert_eq!(actual, expected, "Expected status {expected}, got {actual}");
}

pub fn assert_http_status(response: &TestResponse, expected: HttpStatus) {
    assert_status(response, expected.code());
}

/// Any 2xx status
pub fn assert_success(response: &TestResponse) {
    let status = page(response).status;
    assert!(
        (200..300).contains(&status),
        "Expected a 2xx status, got {status}"
    );
}

/// Exact body text
pub fn assert_text(response: &TestResponse, expected: &str) {
    assert_eq!(page(response).text(), expected, "Body text differs");
}

pub fn assert_body_contains(response: &TestResponse, expected: &str) {
    let body = page(response).text();
    assert!(
        body.contains(expected),
        "Expected body to contain {expected:?}, body was {body:?}"
    );
}

/// Body parsed as JSON equals `expected`
pub fn assert_json<T>(response: &TestResponse, expected: &T)
where
    T: serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let actual: T = match response.body_json() {
        Ok(actual) => actual,
        Err(err) => panic!("Body is not the expected JSON: {err}"),
    };
    assert_eq!(actual, *expected, "JSON bodies do not match");
}

/// Header lookup is case-insensitive
pub fn assert_header(response: &TestResponse, name: &str, expected: &str) {
    let actual = page(response).header(name);
    assert_eq!(
        actual,
        Some(expected),
        "Expected header {name:?} to be {expected:?}, got {actual:?}"
    );
}

/// Content-Type starts with `expected`, so `"text/html"` accepts a charset
pub fn assert_content_type(response: &TestResponse, expected: &str) {
    let actual = page(response).content_type();
    assert!(
        actual.is_some_and(|value| value.starts_with(expected)),
        "Expected content type {expected:?}, got {actual:?}"
    );
}

/// A JSON error page: `status` with `{"error": message}`
pub fn assert_error_body(response: &TestResponse, status: u16, message: &str) {
    assert_status(response, status);
    assert_content_type(response, "application/json");
    assert_json(response, &Value::from_iter([("error", message)]));
}

/// The default 404 page
pub fn assert_not_found(response: &TestResponse) {
    assert_error_body(response, HttpStatus::NotFound.code(), NOT_FOUND_MESSAGE);
}

/// The default 405 page
pub fn assert_method_not_allowed(response: &TestResponse) {
    assert_error_body(
        response,
        HttpStatus::MethodNotAllowed.code(),
        METHOD_NOT_ALLOWED_MESSAGE,
    );
}

/// The default 500 page, which carries the handler's own error message
pub fn assert_handler_failed(response: &TestResponse, message: &str) {
    assert_error_body(response, HttpStatus::InternalServerError.code(), message);
}

/// The error reached the caller unconverted, and maps to `status`.
pub fn assert_propagated(response: &TestResponse, status: u16) {
    let err = response.assert_error();
    assert_eq!(
        err.status_code(),
        status,
        "Expected a propagated error mapping to {status}, got {err}"
    );
}
