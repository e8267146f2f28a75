// Test HTTP Client

use std::collections::BTreeMap;
use std::sync::Arc;
use switchyard_core::{App, Error, HttpMethod, HttpRequest, HttpResponse};

pub const DEFAULT_BASE_URL: &str = "http://testserver";

/// Drives requests through an [`App`] without a network.
///
/// Targets may be relative (`/hello/ada/`) or absolute URLs under the
/// client's base URL (`http://testserver/hello/ada/`).
#[derive(Clone)]
pub struct TestClient {
    app: Arc<App>,
    base_url: String,
}

impl TestClient {
    pub fn new(app: App) -> Self {
        Self::shared(Arc::new(app))
    }

    /// Use an application that is also held elsewhere
    pub fn shared(app: Arc<App>) -> Self {
        Self {
            app,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Make a GET request
    pub fn get(&self, target: &str) -> TestResponse {
        self.request(HttpMethod::GET, target, None)
    }

    /// Make a POST request
    pub fn post(&self, target: &str, body: impl Into<Vec<u8>>) -> TestResponse {
        self.request(HttpMethod::POST, target, Some(body.into()))
    }

    /// Make a PUT request
    pub fn put(&self, target: &str, body: impl Into<Vec<u8>>) -> TestResponse {
        self.request(HttpMethod::PUT, target, Some(body.into()))
    }

    /// Make a PATCH request
    pub fn patch(&self, target: &str, body: impl Into<Vec<u8>>) -> TestResponse {
        self.request(HttpMethod::PATCH, target, Some(body.into()))
    }

    /// Make a DELETE request
    pub fn delete(&self, target: &str) -> TestResponse {
        self.request(HttpMethod::DELETE, target, None)
    }

    pub fn head(&self, target: &str) -> TestResponse {
        self.request(HttpMethod::HEAD, target, None)
    }

    pub fn options(&self, target: &str) -> TestResponse {
        self.request(HttpMethod::OPTIONS, target, None)
    }

    pub fn request(&self, method: HttpMethod, target: &str, body: Option<Vec<u8>>) -> TestResponse {
        let mut request = HttpRequest::new(method.as_str(), &self.local_target(target));
        request.body = body.unwrap_or_default();
        self.send(request)
    }

    /// Send a request built with [`TestRequestBuilder`] or by hand
    pub fn send(&self, request: HttpRequest) -> TestResponse {
        match self.app.handle_request(request) {
            Ok(response) => TestResponse::Success(response),
            Err(error) => TestResponse::Error(error),
        }
    }

    // Absolute URLs under the base URL become the path and query part.
    fn local_target(&self, target: &str) -> String {
        match target.strip_prefix(self.base_url.as_str()) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('?') => format!("/{rest}"),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => target.to_string(),
        }
    }
}

/// Builder for requests that need headers, a body or query parameters
#[derive(Debug, Clone)]
pub struct TestRequestBuilder {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    query_params: BTreeMap<String, String>,
}

impl TestRequestBuilder {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self::with_method(method.as_str(), path)
    }

    /// Any method string, including ones the router does not know
    pub fn with_method(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
            query_params: BTreeMap::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set JSON body
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> serde_json::Result<Self> {
        self.body = serde_json::to_vec(data)?;
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        Ok(self)
    }

    /// Add a query parameter
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> HttpRequest {
        let target = if self.query_params.is_empty() {
            self.path
        } else {
            let params: Vec<String> = self
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            format!("{}?{}", self.path, params.join("&"))
        };

        let mut request = HttpRequest::new(self.method, &target).with_body(self.body);
        for (key, value) in self.headers {
            request = request.with_header(key, value);
        }
        request
    }
}

/// Response from a test request
#[derive(Debug)]
pub enum TestResponse {
    Success(HttpResponse),
    /// The application returned an error no handler turned into a page
    Error(Error),
}

impl TestResponse {
    /// Assert the response is successful
    pub fn assert_success(&self) -> &HttpResponse {
        match self {
            TestResponse::Success(response) => response,
            TestResponse::Error(error) => {
                panic!("Expected success response, got error: {:?}", error)
            }
        }
    }

    /// Assert the response is an error
    pub fn assert_error(&self) -> &Error {
        match self {
            TestResponse::Error(error) => error,
            TestResponse::Success(response) => {
                panic!("Expected error, got response with status {}", response.status)
            }
        }
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            TestResponse::Success(response) => Some(response),
            TestResponse::Error(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    pub fn body_string(&self) -> Option<String> {
        self.response()
            .and_then(|response| String::from_utf8(response.body.clone()).ok())
    }

    pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        match self {
            TestResponse::Success(response) => serde_json::from_slice(&response.body)
                .map_err(|e| format!("Serialization error: {}", e)),
            TestResponse::Error(error) => Err(format!("{:?}", error)),
        }
    }

    /// Header value, case-insensitive
    pub fn header(&self, key: &str) -> Option<&str> {
        self.response().and_then(|response| response.header(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_app() -> App {
        App::builder()
            .route("/echo/", |req, resp, _| {
                resp.set_text(format!(
                    "{} {} q={}",
                    req.method,
                    req.path,
                    req.query("q").map(String::as_str).unwrap_or("-")
                ));
                Ok(())
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_request_builder() {
        let req = TestRequestBuilder::new(HttpMethod::GET, "/test")
            .header("Authorization", "Bearer token")
            .query("foo", "bar baz")
            .build();

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/test");
        assert_eq!(req.header("authorization"), Some("Bearer token"));
        assert_eq!(req.query("foo").map(String::as_str), Some("bar baz"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = TestRequestBuilder::new(HttpMethod::POST, "/items/")
            .json(&serde_json::json!({"name": "bolt"}))
            .unwrap()
            .build();

        assert_eq!(req.header("content-type"), Some("application/json"));
        let value: serde_json::Value = req.json().unwrap();
        assert_eq!(value["name"], "bolt");
    }

    #[test]
    fn test_relative_and_absolute_targets() {
        let client = TestClient::new(echo_app());

        assert_eq!(client.get("/echo/").body_string().unwrap(), "GET /echo/ q=-");
        assert_eq!(
            client.get("http://testserver/echo/?q=1").body_string().unwrap(),
            "GET /echo/ q=1"
        );
        assert_eq!(client.post("/echo", "x").body_string().unwrap(), "POST /echo q=-");
    }

    #[test]
    fn test_custom_base_url() {
        let client = TestClient::new(echo_app()).with_base_url("https://example.org/");
        assert_eq!(client.base_url(), "https://example.org");
        assert_eq!(client.get("https://example.org/echo/").status(), Some(200));
        assert_eq!(client.get("https://example.org").status(), Some(404));
    }

    #[test]
    fn test_error_variant() {
        let app = App::builder()
            .route("/broken/", |_, _, _| Err("boom".into()))
            .without_error_handler()
            .build()
            .unwrap();
        let response = TestClient::new(app).get("/broken/");

        assert!(matches!(response.assert_error(), Error::HandlerError(_)));
        assert_eq!(response.status(), None);
        assert!(response.body_json::<serde_json::Value>().is_err());
    }
}
