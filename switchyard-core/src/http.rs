// HTTP request and response types

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// HTTP verbs a route can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
    ];

    /// Case-insensitive parse. Unknown verbs yield `None`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn replace_header(headers: &mut HashMap<String, String>, name: &str, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Method as received. Matching against routes is case-insensitive.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub query_params: HashMap<String, String>,
    pub received_at: Instant,
}

impl HttpRequest {
    /// Build a request from a method and a request target (`/path?query`).
    pub fn new(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            method: method.into(),
            path: path.to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
            query_params: query.map(parse_query).unwrap_or_default(),
            received_at: Instant::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        replace_header(&mut self.headers, name, value.into());
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Parsed method, `None` for verbs outside [`HttpMethod`].
    pub fn http_method(&self) -> Option<HttpMethod> {
        HttpMethod::from_str(&self.method)
    }

    /// Parse the request body as JSON
    pub fn json<T: for<'de> serde::Deserialize<'de>>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .unwrap_or(spaced)
}

/// HTTP response wrapper. Starts as `200 OK` with an HTML content type and an
/// empty body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string());
        Self {
            status,
            headers,
            body: Vec::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Body decoded as UTF-8 (lossy)
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.body = text.into().into_bytes();
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.set_header("Content-Type", content_type);
    }

    /// Serialize `value` as the body and switch the content type to JSON.
    pub fn set_json<T: Serialize>(&mut self, value: &T) -> serde_json::Result<()> {
        self.body = serde_json::to_vec(value)?;
        self.set_content_type("application/json");
        Ok(())
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        replace_header(&mut self.headers, name, value.into());
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}
