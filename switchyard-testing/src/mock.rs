// Mock handlers and middleware for testing

use std::sync::{Arc, Mutex, MutexGuard};
use switchyard_core::{
    Error, HandlerResult, HttpRequest, HttpResponse, Middleware, ParamValue, PathParams,
};

/// One invocation seen by a [`MockHandler`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub params: Vec<(String, ParamValue)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Handler that records every call and answers with a fixed body.
///
/// Clones share the same call log, so keep one clone for assertions and
/// register another:
///
/// ```
/// use switchyard_core::App;
/// use switchyard_testing::{MockHandler, TestClient};
///
/// let mock = MockHandler::new().responding("hi");
/// let app = App::builder().route("/users/{id:int}/", mock.handler()).build().unwrap();
///
/// TestClient::new(app).get("/users/7/");
/// assert_eq!(mock.call_count(), 1);
/// assert_eq!(mock.last_call().unwrap().path, "/users/7/");
/// ```
#[derive(Clone, Default)]
pub struct MockHandler {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    body: Arc<Mutex<Option<String>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body written on every call
    pub fn responding(self, body: &str) -> Self {
        *lock(&self.body) = Some(body.to_string());
        self
    }

    /// Return an error with `message` from every call
    pub fn failing(self, message: &str) -> Self {
        *lock(&self.failure) = Some(message.to_string());
        self
    }

    /// The closure to register with a router or app builder
    pub fn handler(
        &self,
    ) -> impl Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static
    {
        let mock = self.clone();
        move |request: &HttpRequest, response: &mut HttpResponse, params: &PathParams| {
            mock.call(request, response, params)
        }
    }

    fn call(
        &self,
        request: &HttpRequest,
        response: &mut HttpResponse,
        params: &PathParams,
    ) -> HandlerResult {
        lock(&self.calls).push(RecordedCall {
            method: request.method.clone(),
            path: request.path.clone(),
            params: params
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        });

        if let Some(message) = lock(&self.failure).clone() {
            return Err(message.into());
        }
        if let Some(body) = lock(&self.body).as_ref() {
            response.set_text(body.clone());
        }
        Ok(())
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        lock(&self.calls).last().cloned()
    }

    pub fn was_called_with(&self, method: &str, path: &str) -> bool {
        lock(&self.calls)
            .iter()
            .any(|call| call.method.eq_ignore_ascii_case(method) && call.path == path)
    }

    /// Clear all recorded calls
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

/// Middleware that appends `"<label>:request"` and `"<label>:response"` to
/// a shared log, for checking hook order.
#[derive(Clone)]
pub struct RecordingMiddleware {
    label: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingMiddleware {
    pub fn new(label: &str) -> Self {
        Self::with_log(label, Arc::default())
    }

    /// Share one log between several recorders
    pub fn with_log(label: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.to_string(),
            log,
        }
    }

    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.log).clone()
    }
}

impl Middleware for RecordingMiddleware {
    fn process_request(&self, _request: &mut HttpRequest) {
        lock(&self.log).push(format!("{}:request", self.label));
    }

    fn process_response(&self, _request: &HttpRequest, _result: &mut Result<HttpResponse, Error>) {
        lock(&self.log).push(format!("{}:response", self.label));
    }

    fn name(&self) -> &str {
        &self.label
    }
}

// A test that panicked while holding a lock must not hide later results.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
