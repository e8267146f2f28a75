//! Testing utilities for Switchyard applications.
//!
//! ```
//! use switchyard_core::App;
//! use switchyard_testing::*;
//!
//! let app = App::builder()
//!     .route("/hello/{name}/", |_, resp, params| {
//!         resp.set_text(format!("Hello {}!", params.str("name").unwrap_or_default()));
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let client = TestClient::new(app);
//! let response = client.get("/hello/ada");
//! assert_status(&response, 200);
//! assert_text(&response, "Hello ada!");
//!
//! assert_not_found(&client.get("/nowhere/"));
//! ```
//!
//! [`MockHandler`] records the calls a route receives and
//! [`RecordingMiddleware`] records hook order.

mod assertions;
mod mock;
mod test_client;

pub use assertions::{
    assert_body_contains, assert_content_type, assert_error_body, assert_handler_failed,
    assert_header, assert_http_status, assert_json, assert_method_not_allowed, assert_not_found,
    assert_propagated, assert_status, assert_success, assert_text,
};
pub use mock::{MockHandler, RecordedCall, RecordingMiddleware};
pub use test_client::{DEFAULT_BASE_URL, TestClient, TestRequestBuilder, TestResponse};
