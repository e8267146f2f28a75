// HTTP status codes used by the dispatch layer

/// Status codes the router, dispatcher and built-in collaborators produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    NoContent = 204,
    NotModified = 304,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    InternalServerError = 500,
}

impl HttpStatus {
    /// Numeric status code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Canonical reason phrase
    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::NoContent => "No Content",
            HttpStatus::NotModified => "Not Modified",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::Forbidden => "Forbidden",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::MethodNotAllowed => "Method Not Allowed",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code())
    }

    /// Look up a known status by its numeric code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(HttpStatus::Ok),
            204 => Some(HttpStatus::NoContent),
            304 => Some(HttpStatus::NotModified),
            400 => Some(HttpStatus::BadRequest),
            403 => Some(HttpStatus::Forbidden),
            404 => Some(HttpStatus::NotFound),
            405 => Some(HttpStatus::MethodNotAllowed),
            500 => Some(HttpStatus::InternalServerError),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> u16 {
        status.code()
    }
}
