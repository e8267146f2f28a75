//! Static file serving.
//!
//! The application asks its [`StaticFiles`] server first. A `Some` response is
//! returned as-is, `None` hands the request to the router. [`StaticDir`] serves
//! files under a URL prefix from a directory with:
//! - Content-Type detection by extension
//! - Cache-Control per file type
//! - ETag / Last-Modified and `304 Not Modified`
//! - path traversal rejection

use crate::error_handler::error_page;
use crate::logging::{debug, warn};
use crate::{Error, HttpMethod, HttpRequest, HttpResponse, HttpStatus};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const DEFAULT_STATIC_PREFIX: &str = "/static/";

/// Something that can answer a request before routing.
pub trait StaticFiles: Send + Sync {
    fn serve(&self, request: &HttpRequest) -> Option<HttpResponse>;
}

/// Cache strategy for static assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    /// `no-cache, no-store, must-revalidate`
    NoCache,
    /// `public, max-age=N`
    Public(Duration),
    /// `private, max-age=N`
    Private(Duration),
    /// One year, `immutable`. For fingerprinted assets.
    Immutable,
    /// `no-cache`
    MustRevalidate,
}

impl CacheStrategy {
    pub fn to_header_value(&self) -> String {
        match self {
            CacheStrategy::NoCache => "no-cache, no-store, must-revalidate".to_string(),
            CacheStrategy::Public(duration) => format!("public, max-age={}", duration.as_secs()),
            CacheStrategy::Private(duration) => format!("private, max-age={}", duration.as_secs()),
            CacheStrategy::Immutable => "public, max-age=31536000, immutable".to_string(),
            CacheStrategy::MustRevalidate => "no-cache".to_string(),
        }
    }
}

/// Coarse file classification, used to pick a cache strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Script,
    Stylesheet,
    Image,
    Font,
    Html,
    Data,
    Other,
}

impl FileType {
    pub fn from_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("js" | "mjs") => FileType::Script,
            Some("css") => FileType::Stylesheet,
            Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico") => FileType::Image,
            Some("woff" | "woff2" | "ttf" | "otf") => FileType::Font,
            Some("html" | "htm") => FileType::Html,
            Some("json" | "txt" | "xml" | "csv") => FileType::Data,
            _ => FileType::Other,
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// MIME type for a file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        _ => "application/octet-stream",
    }
}

/// Serves files from `root` for request paths under `prefix`.
#[derive(Debug, Clone)]
pub struct StaticDir {
    root: PathBuf,
    prefix: String,
    default_strategy: CacheStrategy,
    type_strategies: HashMap<FileType, CacheStrategy>,
    enable_etag: bool,
    enable_last_modified: bool,
}

impl StaticDir {
    /// Fails when `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("static directory not found: {}", root.display()),
            )));
        }

        Ok(Self {
            root,
            prefix: DEFAULT_STATIC_PREFIX.to_string(),
            default_strategy: CacheStrategy::Public(Duration::from_secs(3600)),
            type_strategies: HashMap::new(),
            enable_etag: true,
            enable_last_modified: true,
        })
    }

    /// URL prefix to serve under. Leading and trailing slashes are added.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        self.prefix = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        };
        self
    }

    pub fn with_default_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_type_strategy(mut self, file_type: FileType, strategy: CacheStrategy) -> Self {
        self.type_strategies.insert(file_type, strategy);
        self
    }

    pub fn with_etag(mut self, enable: bool) -> Self {
        self.enable_etag = enable;
        self
    }

    pub fn with_last_modified(mut self, enable: bool) -> Self {
        self.enable_last_modified = enable;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a file under the root. `Err(())` means the
    /// path tried to leave the root.
    fn resolve_path(&self, request_path: &str) -> Option<Result<PathBuf, ()>> {
        let relative = request_path.strip_prefix(&self.prefix)?;
        let decoded = urlencoding::decode(relative).ok()?;

        let mut path = self.root.clone();
        for component in Path::new(decoded.as_ref()).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Some(Err(()));
                }
            }
        }
        Some(Ok(path))
    }

    fn etag(path: &Path, metadata: &fs::Metadata) -> String {
        let mut hasher = DefaultHasher::new();
        path.to_string_lossy().hash(&mut hasher);
        metadata.len().hash(&mut hasher);
        if let Some(modified) = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
        {
            modified.as_secs().hash(&mut hasher);
        }
        format!("\"{:x}\"", hasher.finish())
    }

    fn is_fresh(&self, request: &HttpRequest, etag: Option<&str>, modified: Option<SystemTime>) -> bool {
        if let (Some(etag), Some(if_none_match)) = (etag, request.header("If-None-Match")) {
            return if_none_match
                .split(',')
                .any(|candidate| candidate.trim() == etag || candidate.trim() == "*");
        }
        match (modified, request.header("If-Modified-Since")) {
            (Some(modified), Some(since)) if self.enable_last_modified => httpdate::parse_http_date(since)
                .map(|since| modified <= since)
                .unwrap_or(false),
            _ => false,
        }
    }

    fn serve_file(&self, path: &Path, request: &HttpRequest) -> Option<HttpResponse> {
        let metadata = fs::metadata(path).ok().filter(|meta| meta.is_file())?;
        let modified = metadata.modified().ok();
        let etag = self.enable_etag.then(|| Self::etag(path, &metadata));

        let mut response = HttpResponse::new();
        if let Some(etag) = &etag {
            response.set_header("ETag", etag.clone());
        }
        if self.enable_last_modified {
            if let Some(modified) = modified {
                response.set_header("Last-Modified", httpdate::fmt_http_date(modified));
            }
        }
        let strategy = self
            .type_strategies
            .get(&FileType::from_path(path))
            .copied()
            .unwrap_or(self.default_strategy);
        response.set_header("Cache-Control", strategy.to_header_value());

        if self.is_fresh(request, etag.as_deref(), modified) {
            response.set_status(HttpStatus::NotModified.code());
            response.headers.retain(|key, _| !key.eq_ignore_ascii_case("Content-Type"));
            return Some(response);
        }

        let body = match fs::read(path) {
            Ok(body) => body,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read static file");
                return None;
            }
        };

        response.set_content_type(content_type_for(path));
        response.set_header("Content-Length", body.len().to_string());
        if request.http_method() != Some(HttpMethod::HEAD) {
            response.body = body;
        }
        Some(response)
    }
}

impl StaticFiles for StaticDir {
    fn serve(&self, request: &HttpRequest) -> Option<HttpResponse> {
        if !matches!(request.http_method(), Some(HttpMethod::GET | HttpMethod::HEAD)) {
            return None;
        }

        match self.resolve_path(&request.path)? {
            Ok(path) => {
                let response = self.serve_file(&path, request);
                if response.is_some() {
                    debug!(path = %request.path, file = %path.display(), "Served static file");
                }
                response
            }
            Err(()) => {
                warn!(path = %request.path, "Rejected static path outside the root");
                let mut response = HttpResponse::new();
                error_page(&mut response, HttpStatus::Forbidden, "Forbidden.");
                Some(response)
            }
        }
    }
}
