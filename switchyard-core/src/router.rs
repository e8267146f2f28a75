// Router: ordered routes, trailing-slash policy, first-match resolution

use crate::logging::{debug, warn};
use crate::{
    Error, Handler, HandlerResult, HttpMethod, HttpRequest, HttpResponse, MethodTable, PathParams,
    Pattern, Route,
};

/// Apply the trailing-slash policy to a path or pattern.
pub fn normalize(path: &str, force_trailing_slashes: bool) -> String {
    if force_trailing_slashes && !path.ends_with('/') {
        format!("{path}/")
    } else {
        path.to_string()
    }
}

// A compiled route plus the pattern exactly as it was registered.
#[derive(Debug)]
struct Registered {
    source: String,
    route: Route,
}

/// Accumulates routes during setup. Call [`RouterBuilder::build`] to freeze
/// them into a [`Router`].
#[derive(Debug)]
pub struct RouterBuilder {
    routes: Vec<Registered>,
    force_trailing_slashes: bool,
}

impl RouterBuilder {
    /// Empty builder with trailing slashes forced.
    pub fn new() -> Self {
        Self::with_force_trailing_slashes(true)
    }

    pub fn with_force_trailing_slashes(enabled: bool) -> Self {
        Self {
            routes: Vec::new(),
            force_trailing_slashes: enabled,
        }
    }

    /// Switch the trailing-slash policy.
    ///
    /// Routes already added are normalized again from their original
    /// patterns. Fails with [`Error::DuplicateRoute`] if two of them collapse
    /// onto the same pattern, in which case the builder is left unchanged.
    pub fn set_force_trailing_slashes(&mut self, enabled: bool) -> Result<(), Error> {
        if enabled == self.force_trailing_slashes {
            return Ok(());
        }

        let mut rebuilt = RouterBuilder::with_force_trailing_slashes(enabled);
        for registered in &self.routes {
            rebuilt.add_route(&registered.source, registered.route.handler.clone())?;
        }
        debug!(
            force_trailing_slashes = enabled,
            route_count = rebuilt.len(),
            "Re-normalized routes"
        );
        *self = rebuilt;
        Ok(())
    }

    pub fn force_trailing_slashes(&self) -> bool {
        self.force_trailing_slashes
    }

    pub fn normalize(&self, path: &str) -> String {
        normalize(path, self.force_trailing_slashes)
    }

    /// Register `handler` under `pattern`.
    ///
    /// Fails with [`Error::InvalidPattern`] if the pattern does not compile,
    /// or [`Error::DuplicateRoute`] if the normalized pattern is taken.
    /// Registration order decides which route wins when several match.
    pub fn add_route(&mut self, pattern: &str, handler: impl Into<Handler>) -> Result<(), Error> {
        let source = pattern.to_string();
        let normalized = self.normalize(pattern);
        if self
            .routes
            .iter()
            .any(|registered| registered.route.pattern.as_str() == normalized)
        {
            return Err(Error::DuplicateRoute(normalized));
        }

        let pattern = Pattern::compile(&normalized)?;
        if let Some(earlier) = self
            .routes
            .iter()
            .map(|registered| &registered.route)
            .find(|route| route.pattern.shadows(&pattern))
        {
            warn!(
                pattern = %pattern,
                shadowed_by = %earlier.pattern,
                "Route is unreachable: an earlier route matches every path it matches"
            );
        }

        let handler = handler.into();
        debug!(
            pattern = %pattern,
            methods = ?handler.allowed_methods(),
            "Registered route"
        );
        self.routes.push(Registered {
            source,
            route: Route::new(pattern, handler),
        });
        Ok(())
    }

    /// Register a function handler answering GET, HEAD and OPTIONS.
    pub fn route<F>(&mut self, pattern: &str, handler: F) -> Result<(), Error>
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(pattern, Handler::function(handler))
    }

    /// Register a function handler answering exactly `methods`.
    pub fn route_with_methods<F, I>(&mut self, pattern: &str, methods: I, handler: F) -> Result<(), Error>
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
        I: IntoIterator<Item = HttpMethod>,
    {
        self.add_route(pattern, Handler::with_methods(handler, methods))
    }

    /// Register a per-verb dispatch table.
    pub fn view(&mut self, pattern: &str, table: MethodTable) -> Result<(), Error> {
        self.add_route(pattern, table)
    }

    /// True if `path` would resolve against the routes added so far.
    pub fn has_route(&self, path: &str) -> bool {
        let path = self.normalize(path);
        self.routes
            .iter()
            .any(|registered| registered.route.pattern.matches(&path).is_some())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn build(self) -> Router {
        debug!(route_count = self.routes.len(), "Router built");
        Router {
            routes: self
                .routes
                .into_iter()
                .map(|registered| registered.route)
                .collect(),
            force_trailing_slashes: self.force_trailing_slashes,
        }
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A matched route plus the parameters extracted from the path.
#[derive(Debug)]
pub struct ResolvedRoute<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// Immutable, ordered route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    force_trailing_slashes: bool,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub fn normalize(&self, path: &str) -> String {
        normalize(path, self.force_trailing_slashes)
    }

    /// First route, in registration order, whose pattern matches `path`.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute<'_>> {
        let path = self.normalize(path);
        let resolved = self.routes.iter().find_map(|route| {
            route
                .pattern
                .matches(&path)
                .map(|params| ResolvedRoute { route, params })
        });

        match &resolved {
            Some(found) => debug!(path = %path, pattern = %found.route.pattern, "Route resolved"),
            None => debug!(path = %path, "No route matched"),
        }
        resolved
    }

    pub fn has_route(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn force_trailing_slashes(&self) -> bool {
        self.force_trailing_slashes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &HttpRequest, _: &mut HttpResponse, _: &PathParams) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/x", true), "/x/");
        assert_eq!(normalize("/x/", true), "/x/");
        assert_eq!(normalize("/x", false), "/x");
    }

    #[test]
    fn test_duplicate_after_normalization() {
        let mut builder = RouterBuilder::new();
        builder.route("/home", noop).unwrap();
        let err = builder.route("/home/", noop).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute(ref p) if p == "/home/"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_exact_forms_are_distinct_without_forcing() {
        let mut builder = RouterBuilder::with_force_trailing_slashes(false);
        builder.route("/home", noop).unwrap();
        builder.route("/home/", noop).unwrap();
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_enabling_slashes_renormalizes_existing_routes() {
        let mut builder = RouterBuilder::with_force_trailing_slashes(false);
        builder.route("/y", noop).unwrap();
        builder.set_force_trailing_slashes(true).unwrap();
        let router = builder.build();

        assert_eq!(router.routes()[0].pattern.as_str(), "/y/");
        assert!(router.resolve("/y").is_some());
        assert!(router.resolve("/y/").is_some());
    }

    #[test]
    fn test_disabling_slashes_restores_registered_form() {
        let mut builder = RouterBuilder::new();
        builder.route("/x", noop).unwrap();
        builder.set_force_trailing_slashes(false).unwrap();
        assert!(!builder.force_trailing_slashes());
        let router = builder.build();

        assert!(router.resolve("/x").is_some());
        assert!(router.resolve("/x/").is_none());
    }

    #[test]
    fn test_renormalizing_into_duplicate_keeps_builder() {
        let mut builder = RouterBuilder::with_force_trailing_slashes(false);
        builder.route("/home", noop).unwrap();
        builder.route("/home/", noop).unwrap();

        assert!(matches!(
            builder.set_force_trailing_slashes(true),
            Err(Error::DuplicateRoute(ref p)) if p == "/home/"
        ));
        assert!(!builder.force_trailing_slashes());
        assert_eq!(builder.len(), 2);
        assert!(builder.has_route("/home"));
    }

    #[test]
    fn test_invalid_pattern_is_not_registered() {
        let mut builder = RouterBuilder::new();
        assert!(matches!(
            builder.route("/{a}/{a}/", noop),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let mut builder = RouterBuilder::new();
        builder.route("/items/{slug}/", noop).unwrap();
        builder.route("/items/{id:int}/", noop).unwrap();
        let router = builder.build();

        let resolved = router.resolve("/items/7/").unwrap();
        assert_eq!(resolved.route.pattern.as_str(), "/items/{slug}/");
        assert_eq!(resolved.params.str("slug"), Some("7"));
    }

    #[test]
    fn test_typed_route_falls_through_on_coercion_failure() {
        let mut builder = RouterBuilder::new();
        builder.route("/items/{id:int}/", noop).unwrap();
        builder.route("/items/{slug}/", noop).unwrap();
        let router = builder.build();

        assert_eq!(
            router.resolve("/items/7/").unwrap().route.pattern.as_str(),
            "/items/{id:int}/"
        );
        assert_eq!(
            router.resolve("/items/seven/").unwrap().route.pattern.as_str(),
            "/items/{slug}/"
        );
    }

    #[test]
    fn test_builder_has_route() {
        let mut builder = RouterBuilder::new();
        builder.route("/text/", noop).unwrap();
        assert!(builder.has_route("/text"));
        assert!(!builder.has_route("/nope/"));
    }
}
