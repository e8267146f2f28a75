// Routes and per-method handler selection

use crate::{Error, HandlerResult, HttpMethod, HttpRequest, HttpResponse, PathParams, Pattern};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Signature every handler has: read the request, write into the response.
pub type HandlerFn =
    Arc<dyn Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync>;

/// Methods a plain function handler answers when none are given.
pub const DEFAULT_METHODS: [HttpMethod; 3] = [HttpMethod::GET, HttpMethod::HEAD, HttpMethod::OPTIONS];

/// A typed per-verb dispatch table.
///
/// ```
/// use switchyard_core::{MethodTable, HttpMethod};
///
/// let table = MethodTable::new()
///     .get(|_req, resp, _params| {
///         resp.set_text("Class-based view GET");
///         Ok(())
///     })
///     .post(|_req, resp, _params| {
///         resp.set_text("Class-based view POST");
///         Ok(())
///     });
/// assert!(table.supports(HttpMethod::POST));
/// assert!(!table.supports(HttpMethod::DELETE));
/// ```
#[derive(Clone, Default)]
pub struct MethodTable {
    entries: BTreeMap<HttpMethod, HandlerFn>,
}

macro_rules! verb_setters {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            pub fn $name<F>(self, handler: F) -> Self
            where
                F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult
                    + Send
                    + Sync
                    + 'static,
            {
                self.on(HttpMethod::$method, handler)
            }
        )*
    };
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `method`, replacing any previous entry.
    pub fn on<F>(mut self, method: HttpMethod, handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.entries.insert(method, Arc::new(handler));
        self
    }

    verb_setters! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        head => HEAD,
        options => OPTIONS,
    }

    pub fn supports(&self, method: HttpMethod) -> bool {
        self.entries.contains_key(&method)
    }

    pub fn methods(&self) -> impl Iterator<Item = HttpMethod> + '_ {
        self.entries.keys().copied()
    }

    fn lookup(&self, method: HttpMethod) -> Option<&HandlerFn> {
        self.entries.get(&method)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// What a route dispatches to.
#[derive(Clone)]
pub enum Handler {
    /// One callable serving every method in `methods` identically.
    Function {
        func: HandlerFn,
        methods: BTreeSet<HttpMethod>,
    },
    /// One callable per supported verb.
    Capability(MethodTable),
}

impl Handler {
    /// Function handler answering GET, HEAD and OPTIONS.
    pub fn function<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        Self::with_methods(handler, DEFAULT_METHODS)
    }

    /// Function handler answering exactly `methods`.
    pub fn with_methods<F, I>(handler: F, methods: I) -> Self
    where
        F: Fn(&HttpRequest, &mut HttpResponse, &PathParams) -> HandlerResult + Send + Sync + 'static,
        I: IntoIterator<Item = HttpMethod>,
    {
        Handler::Function {
            func: Arc::new(handler),
            methods: methods.into_iter().collect(),
        }
    }

    pub fn allowed_methods(&self) -> BTreeSet<HttpMethod> {
        match self {
            Handler::Function { methods, .. } => methods.clone(),
            Handler::Capability(table) => table.methods().collect(),
        }
    }
}

impl From<MethodTable> for Handler {
    fn from(table: MethodTable) -> Self {
        Handler::Capability(table)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Function { methods, .. } => {
                f.debug_struct("Function").field("methods", methods).finish()
            }
            Handler::Capability(table) => f.debug_tuple("Capability").field(table).finish(),
        }
    }
}

/// A compiled pattern bound to a handler.
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: Pattern,
    pub handler: Handler,
}

impl Route {
    pub fn new(pattern: Pattern, handler: Handler) -> Self {
        Self { pattern, handler }
    }

    pub fn allowed_methods(&self) -> BTreeSet<HttpMethod> {
        self.handler.allowed_methods()
    }

    /// Select the callable for `method` (case-insensitive).
    ///
    /// Unknown verbs and verbs the handler does not support both yield
    /// [`Error::MethodNotAllowed`].
    pub fn get_handler(&self, method: &str) -> Result<&HandlerFn, Error> {
        let found = HttpMethod::from_str(method).and_then(|verb| match &self.handler {
            Handler::Function { func, methods } => methods.contains(&verb).then_some(func),
            Handler::Capability(table) => table.lookup(verb),
        });

        found.ok_or_else(|| Error::MethodNotAllowed {
            method: method.to_ascii_uppercase(),
            route: self.pattern.to_string(),
        })
    }
}
