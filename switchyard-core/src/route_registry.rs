//! Declarative route registration using inventory
//!
//! `register_route!` submits an entry at link time. Entries are grouped by a
//! marker type and pulled into a builder with [`RouterBuilder::mount`], which
//! runs them through the normal `add_route` checks.
//!
//! ```ignore
//! pub struct Site;
//!
//! fn index(_req: &HttpRequest, resp: &mut HttpResponse, _p: &PathParams) -> HandlerResult {
//!     resp.set_text("Index page");
//!     Ok(())
//! }
//!
//! register_route!(Site, "/", index);
//! register_route!(Site, "/upload/", upload, methods = [GET, POST]);
//! register_route!(Site, "/class-view/", view = class_view);
//!
//! let mut builder = RouterBuilder::new();
//! builder.mount::<Site>()?;
//! ```

use crate::logging::debug;
use crate::{Error, Handler, RouterBuilder};
use std::any::TypeId;

/// A route entry that can be collected via inventory
pub struct RouteEntry {
    group: fn() -> TypeId,
    /// The group type name (for debugging)
    pub group_name: fn() -> &'static str,
    pub pattern: &'static str,
    /// Builds the handler when the entry is mounted
    pub handler: fn() -> Handler,
    pub file: &'static str,
    pub line: u32,
}

inventory::collect!(RouteEntry);

impl RouteEntry {
    pub const fn new(
        group: fn() -> TypeId,
        group_name: fn() -> &'static str,
        pattern: &'static str,
        handler: fn() -> Handler,
        file: &'static str,
        line: u32,
    ) -> Self {
        Self {
            group,
            group_name,
            pattern,
            handler,
            file,
            line,
        }
    }

    pub fn group_id(&self) -> TypeId {
        (self.group)()
    }
}

#[doc(hidden)]
pub fn type_id_of<G: 'static>() -> TypeId {
    TypeId::of::<G>()
}

#[doc(hidden)]
pub fn type_name_of<G: 'static>() -> &'static str {
    std::any::type_name::<G>()
}

/// Entries registered for group `G`, in source order (file, then line).
pub fn routes_for_group<G: 'static>() -> Vec<&'static RouteEntry> {
    let target = TypeId::of::<G>();
    let mut entries: Vec<&'static RouteEntry> = inventory::iter::<RouteEntry>
        .into_iter()
        .filter(|entry| entry.group_id() == target)
        .collect();
    entries.sort_by_key(|entry| (entry.file, entry.line));
    entries
}

impl RouterBuilder {
    /// Add every route registered for group `G` with `register_route!`.
    /// Returns how many routes were added.
    pub fn mount<G: 'static>(&mut self) -> Result<usize, Error> {
        let entries = routes_for_group::<G>();
        for entry in &entries {
            debug!(
                group = (entry.group_name)(),
                pattern = entry.pattern,
                "Mounting registered route"
            );
            self.add_route(entry.pattern, (entry.handler)())?;
        }
        Ok(entries.len())
    }
}

/// Register a route for a group at link time.
///
/// - `register_route!(Group, "/pattern/", handler_fn)` answers GET, HEAD and OPTIONS
/// - `register_route!(Group, "/pattern/", handler_fn, methods = [GET, POST])`
/// - `register_route!(Group, "/pattern/", view = table_fn)` where `table_fn() -> MethodTable`
#[macro_export]
macro_rules! register_route {
    (@submit $group:ty, $pattern:expr, $make:expr) => {
        const _: () = {
            fn __switchyard_handler() -> $crate::Handler {
                $make
            }

            $crate::inventory::submit! {
                $crate::route_registry::RouteEntry::new(
                    $crate::route_registry::type_id_of::<$group>,
                    $crate::route_registry::type_name_of::<$group>,
                    $pattern,
                    __switchyard_handler,
                    file!(),
                    line!(),
                )
            }
        };
    };
    ($group:ty, $pattern:expr, view = $table:path) => {
        $crate::register_route!(@submit $group, $pattern, $crate::Handler::from($table()));
    };
    ($group:ty, $pattern:expr, $handler:path, methods = [$($method:ident),+ $(,)?]) => {
        $crate::register_route!(
            @submit $group,
            $pattern,
            $crate::Handler::with_methods($handler, [$($crate::HttpMethod::$method),+])
        );
    };
    ($group:ty, $pattern:expr, $handler:path) => {
        $crate::register_route!(@submit $group, $pattern, $crate::Handler::function($handler));
    };
}
