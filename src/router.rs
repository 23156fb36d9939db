//! Router for grouping routes with shared middleware.

use hyper::Method;
use std::sync::Arc;

use crate::{Handler, Middleware, handler::IntoHandler};

pub(crate) type BoxedHandler<S> = Arc<dyn Handler<S>>;
pub(crate) type BoxedMiddleware<S> = Arc<dyn Middleware<S>>;
pub(crate) type SharedMiddlewares<S> = Arc<Vec<BoxedMiddleware<S>>>;

/// A flattened route: method, full pattern, handler and the middleware
/// that wraps it (outermost first).
pub(crate) type RouteEntry<S> = (Method, String, BoxedHandler<S>, SharedMiddlewares<S>);

/// Routes mounted together under a prefix.
///
/// ```rust
/// use lantern::{App, Req, Res, Router};
///
/// let mut notes = Router::new();
/// notes.get("", |_: Req| async { Res::text("Note") });
/// notes.get("/{content_type}", |_: Req| async { Res::text("Typed note") });
///
/// let mut app = App::new();
/// app.nest("/note", notes);
/// assert!(app.has_route("/note/{content_type}"));
/// ```
pub struct Router<S = ()> {
    routes: Vec<(Method, String, BoxedHandler<S>)>,
    middlewares: Vec<BoxedMiddleware<S>>,
    nested: Vec<(String, Router<S>)>,
}

impl<S: Send + Sync + 'static> Router<S> {
    /// Create router with pre-allocated capacity.
    pub fn with_capacity(routes: usize, middlewares: usize) -> Self {
        Self {
            routes: Vec::with_capacity(routes),
            middlewares: Vec::with_capacity(middlewares),
            nested: Vec::new(),
        }
    }

    /// Create a new router.
    pub fn new() -> Self {
        Self::with_capacity(10, 5)
    }

    /// Register a GET route.
    pub fn get<H, T>(&mut self, path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        self.methods(&[Method::GET], path, handler);
    }

    /// Register a POST route.
    pub fn post<H, T>(&mut self, path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        self.methods(&[Method::POST], path, handler);
    }

    /// Register a PUT route.
    pub fn put<H, T>(&mut self, path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        self.methods(&[Method::PUT], path, handler);
    }

    /// Register a DELETE route.
    pub fn delete<H, T>(&mut self, path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        self.methods(&[Method::DELETE], path, handler);
    }

    /// Register a PATCH route.
    pub fn patch<H, T>(&mut self, path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        self.methods(&[Method::PATCH], path, handler);
    }

    /// Register one handler for several methods.
    pub fn methods<H, T>(&mut self, methods: &[Method], path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        let handler = handler.into_handler();
        for method in methods {
            self.routes
                .push((method.clone(), path.to_string(), Arc::clone(&handler)));
        }
    }

    /// Add middleware to this router.
    ///
    /// Middleware applies to all routes in this router, including nested routers.
    pub fn layer<M: Middleware<S>>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Mount a nested router at a prefix.
    ///
    /// Middleware from parent router is inherited by nested router.
    pub fn nest(&mut self, prefix: &str, router: Router<S>) {
        self.nested.push((prefix.to_string(), router));
    }

    /// Get the number of routes in this router (excluding nested).
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub(crate) fn flatten(self, prefix: &str) -> Vec<RouteEntry<S>> {
        self.flatten_with_shared(prefix, None)
    }

    fn flatten_with_shared(
        self,
        prefix: &str,
        parent_middlewares: Option<&SharedMiddlewares<S>>,
    ) -> Vec<RouteEntry<S>> {
        let mut flattened = Vec::with_capacity(self.routes.len());

        let combined_middlewares: SharedMiddlewares<S> = match parent_middlewares {
            Some(parent) if self.middlewares.is_empty() => Arc::clone(parent),
            Some(parent) => {
                let mut combined = Vec::with_capacity(parent.len() + self.middlewares.len());
                combined.extend_from_slice(parent);
                combined.extend_from_slice(&self.middlewares);
                Arc::new(combined)
            }
            None => Arc::new(self.middlewares),
        };

        for (method, path, handler) in self.routes {
            flattened.push((
                method,
                format!("{}{}", prefix, path),
                handler,
                Arc::clone(&combined_middlewares),
            ));
        }

        for (nested_prefix, nested_router) in self.nested {
            let full_prefix = format!("{}{}", prefix, nested_prefix);
            flattened.extend(
                nested_router.flatten_with_shared(&full_prefix, Some(&combined_middlewares)),
            );
        }

        flattened
    }
}

impl<S> Default for Router<S>
where
    S: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
