//! Per-route configuration with middleware support.

use hyper::Method;
use std::sync::Arc;

use crate::router::{BoxedHandler, RouteEntry, SharedMiddlewares};
use crate::{Middleware, handler::IntoHandler};

/// A single route with its own middleware.
///
/// ```rust
/// use lantern::{App, Error, IntoRes, Next, Req, Res, Route, from_fn};
///
/// let mut admin = Route::get("/admin", |_: Req| async { Res::text("Welcome!") });
/// admin.layer(from_fn(|req: Req, _state, next: Next<()>| async move {
///     match req.cookie("admin") {
///         Some(_) => next.run(req).await,
///         None => Error::forbidden("Admins only").into_res(),
///     }
/// }));
///
/// let mut app = App::new();
/// app.route(admin);
/// ```
pub struct Route<S = ()> {
    methods: Vec<Method>,
    path: String,
    handler: BoxedHandler<S>,
    middlewares: SharedMiddlewares<S>,
}

impl<S: Send + Sync + 'static> Route<S> {
    /// Route answering every method in `methods`.
    pub fn methods<H, T>(methods: &[Method], path: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<S, T>,
    {
        Self {
            methods: methods.to_vec(),
            path: path.into(),
            handler: handler.into_handler(),
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add middleware to this route.
    ///
    /// Middleware is executed in registration order.
    pub fn layer<M: Middleware<S>>(&mut self, middleware: M) {
        let mut mw = (*self.middlewares).clone();
        mw.push(Arc::new(middleware));
        self.middlewares = Arc::new(mw);
    }

    /// Create a GET route.
    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<S, T>,
    {
        Self::methods(&[Method::GET], path, handler)
    }

    /// Create a POST route.
    pub fn post<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<S, T>,
    {
        Self::methods(&[Method::POST], path, handler)
    }

    /// Create a PUT route.
    pub fn put<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<S, T>,
    {
        Self::methods(&[Method::PUT], path, handler)
    }

    /// Create a DELETE route.
    pub fn delete<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<S, T>,
    {
        Self::methods(&[Method::DELETE], path, handler)
    }

    /// Create a PATCH route.
    pub fn patch<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: IntoHandler<S, T>,
    {
        Self::methods(&[Method::PATCH], path, handler)
    }

    pub(crate) fn into_entries(self) -> Vec<RouteEntry<S>> {
        self.methods
            .into_iter()
            .map(|method| {
                (
                    method,
                    self.path.clone(),
                    Arc::clone(&self.handler),
                    Arc::clone(&self.middlewares),
                )
            })
            .collect()
    }
}
