//! HTTP application.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::FutureExt;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, header};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;

use crate::error_handler::Raised;
use crate::middleware::{self, NextFn};
use crate::res::BoxBody;
use crate::router::{BoxedHandler, BoxedMiddleware, RouteEntry, SharedMiddlewares};
use crate::{Error, ErrorHandler, IntoRes, Middleware, Req, Res, Result, Route, Router, handler::IntoHandler};

type BoxedErrorHandler = Arc<dyn ErrorHandler>;
type MethodHandlers<S> = HashMap<Method, (BoxedHandler<S>, SharedMiddlewares<S>)>;

/// Default request body limit: 16 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// HTTP application.
///
/// Routes, middleware and the error handler are registered up front; the
/// route table is built on the first request (or by [`App::listen`]).
pub struct App<S = ()> {
    routes: Vec<RouteEntry<S>>,
    middlewares: Vec<BoxedMiddleware<S>>,
    state: Arc<S>,
    router: Option<matchit::Router<Arc<MethodHandlers<S>>>>,
    error_handler: Option<BoxedErrorHandler>,
    max_body_size: usize,
}

impl App<()> {
    /// Create a new application without state.
    pub fn new() -> Self {
        Self::with_state(())
    }
}

impl Default for App<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync + 'static> App<S> {
    /// Create application with custom state.
    ///
    /// State is shared across handlers via `Arc<S>` and accessed using `State<S>` extractor.
    pub fn with_state(state: S) -> Self {
        Self {
            routes: Vec::new(),
            middlewares: Vec::new(),
            state: Arc::new(state),
            router: None,
            error_handler: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Shared state.
    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Set custom error handler.
    ///
    /// Every error response is re-rendered through it, whether it came from
    /// routing, an extractor, a handler or a panic.
    pub fn set_error_handler<H: ErrorHandler>(&mut self, handler: H) {
        self.error_handler = Some(Arc::new(handler));
    }

    /// Largest request body accepted; bigger ones get 413.
    pub fn max_body_size(&mut self, bytes: usize) {
        self.max_body_size = bytes;
    }

    /// Add global middleware.
    ///
    /// Middleware runs for all routes. Execution order matches registration order.
    pub fn layer<M: Middleware<S>>(&mut self, middleware: M) {
        self.middlewares.push(Arc::new(middleware));
        self.router = None;
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

    /// Register one handler for several methods, e.g. a form view that
    /// renders on GET and validates on POST.
    pub fn methods<H, T>(&mut self, methods: &[Method], path: &str, handler: H)
    where
        H: IntoHandler<S, T>,
    {
        self.route(Route::methods(methods, path, handler));
    }

    /// Register a route with per-route middleware.
    pub fn route(&mut self, route: Route<S>) {
        self.routes.extend(route.into_entries());
        self.router = None;
    }

    /// Mount a router at a prefix.
    pub fn nest(&mut self, prefix: &str, router: Router<S>) {
        self.routes.extend(router.flatten(prefix));
        self.router = None;
    }

    /// Get the number of registered method/pattern pairs.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Check if a route exists at the given pattern.
    pub fn has_route(&self, path: &str) -> bool {
        self.routes.iter().any(|(_, p, _, _)| p == path)
    }

    fn build_router(&mut self) {
        let mut router = matchit::Router::new();
        let mut path_methods: Vec<(String, MethodHandlers<S>)> = Vec::new();

        let global_middlewares = Arc::new(self.middlewares.clone());

        for (method, path, handler, route_middlewares) in &self.routes {
            let combined_middlewares: SharedMiddlewares<S> = if route_middlewares.is_empty() {
                Arc::clone(&global_middlewares)
            } else if global_middlewares.is_empty() {
                Arc::clone(route_middlewares)
            } else {
                let mut combined =
                    Vec::with_capacity(global_middlewares.len() + route_middlewares.len());
                combined.extend_from_slice(&global_middlewares);
                combined.extend_from_slice(route_middlewares);
                Arc::new(combined)
            };

            let entry = match path_methods.iter().position(|(p, _)| p == path) {
                Some(index) => &mut path_methods[index].1,
                None => {
                    path_methods.push((path.clone(), HashMap::new()));
                    let last = path_methods.len() - 1;
                    &mut path_methods[last].1
                }
            };
            entry.insert(method.clone(), (Arc::clone(handler), combined_middlewares));
        }

        for (path, methods) in path_methods {
            if let Err(e) = router.insert(path.clone(), Arc::new(methods)) {
                tracing::warn!(pattern = %path, error = %e, "skipping conflicting route");
            }
        }

        tracing::debug!(routes = self.routes.len(), "route table built");
        self.router = Some(router);
    }

    /// Dispatch an in-memory request.
    ///
    /// Runs the same routing, size limit, middleware and error handling as
    /// the server loop, which makes it the entry point for tests.
    pub async fn call(&mut self, request: Request<Bytes>) -> Res {
        if self.router.is_none() {
            self.build_router();
        }
        let started = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let res = if request.body().len() > self.max_body_size {
            self.finish(Self::too_large())
        } else {
            self.dispatch(Req::new(request)).await
        };
        log_request(&method, &path, &res, started);
        res
    }

    /// Start the HTTP server.
    ///
    /// Implements graceful shutdown on SIGTERM/SIGINT signals.
    /// In-flight requests complete before the server terminates.
    pub async fn listen(mut self, addr: impl Into<SocketAddr>) -> Result<()> {
        let addr = addr.into();
        self.build_router();
        let app = Arc::new(self);
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "listening");

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                tracing::error!(error = %e, "failed to install signal handlers");
                return;
            }
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        });

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let io = TokioIo::new(stream);
                            let app = Arc::clone(&app);
                            let mut shutdown_rx = shutdown_rx.clone();

                            tokio::task::spawn(async move {
                                let conn = http1::Builder::new()
                                    .serve_connection(
                                        io,
                                        service_fn(move |req| {
                                            let app = Arc::clone(&app);
                                            async move { app.handle_request(req).await }
                                        }),
                                    );

                                let mut conn = std::pin::pin!(conn);

                                tokio::select! {
                                    result = conn.as_mut() => {
                                        if let Err(e) = result {
                                            tracing::debug!(%peer, error = %e, "connection closed with error");
                                        }
                                    }
                                    _ = shutdown_rx.changed() => {
                                        conn.as_mut().graceful_shutdown();
                                        let _ = conn.await;
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to accept connection");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> std::result::Result<Response<BoxBody>, Infallible> {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();

        let res = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => {
                let request = Request::from_parts(parts, collected.to_bytes());
                self.dispatch(Req::new(request)).await
            }
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                self.finish(Self::too_large())
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to read request body");
                self.finish(Error::bad_request("Failed to read request body").into_res())
            }
        };

        log_request(&method, &path, &res, started);
        Ok(res.into_hyper())
    }

    fn too_large() -> Res {
        Error::payload_too_large("The data value transmitted exceeds the capacity limit.").into_res()
    }

    async fn dispatch(&self, mut req: Req) -> Res {
        let Some(router) = &self.router else {
            return self.finish(Error::internal("Router not initialized").into_res());
        };

        let method_handlers = match router.at(req.path()) {
            Ok(matched) => {
                let params: HashMap<String, String> = matched
                    .params
                    .iter()
                    .map(|(k, v)| {
                        (k.to_string(), percent_decode_str(v).decode_utf8_lossy().into_owned())
                    })
                    .collect();
                let handlers = Arc::clone(matched.value);
                req.set_path_params(params);
                handlers
            }
            Err(_) => {
                return self.finish(
                    Error::not_found("The requested URL was not found on the server.").into_res(),
                );
            }
        };

        let found = method_handlers.get(req.method()).or_else(|| {
            (*req.method() == Method::HEAD)
                .then(|| method_handlers.get(&Method::GET))
                .flatten()
        });

        let Some((handler, middlewares)) = found else {
            let mut allowed: Vec<&str> = method_handlers.keys().map(Method::as_str).collect();
            allowed.sort_unstable();
            let allowed = allowed.join(", ");
            let mut res = self.finish(
                Error::method_not_allowed("The method is not allowed for the requested URL.")
                    .into_res(),
            );
            if let Ok(value) = header::HeaderValue::from_str(&allowed) {
                res.headers_mut().insert(header::ALLOW, value);
            }
            return res;
        };

        let handler = Arc::clone(handler);
        let endpoint: NextFn<S> = Arc::new(move |req, state| handler.call(req, state));
        let next = middleware::chain(middlewares, endpoint);
        let state = Arc::clone(&self.state);

        let method = req.method().clone();
        let path = req.path().to_string();
        let res = match AssertUnwindSafe(async move { next(req, state).await })
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                tracing::error!(%method, path = %path, panic = %message, "handler panicked");
                Error::status(500).into_res()
            }
        };
        self.finish(res)
    }

    /// Swap an error response for the custom error handler's rendering.
    ///
    /// Cookies set on the way out (e.g. by the session layer) are kept.
    fn finish(&self, mut res: Res) -> Res {
        let raised = res.extensions_mut().remove::<Raised>();
        let (Some(handler), Some(raised)) = (&self.error_handler, raised) else {
            return res;
        };
        let mut rendered = handler.handle(raised.into_error());
        for value in res.headers().get_all(header::SET_COOKIE) {
            rendered
                .headers_mut()
                .append(header::SET_COOKIE, value.clone());
        }
        rendered
    }
}

fn log_request(method: &Method, path: &str, res: &Res, started: Instant) {
    tracing::info!(
        %method,
        path,
        status = res.status_code().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
    }

    Ok(())
}
