//! Trait-based middleware.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::{Req, Res};

/// Middleware trait for request interception.
#[async_trait]
pub trait Middleware<S = ()>: Send + Sync + 'static {
    /// Handle request before passing to next middleware/handler.
    async fn handle(&self, req: Req, state: Arc<S>, next: Next<S>) -> Res;
}

pub(crate) type BoxFuture<T> = std::pin::Pin<Box<dyn Future<Output = T> + Send>>;
pub(crate) type NextFn<S> = Arc<dyn Fn(Req, Arc<S>) -> BoxFuture<Res> + Send + Sync>;

/// Next middleware/handler in chain.
pub struct Next<S = ()> {
    handler: NextFn<S>,
    state: Arc<S>,
}

impl<S: 'static> Next<S> {
    #[inline]
    pub(crate) fn new(handler: NextFn<S>, state: Arc<S>) -> Self {
        Self { handler, state }
    }

    /// Run next handler.
    #[inline]
    pub async fn run(self, req: Req) -> Res {
        (self.handler)(req, self.state).await
    }
}

/// Function-based middleware wrapper.
pub struct FnMiddleware<F>(pub F);

#[async_trait]
impl<F, Fut, S> Middleware<S> for FnMiddleware<F>
where
    F: Fn(Req, Arc<S>, Next<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    S: Send + Sync + 'static,
{
    async fn handle(&self, req: Req, state: Arc<S>, next: Next<S>) -> Res {
        (self.0)(req, state, next).await
    }
}

/// Create middleware from function.
///
/// ```rust
/// use lantern::{Error, IntoRes, Next, Req, Res, from_fn};
/// use std::sync::Arc;
///
/// let members_only = from_fn(|req: Req, _state: Arc<()>, next: Next<()>| async move {
///     if req.cookie("member").is_some() {
///         next.run(req).await
///     } else {
///         Error::forbidden("Members only").into_res()
///     }
/// });
/// ```
pub fn from_fn<F, Fut, S>(f: F) -> FnMiddleware<F>
where
    F: Fn(Req, Arc<S>, Next<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    S: Send + Sync + 'static,
{
    FnMiddleware(f)
}

/// Build the middleware chain ending in `endpoint`.
///
/// Middleware runs in slice order; the first entry sees the request first.
pub(crate) fn chain<S: Send + Sync + 'static>(
    middlewares: &[Arc<dyn Middleware<S>>],
    endpoint: NextFn<S>,
) -> NextFn<S> {
    let mut next_fn = endpoint;
    for middleware in middlewares.iter().rev() {
        let middleware = Arc::clone(middleware);
        let inner = Arc::clone(&next_fn);
        next_fn = Arc::new(move |req, state: Arc<S>| {
            let mw = Arc::clone(&middleware);
            let inner = Arc::clone(&inner);
            Box::pin(async move {
                let next = Next::new(inner, Arc::clone(&state));
                mw.handle(req, state, next).await
            })
        });
    }
    next_fn
}
