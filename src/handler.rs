//! Request handlers.
//!
//! Any `async fn(Req) -> impl IntoRes` is a handler. Handlers may also take
//! up to three [extractors](crate::extractors) before the request:
//! `async fn(State<App>, Query<Search>, Req) -> impl IntoRes`.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::middleware::BoxFuture;
use crate::{FromRequest, IntoRes, Req, Res};

/// Type-erased request handler.
pub trait Handler<S = ()>: Send + Sync + 'static {
    /// Produce the response for `req`.
    fn call(&self, req: Req, state: Arc<S>) -> BoxFuture<Res>;
}

/// Conversion of functions into [`Handler`]s.
///
/// `T` only disambiguates the function signature.
pub trait IntoHandler<S, T> {
    /// Box the function as a handler.
    fn into_handler(self) -> Arc<dyn Handler<S>>;
}

/// Handler taking just the request.
pub struct FnHandler<F> {
    f: F,
}

impl<S, F, Fut, R> Handler<S> for FnHandler<F>
where
    S: Send + Sync + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoRes,
{
    fn call(&self, req: Req, _state: Arc<S>) -> BoxFuture<Res> {
        let fut = (self.f)(req);
        Box::pin(async move { fut.await.into_res() })
    }
}

impl<S, F, Fut, R> IntoHandler<S, (Req,)> for F
where
    S: Send + Sync + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoRes,
{
    fn into_handler(self) -> Arc<dyn Handler<S>> {
        Arc::new(FnHandler { f: self })
    }
}

macro_rules! extractor_handler {
    ($n:literal; $($ty:ident),+) => {
        paste::paste! {
            #[doc = "Handler taking " $n " extractor(s) before the request."]
            pub struct [<FnHandler $n>]<F, $($ty),+> {
                f: Arc<F>,
                _marker: PhantomData<fn() -> ($($ty,)+)>,
            }

            impl<S, F, Fut, R, $($ty),+> Handler<S> for [<FnHandler $n>]<F, $($ty),+>
            where
                S: Send + Sync + 'static,
                F: Fn($($ty,)+ Req) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = R> + Send + 'static,
                R: IntoRes,
                $($ty: FromRequest<S> + Send + 'static,)+
            {
                fn call(&self, req: Req, state: Arc<S>) -> BoxFuture<Res> {
                    let f = Arc::clone(&self.f);
                    Box::pin(async move {
                        $(
                            let [<$ty:lower>] = match <$ty as FromRequest<S>>::from_request(&req, &state).await {
                                Ok(value) => value,
                                Err(err) => return err.into_res(),
                            };
                        )+
                        f($([<$ty:lower>],)+ req).await.into_res()
                    })
                }
            }

            impl<S, F, Fut, R, $($ty),+> IntoHandler<S, ($($ty,)+ Req)> for F
            where
                S: Send + Sync + 'static,
                F: Fn($($ty,)+ Req) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = R> + Send + 'static,
                R: IntoRes,
                $($ty: FromRequest<S> + Send + 'static,)+
            {
                fn into_handler(self) -> Arc<dyn Handler<S>> {
                    Arc::new([<FnHandler $n>] {
                        f: Arc::new(self),
                        _marker: PhantomData,
                    })
                }
            }
        }
    };
}

extractor_handler!(1; E1);
extractor_handler!(2; E1, E2);
extractor_handler!(3; E1, E2, E3);
