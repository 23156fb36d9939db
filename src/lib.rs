//! Small web framework for Rust.
//!
//! Routing, middleware, signed sessions with flash messages and CSRF
//! tokens, form validation, multipart uploads, templates and safe
//! redirects on top of hyper.
//!
//! ```rust,no_run
//! use lantern::{App, Req, Res, SessionLayer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = App::new();
//!     app.layer(SessionLayer::new("secret string"));
//!     app.get("/", |_: Req| async { Res::html("<h1>Hello, World!</h1>") });
//!     app.listen(([127, 0, 0, 1], 5000)).await.unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod api;
pub mod config;
mod cookie;
mod error;
pub mod error_handler;
pub mod extensions;
pub mod extractors;
pub mod form;
mod handler;
mod into_res;
pub mod logging;
mod middleware;
pub mod redirect;
mod req;
mod res;
pub mod route;
mod router;
pub mod session;
pub mod template;
pub mod upload;

pub use api::{App, DEFAULT_MAX_BODY_SIZE};
pub use config::Config;
pub use cookie::{Cookie, parse_cookie_header};
pub use error::{Error, Result};
pub use error_handler::{DefaultErrorHandler, ErrorHandler, FnErrorHandler, JsonErrorHandler};
pub use extensions::Extensions;
pub use extractors::{Form, FromRequest, Json, Path, Query, State};
pub use form::{FormState, Submission, Validate, Validator, validate_form, validate_on_submit};
pub use handler::{FnHandler, FnHandler1, FnHandler2, FnHandler3, Handler, IntoHandler};
pub use into_res::{Html, IntoRes, escape};
pub use middleware::{FnMiddleware, Middleware, Next, from_fn};
pub use redirect::{SafeRedirect, redirect_back};
pub use req::Req;
pub use res::{BoxBody, Res, ResBuilder};
pub use route::Route;
pub use router::Router;
pub use session::{Session, SessionLayer};
pub use template::Templates;
pub use upload::{MultipartForm, UploadedFile};

pub use hyper::{Method, StatusCode};

/// Common types and traits.
pub mod prelude {
    pub use crate::extractors::{Form, FromRequest, Json, Path, Query, State};
    pub use crate::form::{FormState, Submission, Validate, Validator, validate_form, validate_on_submit};
    pub use crate::{
        App, Cookie, Error, ErrorHandler, Extensions, Html, IntoRes, Middleware, MultipartForm,
        Next, Req, Res, Result, Route, Router, SafeRedirect, Session, SessionLayer, Templates,
        UploadedFile, escape, from_fn, redirect_back,
    };
}
